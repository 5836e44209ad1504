use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use bims_core::DocumentRequestId;
use bims_infra::{DocumentRequestRepo, ResidentRepo};
use bims_documents::{DocumentRequest, DocumentRequestStatus, NewDocumentRequest};
use bims_infra::issuance;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/reject", post(reject_request))
        .route("/requests/:id/release", post(release_request))
        .route("/requests/:id/file", get(get_request_file))
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateDocumentRequestRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.write") {
        return errors::forbidden(e);
    }

    match services.store.get_resident(body.resident_id).await {
        Ok(Some(resident)) if resident.active => {}
        Ok(Some(_)) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "resident is deactivated",
            );
        }
        Ok(None) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "resident does not exist",
            );
        }
        Err(e) => return errors::repo_error_to_response(e),
    }

    let request = match DocumentRequest::create(
        DocumentRequestId::new(),
        NewDocumentRequest {
            resident_id: body.resident_id,
            kind: body.kind,
            purpose: body.purpose,
        },
        Utc::now(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_request(&request).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(request)).into_response()
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.read") {
        return errors::forbidden(e);
    }
    let id: DocumentRequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_request(id).await {
        Ok(Some(request)) => Json(request).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn approve_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.write") {
        return errors::forbidden(e);
    }
    let id: DocumentRequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match issuance::approve_request(
        services.store.as_ref(),
        services.renderer.as_ref(),
        id,
        ctx.user_id(),
        Utc::now(),
    )
    .await
    {
        Ok(request) => Json(request).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn reject_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectDocumentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.write") {
        return errors::forbidden(e);
    }
    let id: DocumentRequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match issuance::reject_request(services.store.as_ref(), id, body.reason, ctx.user_id(), Utc::now())
        .await
    {
        Ok(request) => Json(request).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn release_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.write") {
        return errors::forbidden(e);
    }
    let id: DocumentRequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match issuance::release_request(services.store.as_ref(), id, ctx.user_id(), Utc::now()).await {
        Ok(request) => Json(request).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

/// Serve the rendered certificate bytes; 404 until the request is approved.
pub async fn get_request_file(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.read") {
        return errors::forbidden(e);
    }
    let id: DocumentRequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let request = match services.store.get_request(id).await {
        Ok(Some(r)) => r,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    match request.issued {
        Some(issued) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, issued.content_type)],
            issued.content,
        )
            .into_response(),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no document has been generated for this request",
        ),
    }
}

pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::DocumentListParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("documents.read") {
        return errors::forbidden(e);
    }

    let status = match params.status.as_deref() {
        Some(raw) => match raw.parse::<DocumentRequestStatus>() {
            Ok(s) => Some(s),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    match services
        .store
        .list_requests(params.to_page(), status, params.resident_id)
        .await
    {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
