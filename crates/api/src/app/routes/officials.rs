use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use bims_core::OfficialId;
use bims_infra::OfficialRepo;
use bims_registry::{NewOfficial, Official, OfficialUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_officials).post(create_official))
        .route(
            "/:id",
            get(get_official).put(update_official).delete(deactivate_official),
        )
}

pub async fn create_official(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateOfficialRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("officials.write") {
        return errors::forbidden(e);
    }

    let official = match Official::create(
        OfficialId::new(),
        NewOfficial {
            name: body.name,
            position: body.position,
            term_start: body.term_start,
            term_end: body.term_end,
        },
        Utc::now(),
    ) {
        Ok(o) => o,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_official(&official).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(official)).into_response()
}

pub async fn get_official(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("officials.read") {
        return errors::forbidden(e);
    }
    let id: OfficialId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_official(id).await {
        Ok(Some(official)) => Json(official).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn update_official(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOfficialRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("officials.write") {
        return errors::forbidden(e);
    }
    let id: OfficialId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut official = match services.store.get_official(id).await {
        Ok(Some(o)) => o,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    let update = OfficialUpdate {
        name: body.name,
        position: body.position,
        term_end: body.term_end.map(Some),
    };
    if let Err(e) = official.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_official(&official).await {
        return errors::repo_error_to_response(e);
    }

    Json(official).into_response()
}

/// Soft delete: past `Release` ledger rows keep pointing at the record; the
/// official just stops being a valid recipient.
pub async fn deactivate_official(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("officials.write") {
        return errors::forbidden(e);
    }
    let id: OfficialId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut official = match services.store.get_official(id).await {
        Ok(Some(o)) => o,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    official.deactivate(Utc::now());
    if let Err(e) = services.store.update_official(&official).await {
        return errors::repo_error_to_response(e);
    }

    Json(official).into_response()
}

pub async fn list_officials(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::OfficialListParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("officials.read") {
        return errors::forbidden(e);
    }

    match services
        .store
        .list_officials(params.to_page(), params.active_only)
        .await
    {
        Ok(officials) => Json(officials).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
