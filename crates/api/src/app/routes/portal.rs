//! Resident self-service endpoints.
//!
//! Callers reach these with the `resident` role; every handler resolves the
//! caller's own resident record from the token and never accepts a resident
//! id from the request body.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use bims_core::{DocumentRequestId, IncidentId, ResidentId};
use bims_infra::{DocumentRequestRepo, IncidentRepo, ResidentRepo};
use bims_documents::{DocumentRequest, NewDocumentRequest};
use bims_incidents::{Complainant, Incident, NewIncident};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/requests", get(list_own_requests).post(submit_request))
        .route("/complaints", post(file_complaint))
}

fn own_resident_id(ctx: &AuthContext) -> Result<ResidentId, axum::response::Response> {
    // Tokens without a resident link are not authorized for portal data.
    ctx.resident_id()
        .ok_or_else(|| errors::domain_error_to_response(bims_core::DomainError::Unauthorized))
}

pub async fn submit_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::PortalDocumentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("portal.requests.create") {
        return errors::forbidden(e);
    }
    let resident_id = match own_resident_id(&ctx) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_resident(resident_id).await {
        Ok(Some(resident)) if resident.active => {}
        Ok(_) => {
            return errors::json_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                "resident record is not active",
            );
        }
        Err(e) => return errors::repo_error_to_response(e),
    }

    let request = match DocumentRequest::create(
        DocumentRequestId::new(),
        NewDocumentRequest {
            resident_id,
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

pub async fn list_own_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("portal.requests.read") {
        return errors::forbidden(e);
    }
    let resident_id = match own_resident_id(&ctx) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .store
        .list_requests(params.to_page(), None, Some(resident_id))
        .await
    {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

/// File a complaint: a `Filed` incident with the caller as complainant.
/// The blotter number is system-assigned for portal filings.
pub async fn file_complaint(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::PortalComplaintRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("portal.complaints.create") {
        return errors::forbidden(e);
    }
    let resident_id = match own_resident_id(&ctx) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let id = IncidentId::new();
    let incident = match Incident::create(
        id,
        NewIncident {
            blotter_number: format!("BLT-{}", id.as_uuid().simple()),
            complainant: Complainant::Resident(resident_id),
            respondent: body.respondent,
            narrative: body.narrative,
            incident_date: body.incident_date.unwrap_or_else(Utc::now),
        },
        ctx.user_id(),
        Utc::now(),
    ) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_incident(&incident).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(incident)).into_response()
}
