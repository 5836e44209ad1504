use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use bims_core::IncidentId;
use bims_infra::{IncidentRepo, ResidentRepo};
use bims_incidents::{Complainant, Incident, IncidentStatus, IncidentUpdate, NewIncident};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_incidents).post(create_incident))
        .route("/:id", get(get_incident).put(update_incident))
        .route("/:id/status", post(set_status))
}

pub async fn create_incident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateIncidentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("incidents.write") {
        return errors::forbidden(e);
    }

    if let Complainant::Resident(resident_id) = body.complainant {
        match services.store.get_resident(resident_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "complainant resident does not exist",
                );
            }
            Err(e) => return errors::repo_error_to_response(e),
        }
    }

    let incident = match Incident::create(
        IncidentId::new(),
        NewIncident {
            blotter_number: body.blotter_number,
            complainant: body.complainant,
            respondent: body.respondent,
            narrative: body.narrative,
            incident_date: body.incident_date,
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

pub async fn get_incident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("incidents.read") {
        return errors::forbidden(e);
    }
    let id: IncidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_incident(id).await {
        Ok(Some(incident)) => Json(incident).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn update_incident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateIncidentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("incidents.write") {
        return errors::forbidden(e);
    }
    let id: IncidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut incident = match services.store.get_incident(id).await {
        Ok(Some(i)) => i,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    let update = IncidentUpdate {
        respondent: body.respondent,
        narrative: body.narrative,
    };
    if let Err(e) = incident.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_incident(&incident).await {
        return errors::repo_error_to_response(e);
    }

    Json(incident).into_response()
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetIncidentStatusRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("incidents.write") {
        return errors::forbidden(e);
    }
    let id: IncidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut incident = match services.store.get_incident(id).await {
        Ok(Some(i)) => i,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    if let Err(e) = incident.transition(body.status, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_incident(&incident).await {
        return errors::repo_error_to_response(e);
    }

    Json(incident).into_response()
}

pub async fn list_incidents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::IncidentListParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("incidents.read") {
        return errors::forbidden(e);
    }

    let status = match params.status.as_deref() {
        Some(raw) => match raw.parse::<IncidentStatus>() {
            Ok(s) => Some(s),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    match services
        .store
        .list_incidents(params.to_page(), status)
        .await
    {
        Ok(incidents) => Json(incidents).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
