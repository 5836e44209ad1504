use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use bims_core::ResidentId;
use bims_infra::{HouseholdRepo, ResidentRepo};
use bims_registry::{NewResident, Resident, ResidentUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_residents).post(create_resident))
        .route(
            "/:id",
            get(get_resident).put(update_resident).delete(deactivate_resident),
        )
}

pub async fn create_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateResidentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("residents.write") {
        return errors::forbidden(e);
    }

    let resident = match Resident::create(
        ResidentId::new(),
        NewResident {
            first_name: body.first_name,
            middle_name: body.middle_name,
            last_name: body.last_name,
            sex: body.sex,
            birth_date: body.birth_date,
            civil_status: body.civil_status,
            address: body.address,
            contact: body.contact,
            is_voter: body.is_voter,
            household_id: body.household_id,
        },
        Utc::now(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Some(household_id) = resident.household_id {
        match services.store.get_household(household_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "household does not exist",
                );
            }
            Err(e) => return errors::repo_error_to_response(e),
        }
    }

    if let Err(e) = services.store.insert_resident(&resident).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(resident)).into_response()
}

pub async fn get_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("residents.read") {
        return errors::forbidden(e);
    }
    let id: ResidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_resident(id).await {
        Ok(Some(resident)) => Json(resident).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn update_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateResidentRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("residents.write") {
        return errors::forbidden(e);
    }
    let id: ResidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut resident = match services.store.get_resident(id).await {
        Ok(Some(r)) => r,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    let update = ResidentUpdate {
        first_name: body.first_name,
        middle_name: body.middle_name.map(Some),
        last_name: body.last_name,
        civil_status: body.civil_status,
        address: body.address,
        contact: body.contact,
        is_voter: body.is_voter,
        household_id: body.household_id.map(Some),
    };

    if let Err(e) = resident.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_resident(&resident).await {
        return errors::repo_error_to_response(e);
    }

    Json(resident).into_response()
}

/// Soft delete: the record stays for blotter/document history, it just stops
/// accepting updates and new issuances.
pub async fn deactivate_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("residents.write") {
        return errors::forbidden(e);
    }
    let id: ResidentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut resident = match services.store.get_resident(id).await {
        Ok(Some(r)) => r,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    resident.deactivate(Utc::now());
    if let Err(e) = services.store.update_resident(&resident).await {
        return errors::repo_error_to_response(e);
    }

    Json(resident).into_response()
}

pub async fn list_residents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::ResidentListParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("residents.read") {
        return errors::forbidden(e);
    }

    match services
        .store
        .list_residents(params.to_page(), params.search.as_deref())
        .await
    {
        Ok(residents) => Json(residents).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
