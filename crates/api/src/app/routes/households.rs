use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use bims_core::HouseholdId;
use bims_infra::{HouseholdRepo, ResidentRepo};
use bims_registry::{Household, HouseholdUpdate, NewHousehold};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_households).post(create_household))
        .route("/:id", get(get_household).put(update_household))
        .route("/:id/members", get(list_members))
}

pub async fn create_household(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateHouseholdRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("households.write") {
        return errors::forbidden(e);
    }

    let household = match Household::create(
        HouseholdId::new(),
        NewHousehold {
            number: body.number,
            purok: body.purok,
            address: body.address,
            head: body.head,
        },
        Utc::now(),
    ) {
        Ok(h) => h,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_household(&household).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(household)).into_response()
}

pub async fn get_household(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("households.read") {
        return errors::forbidden(e);
    }
    let id: HouseholdId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_household(id).await {
        Ok(Some(household)) => Json(household).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn update_household(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateHouseholdRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("households.write") {
        return errors::forbidden(e);
    }
    let id: HouseholdId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut household = match services.store.get_household(id).await {
        Ok(Some(h)) => h,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    let update = HouseholdUpdate {
        purok: body.purok,
        address: body.address,
        head: body.head.map(Some),
    };
    if let Err(e) = household.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_household(&household).await {
        return errors::repo_error_to_response(e);
    }

    Json(household).into_response()
}

pub async fn list_households(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("households.read") {
        return errors::forbidden(e);
    }

    match services.store.list_households(params.to_page()).await {
        Ok(households) => Json(households).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("households.read") {
        return errors::forbidden(e);
    }
    let id: HouseholdId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_household(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    }

    match services.store.list_household_members(id).await {
        Ok(members) => Json(members).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
