use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use bims_core::ItemId;
use bims_infra::InventoryRepo;
use bims_inventory::{InventoryItem, ItemUpdate, Movement, NewItem};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/items/:id/movements",
            get(list_movements).post(record_movement),
        )
        .route("/low-stock", get(list_low_stock))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.items.write") {
        return errors::forbidden(e);
    }

    let item = match InventoryItem::create(
        ItemId::new(),
        NewItem {
            name: body.name,
            category: body.category,
            unit: body.unit,
            initial_quantity: body.initial_quantity,
            min_stock: body.min_stock,
            location: body.location,
            qr_code: body.qr_code,
        },
        Utc::now(),
    ) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_item(&item).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(item)).into_response()
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.read") {
        return errors::forbidden(e);
    }
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_item(id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.items.write") {
        return errors::forbidden(e);
    }
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut item = match services.store.get_item(id).await {
        Ok(Some(i)) => i,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => return errors::repo_error_to_response(e),
    };

    let update = ItemUpdate {
        name: body.name,
        category: body.category,
        unit: body.unit,
        min_stock: body.min_stock,
        location: body.location.map(Some),
        qr_code: body.qr_code.map(Some),
    };
    if let Err(e) = item.apply_update(update, Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.store.update_item(&item).await {
        return errors::repo_error_to_response(e);
    }

    Json(item).into_response()
}

/// Soft delete: the item disappears from reads but its ledger history stays.
pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.items.write") {
        return errors::forbidden(e);
    }
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.soft_delete_item(id, Utc::now()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.items.adjust") {
        return errors::forbidden(e);
    }
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let movement = Movement {
        kind: body.kind,
        quantity: body.quantity,
        note: body.note,
        released_to: body.released_to,
        recorded_by: ctx.user_id(),
    };

    match services.store.record_movement(id, movement, Utc::now()).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.read") {
        return errors::forbidden(e);
    }
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.list_movements(id, params.to_page()).await {
        Ok(movements) => Json(movements).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.read") {
        return errors::forbidden(e);
    }

    match services.store.list_items(params.to_page()).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn list_low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("inventory.read") {
        return errors::forbidden(e);
    }

    match services.store.list_low_stock().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
