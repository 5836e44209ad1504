use axum::{Router, routing::get};

pub mod documents;
pub mod finance;
pub mod households;
pub mod incidents;
pub mod inventory;
pub mod officials;
pub mod portal;
pub mod residents;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/residents", residents::router())
        .nest("/households", households::router())
        .nest("/officials", officials::router())
        .nest("/documents", documents::router())
        .nest("/incidents", incidents::router())
        .nest("/inventory", inventory::router())
        .nest("/finance", finance::router())
        .nest("/portal", portal::router())
}
