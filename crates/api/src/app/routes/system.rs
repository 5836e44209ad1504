use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::AuthContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": ctx.user_id().to_string(),
        "roles": ctx.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "resident_id": ctx.resident_id().map(|r| r.to_string()),
    }))
}
