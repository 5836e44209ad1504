use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use bims_core::TransactionId;
use bims_infra::FinanceRepo;
use bims_finance::{NewTransaction, Transaction, TransactionKind};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/summary", get(summary))
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateTransactionRequest>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("finance.write") {
        return errors::forbidden(e);
    }

    let transaction = match Transaction::create(
        TransactionId::new(),
        NewTransaction {
            kind: body.kind,
            category: body.category,
            amount: body.amount,
            description: body.description,
            transaction_date: body.transaction_date,
        },
        ctx.user_id(),
        Utc::now(),
    ) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.store.insert_transaction(&transaction).await {
        return errors::repo_error_to_response(e);
    }

    (StatusCode::CREATED, Json(transaction)).into_response()
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("finance.read") {
        return errors::forbidden(e);
    }
    let id: TransactionId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_transaction(id).await {
        Ok(Some(transaction)) => Json(transaction).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::TransactionListParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("finance.read") {
        return errors::forbidden(e);
    }

    let kind = match params.kind.as_deref() {
        Some(raw) => match raw.parse::<TransactionKind>() {
            Ok(k) => Some(k),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    match services
        .store
        .list_transactions(params.to_page(), kind)
        .await
    {
        Ok(transactions) => Json(transactions).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<dto::SummaryParams>,
) -> axum::response::Response {
    if let Err(e) = ctx.require("finance.read") {
        return errors::forbidden(e);
    }

    match services.store.summarize(params.from, params.to).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
