#[tokio::main]
async fn main() {
    bims_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let bind_addr =
        std::env::var("BIMS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let services = std::sync::Arc::new(bims_api::app::services::build_services().await);
    let app = bims_api::app::build_app_with(jwt_secret, services.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .unwrap();

    services.shutdown().await;
}
