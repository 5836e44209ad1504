//! Backend selection and shared service handles.

use std::sync::Arc;

use bims_infra::memory::InMemoryStore;
use bims_infra::postgres::PostgresStore;
use bims_infra::render::{DocumentRenderer, TextCertificateRenderer};
use bims_infra::store::Store;

/// Shared service handles injected into every handler.
///
/// One store for the whole process: either a `PostgresStore` over a single
/// `PgPool`, or the in-memory backend when `DATABASE_URL` is unset
/// (dev/test runs use the same router either way).
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Concrete pool handle, kept so shutdown can close it. `None` on the
    /// in-memory backend.
    postgres: Option<PostgresStore>,
}

impl AppServices {
    pub fn in_memory(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            renderer,
            postgres: None,
        }
    }

    pub fn postgres(store: PostgresStore, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            store: Arc::new(store.clone()),
            renderer,
            postgres: Some(store),
        }
    }

    /// Release storage resources; in-flight queries finish first.
    pub async fn shutdown(&self) {
        if let Some(pg) = &self.postgres {
            pg.close().await;
            tracing::info!("postgres pool closed");
        }
    }
}

pub async fn build_services() -> AppServices {
    let barangay_name =
        std::env::var("BIMS_BARANGAY_NAME").unwrap_or_else(|_| "Barangay Hall".to_string());
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(TextCertificateRenderer::new(barangay_name));

    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PostgresStore::connect(&url)
                .await
                .unwrap_or_else(|e| panic!("failed to connect to postgres: {e}"));
            tracing::info!("using postgres backend");
            AppServices::postgres(store, renderer)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory backend");
            AppServices::in_memory(renderer)
        }
    }
}
