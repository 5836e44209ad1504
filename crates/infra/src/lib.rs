//! `bims-infra` — persistence and rendering infrastructure.
//!
//! Repositories come in pairs behind the same traits: a Postgres
//! implementation (sqlx, one process-wide pool) and an in-memory one used by
//! tests and the dev backend. The stock-ledger applier lives here because its
//! atomicity guarantee is a storage concern.

pub mod error;
pub mod issuance;
pub mod memory;
pub mod postgres;
pub mod render;
pub mod store;

pub use error::{RepoError, RepoResult};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use render::{DocumentRenderer, RenderContext, RenderError, TextCertificateRenderer};
pub use store::{
    DocumentRequestRepo, FinanceRepo, HouseholdRepo, IncidentRepo, InventoryRepo, OfficialRepo,
    ResidentRepo, Store,
};
