//! Repository traits.
//!
//! Every trait has a Postgres and an in-memory implementation; handlers only
//! ever see `Arc<dyn Store>`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use bims_core::{
    DocumentRequestId, HouseholdId, IncidentId, ItemId, OfficialId, Page, ResidentId,
    TransactionId,
};
use bims_documents::{DocumentRequest, DocumentRequestStatus};
use bims_finance::{FinanceSummary, Transaction, TransactionKind};
use bims_incidents::{Incident, IncidentStatus};
use bims_inventory::{InventoryItem, Movement, StockMovement};
use bims_registry::{Household, Official, Resident};

use crate::error::RepoResult;

#[async_trait]
pub trait ResidentRepo: Send + Sync {
    async fn insert_resident(&self, resident: &Resident) -> RepoResult<()>;
    async fn get_resident(&self, id: ResidentId) -> RepoResult<Option<Resident>>;
    async fn update_resident(&self, resident: &Resident) -> RepoResult<()>;
    /// Newest first; `search` matches first/last name, case-insensitive.
    async fn list_residents(&self, page: Page, search: Option<&str>) -> RepoResult<Vec<Resident>>;
    async fn list_household_members(&self, household_id: HouseholdId) -> RepoResult<Vec<Resident>>;
}

#[async_trait]
pub trait HouseholdRepo: Send + Sync {
    /// Fails with `Conflict` if the household number is already taken.
    async fn insert_household(&self, household: &Household) -> RepoResult<()>;
    async fn get_household(&self, id: HouseholdId) -> RepoResult<Option<Household>>;
    async fn update_household(&self, household: &Household) -> RepoResult<()>;
    async fn list_households(&self, page: Page) -> RepoResult<Vec<Household>>;
}

#[async_trait]
pub trait OfficialRepo: Send + Sync {
    async fn insert_official(&self, official: &Official) -> RepoResult<()>;
    async fn get_official(&self, id: OfficialId) -> RepoResult<Option<Official>>;
    async fn update_official(&self, official: &Official) -> RepoResult<()>;
    async fn list_officials(&self, page: Page, active_only: bool) -> RepoResult<Vec<Official>>;
}

#[async_trait]
pub trait DocumentRequestRepo: Send + Sync {
    async fn insert_request(&self, request: &DocumentRequest) -> RepoResult<()>;
    async fn get_request(&self, id: DocumentRequestId) -> RepoResult<Option<DocumentRequest>>;
    async fn update_request(&self, request: &DocumentRequest) -> RepoResult<()>;
    async fn list_requests(
        &self,
        page: Page,
        status: Option<DocumentRequestStatus>,
        resident: Option<ResidentId>,
    ) -> RepoResult<Vec<DocumentRequest>>;
    /// Allocate the next per-year control-number sequence (starts at 1).
    async fn next_control_seq(&self, year: i32) -> RepoResult<u64>;
}

#[async_trait]
pub trait IncidentRepo: Send + Sync {
    /// Fails with `Conflict` if the blotter number is already taken.
    async fn insert_incident(&self, incident: &Incident) -> RepoResult<()>;
    async fn get_incident(&self, id: IncidentId) -> RepoResult<Option<Incident>>;
    async fn update_incident(&self, incident: &Incident) -> RepoResult<()>;
    async fn list_incidents(
        &self,
        page: Page,
        status: Option<IncidentStatus>,
    ) -> RepoResult<Vec<Incident>>;
}

#[async_trait]
pub trait FinanceRepo: Send + Sync {
    async fn insert_transaction(&self, transaction: &Transaction) -> RepoResult<()>;
    async fn get_transaction(&self, id: TransactionId) -> RepoResult<Option<Transaction>>;
    async fn list_transactions(
        &self,
        page: Page,
        kind: Option<TransactionKind>,
    ) -> RepoResult<Vec<Transaction>>;
    async fn summarize(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<FinanceSummary>;
}

#[async_trait]
pub trait InventoryRepo: Send + Sync {
    async fn insert_item(&self, item: &InventoryItem) -> RepoResult<()>;
    /// Soft-deleted items read as absent.
    async fn get_item(&self, id: ItemId) -> RepoResult<Option<InventoryItem>>;
    async fn update_item(&self, item: &InventoryItem) -> RepoResult<()>;
    async fn list_items(&self, page: Page) -> RepoResult<Vec<InventoryItem>>;
    async fn soft_delete_item(&self, id: ItemId, now: DateTime<Utc>) -> RepoResult<()>;
    async fn list_low_stock(&self) -> RepoResult<Vec<InventoryItem>>;

    /// Apply a stock movement: validate (including `Release` recipient
    /// liveness), compute the new quantity, and commit the ledger row plus
    /// the item update atomically. A rejected movement writes nothing.
    async fn record_movement(
        &self,
        item_id: ItemId,
        movement: Movement,
        now: DateTime<Utc>,
    ) -> RepoResult<StockMovement>;

    /// Ledger rows for an item in append order.
    async fn list_movements(&self, item_id: ItemId, page: Page) -> RepoResult<Vec<StockMovement>>;
}

/// The injected data-access handle: one object, all repositories.
pub trait Store:
    ResidentRepo
    + HouseholdRepo
    + OfficialRepo
    + DocumentRequestRepo
    + IncidentRepo
    + FinanceRepo
    + InventoryRepo
{
}

impl<T> Store for T where
    T: ResidentRepo
        + HouseholdRepo
        + OfficialRepo
        + DocumentRequestRepo
        + IncidentRepo
        + FinanceRepo
        + InventoryRepo
{
}
