//! Request DTOs and query-parameter mapping.
//!
//! Responses serialize the domain types directly; only the write side needs
//! a separate shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use bims_core::{HouseholdId, OfficialId, Page, ResidentId};
use bims_documents::DocumentKind;
use bims_incidents::{Complainant, IncidentStatus};
use bims_inventory::MovementKind;
use bims_finance::TransactionKind;
use bims_registry::{CivilStatus, ContactInfo, Position, Sex};

// -------------------------
// Common query parameters
// -------------------------

// `serde(flatten)` does not survive axum's query deserializer (every value
// arrives as a string), so each params struct carries page/per_page inline.

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

// -------------------------
// Registry
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateResidentRequest {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub civil_status: CivilStatus,
    pub address: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub is_voter: bool,
    pub household_id: Option<HouseholdId>,
}

/// Partial update; absent fields are left untouched. Clearing an optional
/// field is not expressible over the wire (matches how the UI edits records).
#[derive(Debug, Deserialize)]
pub struct UpdateResidentRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub civil_status: Option<CivilStatus>,
    pub address: Option<String>,
    pub contact: Option<ContactInfo>,
    pub is_voter: Option<bool>,
    pub household_id: Option<HouseholdId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResidentListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl ResidentListParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    pub number: String,
    pub purok: String,
    pub address: String,
    pub head: Option<ResidentId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHouseholdRequest {
    pub purok: Option<String>,
    pub address: Option<String>,
    pub head: Option<ResidentId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOfficialRequest {
    pub name: String,
    pub position: Position,
    pub term_start: NaiveDate,
    pub term_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOfficialRequest {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub term_end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfficialListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub active_only: bool,
}

impl OfficialListParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

// -------------------------
// Documents
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequestRequest {
    pub resident_id: ResidentId,
    pub kind: DocumentKind,
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectDocumentRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub resident_id: Option<ResidentId>,
}

impl DocumentListParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

// -------------------------
// Incidents
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateIncidentRequest {
    pub blotter_number: String,
    pub complainant: Complainant,
    pub respondent: String,
    pub narrative: String,
    pub incident_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIncidentRequest {
    pub respondent: Option<String>,
    pub narrative: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetIncidentStatusRequest {
    pub status: IncidentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

impl IncidentListParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

// -------------------------
// Inventory
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    pub location: Option<String>,
    pub qr_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<i64>,
    pub location: Option<String>,
    pub qr_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub kind: MovementKind,
    pub quantity: i64,
    pub note: Option<String>,
    pub released_to: Option<OfficialId>,
}

// -------------------------
// Finance
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,
    pub category: String,
    /// Amount in centavos.
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kind: Option<String>,
}

impl TransactionListParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// -------------------------
// Portal
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PortalDocumentRequest {
    pub kind: DocumentKind,
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct PortalComplaintRequest {
    pub respondent: String,
    pub narrative: String,
    pub incident_date: Option<DateTime<Utc>>,
}
