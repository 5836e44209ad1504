//! Postgres-backed store.
//!
//! One `PgPool` for the whole process, injected at startup. Column mapping is
//! done by hand with `try_get`; enums are stored as TEXT using the domain
//! `as_str`/`FromStr` codecs.
//!
//! The ledger applier (`record_movement`) is the one multi-statement
//! transaction in the system: the quantity read takes a row lock
//! (`FOR UPDATE`) so concurrent movements against the same item serialize
//! instead of racing read-modify-write.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use bims_core::{
    DocumentRequestId, DomainError, HouseholdId, IncidentId, ItemId, MovementId, OfficialId, Page,
    ResidentId, TransactionId, UserId,
};
use bims_documents::{DocumentRequest, DocumentRequestStatus, IssuedDocument};
use bims_finance::{FinanceSummary, Transaction, TransactionKind};
use bims_incidents::{Complainant, Incident, IncidentStatus};
use bims_inventory::{
    InventoryItem, Movement, MovementKind, StockMovement, apply_movement,
};
use bims_registry::{ContactInfo, Household, Official, Resident};

use crate::error::{RepoError, RepoResult};
use crate::store::{
    DocumentRequestRepo, FinanceRepo, HouseholdRepo, IncidentRepo, InventoryRepo, OfficialRepo,
    ResidentRepo,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS residents (
        id UUID PRIMARY KEY,
        first_name TEXT NOT NULL,
        middle_name TEXT,
        last_name TEXT NOT NULL,
        sex TEXT NOT NULL,
        birth_date DATE NOT NULL,
        civil_status TEXT NOT NULL,
        address TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        is_voter BOOLEAN NOT NULL DEFAULT FALSE,
        household_id UUID,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS households (
        id UUID PRIMARY KEY,
        number TEXT NOT NULL UNIQUE,
        purok TEXT NOT NULL,
        address TEXT NOT NULL,
        head UUID,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS officials (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        position TEXT NOT NULL,
        term_start DATE NOT NULL,
        term_end DATE,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_requests (
        id UUID PRIMARY KEY,
        resident_id UUID NOT NULL REFERENCES residents(id),
        kind TEXT NOT NULL,
        purpose TEXT NOT NULL,
        status TEXT NOT NULL,
        rejection_reason TEXT,
        control_number TEXT,
        content BYTEA,
        content_type TEXT,
        generated_at TIMESTAMPTZ,
        handled_by UUID,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS control_counters (
        year INT PRIMARY KEY,
        seq BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS incidents (
        id UUID PRIMARY KEY,
        blotter_number TEXT NOT NULL UNIQUE,
        complainant_resident UUID,
        complainant_name TEXT,
        respondent TEXT NOT NULL,
        narrative TEXT NOT NULL,
        incident_date TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL,
        recorded_by UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS finance_transactions (
        id UUID PRIMARY KEY,
        kind TEXT NOT NULL,
        category TEXT NOT NULL,
        amount BIGINT NOT NULL,
        description TEXT NOT NULL,
        transaction_date DATE NOT NULL,
        recorded_by UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        unit TEXT NOT NULL,
        quantity BIGINT NOT NULL,
        min_stock BIGINT NOT NULL,
        location TEXT,
        qr_code TEXT,
        deleted_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_movements (
        id UUID PRIMARY KEY,
        item_id UUID NOT NULL REFERENCES inventory_items(id),
        kind TEXT NOT NULL,
        quantity BIGINT NOT NULL,
        resulting_quantity BIGINT NOT NULL,
        note TEXT,
        released_to UUID REFERENCES officials(id),
        recorded_by UUID NOT NULL,
        recorded_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> RepoResult<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Close the pool (process shutdown).
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_col<T: FromStr>(row: &PgRow, col: &str) -> RepoResult<T>
where
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(col)?;
    raw.parse::<T>()
        .map_err(|e| RepoError::storage(format!("bad {col} column: {e}")))
}

fn resident_from_row(row: &PgRow) -> RepoResult<Resident> {
    Ok(Resident {
        id: ResidentId::from_uuid(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        middle_name: row.try_get("middle_name")?,
        last_name: row.try_get("last_name")?,
        sex: parse_col(row, "sex")?,
        birth_date: row.try_get("birth_date")?,
        civil_status: parse_col(row, "civil_status")?,
        address: row.try_get("address")?,
        contact: ContactInfo {
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
        },
        is_voter: row.try_get("is_voter")?,
        household_id: row
            .try_get::<Option<Uuid>, _>("household_id")?
            .map(HouseholdId::from_uuid),
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn household_from_row(row: &PgRow) -> RepoResult<Household> {
    Ok(Household {
        id: HouseholdId::from_uuid(row.try_get("id")?),
        number: row.try_get("number")?,
        purok: row.try_get("purok")?,
        address: row.try_get("address")?,
        head: row
            .try_get::<Option<Uuid>, _>("head")?
            .map(ResidentId::from_uuid),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn official_from_row(row: &PgRow) -> RepoResult<Official> {
    Ok(Official {
        id: OfficialId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        position: parse_col(row, "position")?,
        term_start: row.try_get("term_start")?,
        term_end: row.try_get("term_end")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn request_from_row(row: &PgRow) -> RepoResult<DocumentRequest> {
    let issued = match row.try_get::<Option<String>, _>("control_number")? {
        Some(control_number) => Some(IssuedDocument {
            control_number,
            content: row
                .try_get::<Option<Vec<u8>>, _>("content")?
                .unwrap_or_default(),
            content_type: row
                .try_get::<Option<String>, _>("content_type")?
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            generated_at: row
                .try_get::<Option<DateTime<Utc>>, _>("generated_at")?
                .unwrap_or_else(Utc::now),
        }),
        None => None,
    };

    Ok(DocumentRequest {
        id: DocumentRequestId::from_uuid(row.try_get("id")?),
        resident_id: ResidentId::from_uuid(row.try_get("resident_id")?),
        kind: parse_col(row, "kind")?,
        purpose: row.try_get("purpose")?,
        status: parse_col(row, "status")?,
        rejection_reason: row.try_get("rejection_reason")?,
        issued,
        handled_by: row
            .try_get::<Option<Uuid>, _>("handled_by")?
            .map(UserId::from_uuid),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn incident_from_row(row: &PgRow) -> RepoResult<Incident> {
    let complainant = match row.try_get::<Option<Uuid>, _>("complainant_resident")? {
        Some(id) => Complainant::Resident(ResidentId::from_uuid(id)),
        None => Complainant::Named(
            row.try_get::<Option<String>, _>("complainant_name")?
                .unwrap_or_default(),
        ),
    };

    Ok(Incident {
        id: IncidentId::from_uuid(row.try_get("id")?),
        blotter_number: row.try_get("blotter_number")?,
        complainant,
        respondent: row.try_get("respondent")?,
        narrative: row.try_get("narrative")?,
        incident_date: row.try_get("incident_date")?,
        status: parse_col(row, "status")?,
        recorded_by: UserId::from_uuid(row.try_get("recorded_by")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> RepoResult<Transaction> {
    Ok(Transaction {
        id: TransactionId::from_uuid(row.try_get("id")?),
        kind: parse_col(row, "kind")?,
        category: row.try_get("category")?,
        amount: row.try_get("amount")?,
        description: row.try_get("description")?,
        transaction_date: row.try_get("transaction_date")?,
        recorded_by: UserId::from_uuid(row.try_get("recorded_by")?),
        created_at: row.try_get("created_at")?,
    })
}

fn item_from_row(row: &PgRow) -> RepoResult<InventoryItem> {
    Ok(InventoryItem {
        id: ItemId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        unit: row.try_get("unit")?,
        quantity: row.try_get("quantity")?,
        min_stock: row.try_get("min_stock")?,
        location: row.try_get("location")?,
        qr_code: row.try_get("qr_code")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn movement_from_row(row: &PgRow) -> RepoResult<StockMovement> {
    Ok(StockMovement {
        id: MovementId::from_uuid(row.try_get("id")?),
        item_id: ItemId::from_uuid(row.try_get("item_id")?),
        kind: parse_col(row, "kind")?,
        quantity: row.try_get("quantity")?,
        resulting_quantity: row.try_get("resulting_quantity")?,
        note: row.try_get("note")?,
        released_to: row
            .try_get::<Option<Uuid>, _>("released_to")?
            .map(OfficialId::from_uuid),
        recorded_by: UserId::from_uuid(row.try_get("recorded_by")?),
        recorded_at: row.try_get("recorded_at")?,
    })
}

#[async_trait]
impl ResidentRepo for PostgresStore {
    async fn insert_resident(&self, resident: &Resident) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO residents (
                id, first_name, middle_name, last_name, sex, birth_date,
                civil_status, address, email, phone, is_voter, household_id,
                active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(resident.id.as_uuid())
        .bind(&resident.first_name)
        .bind(&resident.middle_name)
        .bind(&resident.last_name)
        .bind(resident.sex.as_str())
        .bind(resident.birth_date)
        .bind(resident.civil_status.as_str())
        .bind(&resident.address)
        .bind(&resident.contact.email)
        .bind(&resident.contact.phone)
        .bind(resident.is_voter)
        .bind(resident.household_id.map(|h| *h.as_uuid()))
        .bind(resident.active)
        .bind(resident.created_at)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_resident(&self, id: ResidentId) -> RepoResult<Option<Resident>> {
        let row = sqlx::query("SELECT * FROM residents WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(resident_from_row).transpose()
    }

    async fn update_resident(&self, resident: &Resident) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE residents SET
                first_name = $2, middle_name = $3, last_name = $4,
                civil_status = $5, address = $6, email = $7, phone = $8,
                is_voter = $9, household_id = $10, active = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(resident.id.as_uuid())
        .bind(&resident.first_name)
        .bind(&resident.middle_name)
        .bind(&resident.last_name)
        .bind(resident.civil_status.as_str())
        .bind(&resident.address)
        .bind(&resident.contact.email)
        .bind(&resident.contact.phone)
        .bind(resident.is_voter)
        .bind(resident.household_id.map(|h| *h.as_uuid()))
        .bind(resident.active)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_residents(&self, page: Page, search: Option<&str>) -> RepoResult<Vec<Resident>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM residents
            WHERE $1::text IS NULL
               OR first_name ILIKE '%' || $1 || '%'
               OR last_name ILIKE '%' || $1 || '%'
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(resident_from_row).collect()
    }

    async fn list_household_members(&self, household_id: HouseholdId) -> RepoResult<Vec<Resident>> {
        let rows = sqlx::query(
            "SELECT * FROM residents WHERE household_id = $1 ORDER BY last_name, first_name",
        )
        .bind(household_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(resident_from_row).collect()
    }
}

#[async_trait]
impl HouseholdRepo for PostgresStore {
    async fn insert_household(&self, household: &Household) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO households (id, number, purok, address, head, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(household.id.as_uuid())
        .bind(&household.number)
        .bind(&household.purok)
        .bind(&household.address)
        .bind(household.head.map(|r| *r.as_uuid()))
        .bind(household.created_at)
        .bind(household.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_household(&self, id: HouseholdId) -> RepoResult<Option<Household>> {
        let row = sqlx::query("SELECT * FROM households WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(household_from_row).transpose()
    }

    async fn update_household(&self, household: &Household) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE households SET purok = $2, address = $3, head = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(household.id.as_uuid())
        .bind(&household.purok)
        .bind(&household.address)
        .bind(household.head.map(|r| *r.as_uuid()))
        .bind(household.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_households(&self, page: Page) -> RepoResult<Vec<Household>> {
        let rows = sqlx::query("SELECT * FROM households ORDER BY number LIMIT $1 OFFSET $2")
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(household_from_row).collect()
    }
}

#[async_trait]
impl OfficialRepo for PostgresStore {
    async fn insert_official(&self, official: &Official) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO officials (id, name, position, term_start, term_end, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(official.id.as_uuid())
        .bind(&official.name)
        .bind(official.position.as_str())
        .bind(official.term_start)
        .bind(official.term_end)
        .bind(official.active)
        .bind(official.created_at)
        .bind(official.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_official(&self, id: OfficialId) -> RepoResult<Option<Official>> {
        let row = sqlx::query("SELECT * FROM officials WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(official_from_row).transpose()
    }

    async fn update_official(&self, official: &Official) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE officials SET
                name = $2, position = $3, term_end = $4, active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(official.id.as_uuid())
        .bind(&official.name)
        .bind(official.position.as_str())
        .bind(official.term_end)
        .bind(official.active)
        .bind(official.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_officials(&self, page: Page, active_only: bool) -> RepoResult<Vec<Official>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM officials
            WHERE NOT $1 OR active
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(active_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(official_from_row).collect()
    }
}

#[async_trait]
impl DocumentRequestRepo for PostgresStore {
    async fn insert_request(&self, request: &DocumentRequest) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO document_requests (
                id, resident_id, kind, purpose, status, rejection_reason,
                control_number, content, content_type, generated_at,
                handled_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.resident_id.as_uuid())
        .bind(request.kind.as_str())
        .bind(&request.purpose)
        .bind(request.status.as_str())
        .bind(&request.rejection_reason)
        .bind(request.issued.as_ref().map(|i| i.control_number.clone()))
        .bind(request.issued.as_ref().map(|i| i.content.clone()))
        .bind(request.issued.as_ref().map(|i| i.content_type.clone()))
        .bind(request.issued.as_ref().map(|i| i.generated_at))
        .bind(request.handled_by.map(|u| *u.as_uuid()))
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_request(&self, id: DocumentRequestId) -> RepoResult<Option<DocumentRequest>> {
        let row = sqlx::query("SELECT * FROM document_requests WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn update_request(&self, request: &DocumentRequest) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE document_requests SET
                status = $2, rejection_reason = $3, control_number = $4,
                content = $5, content_type = $6, generated_at = $7,
                handled_by = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.status.as_str())
        .bind(&request.rejection_reason)
        .bind(request.issued.as_ref().map(|i| i.control_number.clone()))
        .bind(request.issued.as_ref().map(|i| i.content.clone()))
        .bind(request.issued.as_ref().map(|i| i.content_type.clone()))
        .bind(request.issued.as_ref().map(|i| i.generated_at))
        .bind(request.handled_by.map(|u| *u.as_uuid()))
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_requests(
        &self,
        page: Page,
        status: Option<DocumentRequestStatus>,
        resident: Option<ResidentId>,
    ) -> RepoResult<Vec<DocumentRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM document_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR resident_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(resident.map(|r| *r.as_uuid()))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(request_from_row).collect()
    }

    async fn next_control_seq(&self, year: i32) -> RepoResult<u64> {
        let row = sqlx::query(
            r#"
            INSERT INTO control_counters (year, seq)
            VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE SET seq = control_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?;
        let seq: i64 = row.try_get("seq")?;
        Ok(seq as u64)
    }
}

#[async_trait]
impl IncidentRepo for PostgresStore {
    async fn insert_incident(&self, incident: &Incident) -> RepoResult<()> {
        let (complainant_resident, complainant_name) = match &incident.complainant {
            Complainant::Resident(id) => (Some(*id.as_uuid()), None),
            Complainant::Named(name) => (None, Some(name.clone())),
        };

        sqlx::query(
            r#"
            INSERT INTO incidents (
                id, blotter_number, complainant_resident, complainant_name,
                respondent, narrative, incident_date, status, recorded_by,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(incident.id.as_uuid())
        .bind(&incident.blotter_number)
        .bind(complainant_resident)
        .bind(complainant_name)
        .bind(&incident.respondent)
        .bind(&incident.narrative)
        .bind(incident.incident_date)
        .bind(incident.status.as_str())
        .bind(incident.recorded_by.as_uuid())
        .bind(incident.created_at)
        .bind(incident.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_incident(&self, id: IncidentId) -> RepoResult<Option<Incident>> {
        let row = sqlx::query("SELECT * FROM incidents WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(incident_from_row).transpose()
    }

    async fn update_incident(&self, incident: &Incident) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE incidents SET
                respondent = $2, narrative = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(incident.id.as_uuid())
        .bind(&incident.respondent)
        .bind(&incident.narrative)
        .bind(incident.status.as_str())
        .bind(incident.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_incidents(
        &self,
        page: Page,
        status: Option<IncidentStatus>,
    ) -> RepoResult<Vec<Incident>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM incidents
            WHERE $1::text IS NULL OR status = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(incident_from_row).collect()
    }
}

#[async_trait]
impl FinanceRepo for PostgresStore {
    async fn insert_transaction(&self, transaction: &Transaction) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO finance_transactions (
                id, kind, category, amount, description, transaction_date,
                recorded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.kind.as_str())
        .bind(&transaction.category)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(transaction.transaction_date)
        .bind(transaction.recorded_by.as_uuid())
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_transaction(&self, id: TransactionId) -> RepoResult<Option<Transaction>> {
        let row = sqlx::query("SELECT * FROM finance_transactions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn list_transactions(
        &self,
        page: Page,
        kind: Option<TransactionKind>,
    ) -> RepoResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM finance_transactions
            WHERE $1::text IS NULL OR kind = $1
            ORDER BY transaction_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(kind.map(|k| k.as_str()))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn summarize(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<FinanceSummary> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE kind = 'income'), 0) AS total_income,
                COALESCE(SUM(amount) FILTER (WHERE kind = 'expense'), 0) AS total_expense
            FROM finance_transactions
            WHERE ($1::date IS NULL OR transaction_date >= $1)
              AND ($2::date IS NULL OR transaction_date <= $2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let total_income: i64 = row.try_get("total_income")?;
        let total_expense: i64 = row.try_get("total_expense")?;
        Ok(FinanceSummary {
            total_income,
            total_expense,
            net: total_income - total_expense,
        })
    }
}

#[async_trait]
impl InventoryRepo for PostgresStore {
    async fn insert_item(&self, item: &InventoryItem) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, category, unit, quantity, min_stock, location,
                qr_code, deleted_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.min_stock)
        .bind(&item.location)
        .bind(&item.qr_code)
        .bind(item.deleted_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_item(&self, id: ItemId) -> RepoResult<Option<InventoryItem>> {
        let row = sqlx::query("SELECT * FROM inventory_items WHERE id = $1 AND deleted_at IS NULL")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn update_item(&self, item: &InventoryItem) -> RepoResult<()> {
        // `quantity` is deliberately absent: only the ledger applier moves it.
        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = $2, category = $3, unit = $4, min_stock = $5,
                location = $6, qr_code = $7, updated_at = $8
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.unit)
        .bind(item.min_stock)
        .bind(&item.location)
        .bind(&item.qr_code)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_items(&self, page: Page) -> RepoResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM inventory_items
            WHERE deleted_at IS NULL
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn soft_delete_item(&self, id: ItemId, now: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE inventory_items SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    async fn list_low_stock(&self) -> RepoResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM inventory_items
            WHERE deleted_at IS NULL AND quantity <= min_stock
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn record_movement(
        &self,
        item_id: ItemId,
        movement: Movement,
        now: DateTime<Utc>,
    ) -> RepoResult<StockMovement> {
        let mut tx = self.pool.begin().await?;

        if movement.kind == MovementKind::Release {
            if let Some(official_id) = movement.released_to {
                let row = sqlx::query("SELECT active FROM officials WHERE id = $1")
                    .bind(official_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
                match row {
                    None => {
                        return Err(
                            DomainError::validation("recipient official not found").into()
                        );
                    }
                    Some(row) if !row.try_get::<bool, _>("active")? => {
                        return Err(
                            DomainError::validation("recipient official is inactive").into()
                        );
                    }
                    Some(_) => {}
                }
            }
        }

        // Row lock: concurrent movements for the same item queue up here.
        let row = sqlx::query(
            "SELECT quantity FROM inventory_items WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let current: i64 = match row {
            Some(row) => row.try_get("quantity")?,
            None => return Err(DomainError::not_found().into()),
        };

        let new_quantity = apply_movement(current, &movement)?;

        let record = StockMovement {
            id: MovementId::new(),
            item_id,
            kind: movement.kind,
            quantity: movement.quantity,
            resulting_quantity: new_quantity,
            note: movement.note,
            released_to: movement.released_to,
            recorded_by: movement.recorded_by,
            recorded_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, item_id, kind, quantity, resulting_quantity, note,
                released_to, recorded_by, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.item_id.as_uuid())
        .bind(record.kind.as_str())
        .bind(record.quantity)
        .bind(record.resulting_quantity)
        .bind(&record.note)
        .bind(record.released_to.map(|o| *o.as_uuid()))
        .bind(record.recorded_by.as_uuid())
        .bind(record.recorded_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE inventory_items SET quantity = $2, updated_at = $3 WHERE id = $1")
            .bind(item_id.as_uuid())
            .bind(new_quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            item_id = %record.item_id,
            kind = record.kind.as_str(),
            quantity = record.quantity,
            resulting_quantity = record.resulting_quantity,
            "stock movement applied"
        );

        Ok(record)
    }

    async fn list_movements(&self, item_id: ItemId, page: Page) -> RepoResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM stock_movements
            WHERE item_id = $1
            ORDER BY recorded_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(movement_from_row).collect()
    }
}
