use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, HouseholdId, ResidentId};

/// Household record. Membership is held on the resident side
/// (`Resident::household_id`); the head link lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    /// Barangay-assigned household number, unique per barangay.
    pub number: String,
    pub purok: String,
    pub address: String,
    pub head: Option<ResidentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHousehold {
    pub number: String,
    pub purok: String,
    pub address: String,
    pub head: Option<ResidentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdUpdate {
    pub purok: Option<String>,
    pub address: Option<String>,
    pub head: Option<Option<ResidentId>>,
}

impl Household {
    pub fn create(id: HouseholdId, new: NewHousehold, now: DateTime<Utc>) -> DomainResult<Self> {
        let number = new.number.trim().to_string();
        if number.is_empty() {
            return Err(DomainError::validation("number cannot be empty"));
        }
        let address = new.address.trim().to_string();
        if address.is_empty() {
            return Err(DomainError::validation("address cannot be empty"));
        }

        Ok(Self {
            id,
            number,
            purok: new.purok.trim().to_string(),
            address,
            head: new.head,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: HouseholdUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(v) = update.address {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(DomainError::validation("address cannot be empty"));
            }
            self.address = v;
        }
        if let Some(v) = update.purok {
            self.purok = v.trim().to_string();
        }
        if let Some(v) = update.head {
            self.head = v;
        }
        self.updated_at = now;
        Ok(())
    }
}
