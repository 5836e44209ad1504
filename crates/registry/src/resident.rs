use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, HouseholdId, ResidentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl core::str::FromStr for Sex {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(DomainError::validation(format!("unknown sex '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CivilStatus {
    Single,
    Married,
    Widowed,
    Separated,
}

impl CivilStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::Widowed => "widowed",
            Self::Separated => "separated",
        }
    }
}

impl core::str::FromStr for CivilStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            "widowed" => Ok(Self::Widowed),
            "separated" => Ok(Self::Separated),
            other => Err(DomainError::validation(format!(
                "unknown civil status '{other}'"
            ))),
        }
    }
}

/// Contact information for a resident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Resident master record.
///
/// Residents are never hard-deleted: document requests, blotter entries and
/// household links reference them, so removal is a soft `active = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub civil_status: CivilStatus,
    pub address: String,
    pub contact: ContactInfo,
    pub is_voter: bool,
    pub household_id: Option<HouseholdId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResident {
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

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<Option<String>>,
    pub last_name: Option<String>,
    pub civil_status: Option<CivilStatus>,
    pub address: Option<String>,
    pub contact: Option<ContactInfo>,
    pub is_voter: Option<bool>,
    pub household_id: Option<Option<HouseholdId>>,
}

impl Resident {
    pub fn create(id: ResidentId, new: NewResident, now: DateTime<Utc>) -> DomainResult<Self> {
        let first_name = required("first_name", &new.first_name)?;
        let last_name = required("last_name", &new.last_name)?;
        let address = required("address", &new.address)?;
        if new.birth_date > now.date_naive() {
            return Err(DomainError::validation("birth_date cannot be in the future"));
        }

        Ok(Self {
            id,
            first_name,
            middle_name: new.middle_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            last_name,
            sex: new.sex,
            birth_date: new.birth_date,
            civil_status: new.civil_status,
            address,
            contact: new.contact,
            is_voter: new.is_voter,
            household_id: new.household_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ResidentUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::conflict("resident is deactivated"));
        }
        if let Some(v) = update.first_name {
            self.first_name = required("first_name", &v)?;
        }
        if let Some(v) = update.last_name {
            self.last_name = required("last_name", &v)?;
        }
        if let Some(v) = update.address {
            self.address = required("address", &v)?;
        }
        if let Some(v) = update.middle_name {
            self.middle_name = v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(v) = update.civil_status {
            self.civil_status = v;
        }
        if let Some(v) = update.contact {
            self.contact = v;
        }
        if let Some(v) = update.is_voter {
            self.is_voter = v;
        }
        if let Some(v) = update.household_id {
            self.household_id = v;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }

    /// "Last, First Middle" — the form used on issued certificates.
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(m) => format!("{}, {} {}", self.last_name, self.first_name, m),
            None => format!("{}, {}", self.last_name, self.first_name),
        }
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_resident() -> NewResident {
        NewResident {
            first_name: "Juan".to_string(),
            middle_name: Some("Santos".to_string()),
            last_name: "dela Cruz".to_string(),
            sex: Sex::Male,
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 12).unwrap(),
            civil_status: CivilStatus::Married,
            address: "Purok 3, Zone 2".to_string(),
            contact: ContactInfo::default(),
            is_voter: true,
            household_id: None,
        }
    }

    #[test]
    fn create_trims_and_accepts_valid_input() {
        let mut new = new_resident();
        new.first_name = "  Juan  ".to_string();
        let r = Resident::create(ResidentId::new(), new, Utc::now()).unwrap();
        assert_eq!(r.first_name, "Juan");
        assert!(r.active);
        assert_eq!(r.full_name(), "dela Cruz, Juan Santos");
    }

    #[test]
    fn create_rejects_blank_last_name() {
        let mut new = new_resident();
        new.last_name = "   ".to_string();
        let err = Resident::create(ResidentId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_future_birth_date() {
        let mut new = new_resident();
        new.birth_date = (Utc::now() + chrono::Duration::days(2)).date_naive();
        let err = Resident::create(ResidentId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_on_deactivated_resident_conflicts() {
        let mut r = Resident::create(ResidentId::new(), new_resident(), Utc::now()).unwrap();
        r.deactivate(Utc::now());
        let err = r
            .apply_update(ResidentUpdate::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_clears_middle_name_with_explicit_none() {
        let mut r = Resident::create(ResidentId::new(), new_resident(), Utc::now()).unwrap();
        let update = ResidentUpdate {
            middle_name: Some(None),
            ..ResidentUpdate::default()
        };
        r.apply_update(update, Utc::now()).unwrap();
        assert_eq!(r.middle_name, None);
    }
}
