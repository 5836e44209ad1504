use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, OfficialId};

/// Elected/appointed barangay positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Captain,
    Kagawad,
    SkChairperson,
    Secretary,
    Treasurer,
    Tanod,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::Kagawad => "kagawad",
            Self::SkChairperson => "sk_chairperson",
            Self::Secretary => "secretary",
            Self::Treasurer => "treasurer",
            Self::Tanod => "tanod",
        }
    }
}

impl core::str::FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captain" => Ok(Self::Captain),
            "kagawad" => Ok(Self::Kagawad),
            "sk_chairperson" => Ok(Self::SkChairperson),
            "secretary" => Ok(Self::Secretary),
            "treasurer" => Ok(Self::Treasurer),
            "tanod" => Ok(Self::Tanod),
            other => Err(DomainError::validation(format!("unknown position '{other}'"))),
        }
    }
}

/// Barangay official.
///
/// Officials are the only valid recipients of inventory `Release` movements;
/// the ledger applier checks `active` before accepting one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Official {
    pub id: OfficialId,
    pub name: String,
    pub position: Position,
    pub term_start: NaiveDate,
    pub term_end: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOfficial {
    pub name: String,
    pub position: Position,
    pub term_start: NaiveDate,
    pub term_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialUpdate {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub term_end: Option<Option<NaiveDate>>,
}

impl Official {
    pub fn create(id: OfficialId, new: NewOfficial, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(end) = new.term_end {
            if end < new.term_start {
                return Err(DomainError::validation("term_end cannot precede term_start"));
            }
        }

        Ok(Self {
            id,
            name,
            position: new.position,
            term_start: new.term_start,
            term_end: new.term_end,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: OfficialUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(v) = update.name {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = v;
        }
        if let Some(v) = update.position {
            self.position = v;
        }
        if let Some(v) = update.term_end {
            if let Some(end) = v {
                if end < self.term_start {
                    return Err(DomainError::validation("term_end cannot precede term_start"));
                }
            }
            self.term_end = v;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_official() -> NewOfficial {
        NewOfficial {
            name: "Maria Reyes".to_string(),
            position: Position::Kagawad,
            term_start: NaiveDate::from_ymd_opt(2023, 10, 30).unwrap(),
            term_end: None,
        }
    }

    #[test]
    fn create_marks_official_active() {
        let o = Official::create(OfficialId::new(), new_official(), Utc::now()).unwrap();
        assert!(o.active);
    }

    #[test]
    fn term_end_before_start_is_rejected() {
        let mut new = new_official();
        new.term_end = Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let err = Official::create(OfficialId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deactivate_clears_active_flag() {
        let mut o = Official::create(OfficialId::new(), new_official(), Utc::now()).unwrap();
        o.deactivate(Utc::now());
        assert!(!o.active);
    }
}
