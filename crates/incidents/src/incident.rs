use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, IncidentId, ResidentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Filed,
    Ongoing,
    Resolved,
    Dismissed,
}

impl IncidentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filed => "filed",
            Self::Ongoing => "ongoing",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }
}

impl core::str::FromStr for IncidentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filed" => Ok(Self::Filed),
            "ongoing" => Ok(Self::Ongoing),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(DomainError::validation(format!(
                "unknown incident status '{other}'"
            ))),
        }
    }
}

/// Who filed the complaint: a registered resident or a walk-in named party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Complainant {
    Resident(ResidentId),
    Named(String),
}

/// Blotter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    /// Barangay-assigned blotter number, unique per barangay.
    pub blotter_number: String,
    pub complainant: Complainant,
    pub respondent: String,
    pub narrative: String,
    pub incident_date: DateTime<Utc>,
    pub status: IncidentStatus,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    pub blotter_number: String,
    pub complainant: Complainant,
    pub respondent: String,
    pub narrative: String,
    pub incident_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub respondent: Option<String>,
    pub narrative: Option<String>,
}

impl Incident {
    pub fn create(
        id: IncidentId,
        new: NewIncident,
        recorded_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let blotter_number = new.blotter_number.trim().to_string();
        if blotter_number.is_empty() {
            return Err(DomainError::validation("blotter_number cannot be empty"));
        }
        let narrative = new.narrative.trim().to_string();
        if narrative.is_empty() {
            return Err(DomainError::validation("narrative cannot be empty"));
        }
        if let Complainant::Named(name) = &new.complainant {
            if name.trim().is_empty() {
                return Err(DomainError::validation("complainant name cannot be empty"));
            }
        }

        Ok(Self {
            id,
            blotter_number,
            complainant: new.complainant,
            respondent: new.respondent.trim().to_string(),
            narrative,
            incident_date: new.incident_date,
            status: IncidentStatus::Filed,
            recorded_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: IncidentUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::conflict("incident is closed"));
        }
        if let Some(v) = update.narrative {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(DomainError::validation("narrative cannot be empty"));
            }
            self.narrative = v;
        }
        if let Some(v) = update.respondent {
            self.respondent = v.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move the incident to `next`, enforcing the blotter lifecycle.
    pub fn transition(&mut self, next: IncidentStatus, now: DateTime<Utc>) -> DomainResult<()> {
        let allowed = match (self.status, next) {
            (IncidentStatus::Filed, IncidentStatus::Ongoing) => true,
            (IncidentStatus::Filed | IncidentStatus::Ongoing, IncidentStatus::Resolved) => true,
            (IncidentStatus::Filed | IncidentStatus::Ongoing, IncidentStatus::Dismissed) => true,
            _ => false,
        };
        if !allowed {
            return Err(DomainError::conflict(format!(
                "cannot move incident from {:?} to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}
