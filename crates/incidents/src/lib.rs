//! `bims-incidents` — blotter (incident) records.

pub mod incident;

pub use incident::{Complainant, Incident, IncidentStatus, IncidentUpdate, NewIncident};
