//! `bims-registry` — civil registry domain: residents, households, officials.
//!
//! Pure domain types and validation; persistence lives in `bims-infra`.

pub mod household;
pub mod official;
pub mod resident;

pub use household::{Household, HouseholdUpdate, NewHousehold};
pub use official::{NewOfficial, Official, OfficialUpdate, Position};
pub use resident::{CivilStatus, ContactInfo, NewResident, Resident, ResidentUpdate, Sex};
