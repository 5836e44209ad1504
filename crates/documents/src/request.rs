use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, DocumentRequestId, ResidentId, UserId};

/// Certificate/clearance types issued by the barangay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BarangayClearance,
    CertificateOfResidency,
    CertificateOfIndigency,
    BusinessPermit,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::BarangayClearance => "Barangay Clearance",
            Self::CertificateOfResidency => "Certificate of Residency",
            Self::CertificateOfIndigency => "Certificate of Indigency",
            Self::BusinessPermit => "Barangay Business Permit",
        }
    }
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BarangayClearance => "barangay_clearance",
            Self::CertificateOfResidency => "certificate_of_residency",
            Self::CertificateOfIndigency => "certificate_of_indigency",
            Self::BusinessPermit => "business_permit",
        }
    }
}

impl core::str::FromStr for DocumentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "barangay_clearance" => Ok(Self::BarangayClearance),
            "certificate_of_residency" => Ok(Self::CertificateOfResidency),
            "certificate_of_indigency" => Ok(Self::CertificateOfIndigency),
            "business_permit" => Ok(Self::BusinessPermit),
            other => Err(DomainError::validation(format!(
                "unknown document kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRequestStatus {
    Pending,
    Approved,
    Rejected,
    Released,
}

impl DocumentRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Released => "released",
        }
    }
}

impl core::str::FromStr for DocumentRequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "released" => Ok(Self::Released),
            other => Err(DomainError::validation(format!(
                "unknown request status '{other}'"
            ))),
        }
    }
}

/// Rendered certificate attached to an approved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedDocument {
    pub control_number: String,
    /// Rendered bytes; served by the file endpoint, never inlined in JSON.
    #[serde(skip_serializing, default)]
    pub content: Vec<u8>,
    pub content_type: String,
    pub generated_at: DateTime<Utc>,
}

/// A resident's request for a barangay document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub id: DocumentRequestId,
    pub resident_id: ResidentId,
    pub kind: DocumentKind,
    pub purpose: String,
    pub status: DocumentRequestStatus,
    pub rejection_reason: Option<String>,
    pub issued: Option<IssuedDocument>,
    /// Staff user who approved/rejected/released, once acted on.
    pub handled_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentRequest {
    pub resident_id: ResidentId,
    pub kind: DocumentKind,
    pub purpose: String,
}

/// Control number stamped on issued documents: `BRGY-<year>-<seq>`.
///
/// The sequence is allocated by the repository (per-year counter).
pub fn control_number(year: i32, seq: u64) -> String {
    format!("BRGY-{year}-{seq:05}")
}

impl DocumentRequest {
    pub fn create(
        id: DocumentRequestId,
        new: NewDocumentRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let purpose = new.purpose.trim().to_string();
        if purpose.is_empty() {
            return Err(DomainError::validation("purpose cannot be empty"));
        }

        Ok(Self {
            id,
            resident_id: new.resident_id,
            kind: new.kind,
            purpose,
            status: DocumentRequestStatus::Pending,
            rejection_reason: None,
            issued: None,
            handled_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Approve the request, attaching the rendered certificate.
    ///
    /// Re-approving an `Approved` request is allowed and replaces the issued
    /// document (regeneration); any other state is a conflict.
    pub fn approve(
        &mut self,
        issued: IssuedDocument,
        by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match self.status {
            DocumentRequestStatus::Pending | DocumentRequestStatus::Approved => {
                self.status = DocumentRequestStatus::Approved;
                self.issued = Some(issued);
                self.handled_by = Some(by);
                self.rejection_reason = None;
                self.updated_at = now;
                Ok(())
            }
            DocumentRequestStatus::Rejected => {
                Err(DomainError::conflict("request was rejected"))
            }
            DocumentRequestStatus::Released => {
                Err(DomainError::conflict("request was already released"))
            }
        }
    }

    pub fn reject(&mut self, reason: String, by: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::validation("rejection reason cannot be empty"));
        }
        if self.status != DocumentRequestStatus::Pending {
            return Err(DomainError::conflict("only pending requests can be rejected"));
        }
        self.status = DocumentRequestStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.handled_by = Some(by);
        self.updated_at = now;
        Ok(())
    }

    pub fn release(&mut self, by: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != DocumentRequestStatus::Approved {
            return Err(DomainError::conflict("only approved requests can be released"));
        }
        self.status = DocumentRequestStatus::Released;
        self.handled_by = Some(by);
        self.updated_at = now;
        Ok(())
    }
}
