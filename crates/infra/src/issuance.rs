//! Document issuance workflow.
//!
//! Approval is the expensive step: it allocates a control number, renders the
//! certificate, and persists the issued artifact on the request. Rendering
//! happens before the status change is saved, so a renderer failure leaves
//! the request `Pending` and the operator can retry.

use chrono::{DateTime, Datelike, Utc};

use bims_core::{DocumentRequestId, DomainError, UserId};
use bims_documents::{DocumentRequest, IssuedDocument, control_number};

use crate::error::{RepoError, RepoResult};
use crate::render::{DocumentRenderer, RenderContext};
use crate::store::{DocumentRequestRepo, ResidentRepo, Store};

/// Approve a pending request: allocate a control number, render the
/// certificate, and save the request as `Approved` with the artifact
/// attached. Re-approving an already approved request regenerates the
/// document under a fresh control number.
pub async fn approve_request(
    store: &dyn Store,
    renderer: &dyn DocumentRenderer,
    request_id: DocumentRequestId,
    approved_by: UserId,
    now: DateTime<Utc>,
) -> RepoResult<DocumentRequest> {
    let mut request = store
        .get_request(request_id)
        .await?
        .ok_or_else(DomainError::not_found)?;

    let resident = store
        .get_resident(request.resident_id)
        .await?
        .ok_or_else(|| DomainError::invariant("request refers to an unknown resident"))?;
    if !resident.active {
        return Err(DomainError::validation(
            "cannot issue documents for a deactivated resident",
        )
        .into());
    }

    let seq = store.next_control_seq(now.year()).await?;
    let control = control_number(now.year(), seq);

    let ctx = RenderContext {
        kind: request.kind,
        resident_name: resident.full_name(),
        resident_address: resident.address.clone(),
        purpose: request.purpose.clone(),
        control_number: control.clone(),
        issued_at: now,
    };
    let content = renderer
        .render(&ctx)
        .map_err(|e| RepoError::storage(format!("certificate render failed: {e}")))?;

    let issued = IssuedDocument {
        control_number: control,
        content,
        content_type: renderer.content_type().to_string(),
        generated_at: now,
    };
    request.approve(issued, approved_by, now)?;
    store.update_request(&request).await?;

    tracing::info!(
        request_id = %request.id,
        control_number = %request.issued.as_ref().map(|i| i.control_number.as_str()).unwrap_or(""),
        "document request approved"
    );

    Ok(request)
}

/// Reject a pending request with an operator-supplied reason.
pub async fn reject_request(
    store: &dyn Store,
    request_id: DocumentRequestId,
    reason: String,
    rejected_by: UserId,
    now: DateTime<Utc>,
) -> RepoResult<DocumentRequest> {
    let mut request = store
        .get_request(request_id)
        .await?
        .ok_or_else(DomainError::not_found)?;
    request.reject(reason, rejected_by, now)?;
    store.update_request(&request).await?;
    Ok(request)
}

/// Mark an approved request as handed over to the resident.
pub async fn release_request(
    store: &dyn Store,
    request_id: DocumentRequestId,
    released_by: UserId,
    now: DateTime<Utc>,
) -> RepoResult<DocumentRequest> {
    let mut request = store
        .get_request(request_id)
        .await?
        .ok_or_else(DomainError::not_found)?;
    request.release(released_by, now)?;
    store.update_request(&request).await?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::render::{RenderError, TextCertificateRenderer};
    use bims_core::ResidentId;
    use bims_documents::{DocumentKind, DocumentRequestStatus, NewDocumentRequest};
    use bims_registry::{CivilStatus, ContactInfo, NewResident, Resident, Sex};
    use chrono::NaiveDate;

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(&self, _ctx: &RenderContext) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Failed("printer on fire".into()))
        }

        fn content_type(&self) -> &'static str {
            "text/plain"
        }
    }

    async fn seed_resident(store: &InMemoryStore) -> ResidentId {
        let resident = Resident::create(
            ResidentId::new(),
            NewResident {
                first_name: "Juan".into(),
                middle_name: None,
                last_name: "dela Cruz".into(),
                sex: Sex::Male,
                birth_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
                civil_status: CivilStatus::Single,
                address: "Purok 3".into(),
                contact: ContactInfo::default(),
                is_voter: true,
                household_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        let id = resident.id;
        store.insert_resident(&resident).await.unwrap();
        id
    }

    async fn seed_request(store: &InMemoryStore, resident_id: ResidentId) -> DocumentRequestId {
        let request = DocumentRequest::create(
            DocumentRequestId::new(),
            NewDocumentRequest {
                resident_id,
                kind: DocumentKind::BarangayClearance,
                purpose: "employment".into(),
            },
            Utc::now(),
        )
        .unwrap();
        let id = request.id;
        store.insert_request(&request).await.unwrap();
        id
    }

    #[tokio::test]
    async fn approval_renders_and_stores_certificate() {
        let store = InMemoryStore::new();
        let resident_id = seed_resident(&store).await;
        let request_id = seed_request(&store, resident_id).await;
        let renderer = TextCertificateRenderer::new("Barangay San Isidro");

        let approved = approve_request(&store, &renderer, request_id, UserId::new(), Utc::now())
            .await
            .unwrap();

        assert_eq!(approved.status, DocumentRequestStatus::Approved);
        let issued = approved.issued.unwrap();
        assert!(issued.control_number.starts_with("BRGY-"));
        assert!(!issued.content.is_empty());
    }

    #[tokio::test]
    async fn render_failure_leaves_request_pending() {
        let store = InMemoryStore::new();
        let resident_id = seed_resident(&store).await;
        let request_id = seed_request(&store, resident_id).await;

        let result =
            approve_request(&store, &FailingRenderer, request_id, UserId::new(), Utc::now()).await;
        assert!(matches!(result, Err(RepoError::Storage(_))));

        let request = store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, DocumentRequestStatus::Pending);
        assert!(request.issued.is_none());
    }

    #[tokio::test]
    async fn reapproval_regenerates_with_new_control_number() {
        let store = InMemoryStore::new();
        let resident_id = seed_resident(&store).await;
        let request_id = seed_request(&store, resident_id).await;
        let renderer = TextCertificateRenderer::new("Barangay San Isidro");
        let by = UserId::new();

        let first = approve_request(&store, &renderer, request_id, by, Utc::now())
            .await
            .unwrap();
        let second = approve_request(&store, &renderer, request_id, by, Utc::now())
            .await
            .unwrap();

        let first_cn = first.issued.unwrap().control_number;
        let second_cn = second.issued.unwrap().control_number;
        assert_ne!(first_cn, second_cn);
    }

    #[tokio::test]
    async fn release_requires_approval_first() {
        let store = InMemoryStore::new();
        let resident_id = seed_resident(&store).await;
        let request_id = seed_request(&store, resident_id).await;

        let result = release_request(&store, request_id, UserId::new(), Utc::now()).await;
        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn deactivated_resident_blocks_issuance() {
        let store = InMemoryStore::new();
        let resident_id = seed_resident(&store).await;
        let request_id = seed_request(&store, resident_id).await;

        let mut resident = store.get_resident(resident_id).await.unwrap().unwrap();
        resident.deactivate(Utc::now());
        store.update_resident(&resident).await.unwrap();

        let renderer = TextCertificateRenderer::new("Barangay San Isidro");
        let result =
            approve_request(&store, &renderer, request_id, UserId::new(), Utc::now()).await;
        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::Validation(_)))
        ));
    }
}
