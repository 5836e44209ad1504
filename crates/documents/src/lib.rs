//! `bims-documents` — document request workflow and issued certificates.
//!
//! Status machine: `Pending → Approved → Released`, with `Rejected` as a
//! terminal branch off `Pending`. Approval renders the certificate; the
//! rendered bytes and control number are stored on the request.

pub mod request;

pub use request::{
    DocumentKind, DocumentRequest, DocumentRequestStatus, IssuedDocument, NewDocumentRequest,
    control_number,
};
