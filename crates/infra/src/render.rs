//! Certificate rendering seam.
//!
//! The issuance workflow renders through this trait so the output format is a
//! deployment choice; the default implementation emits a plain-text
//! certificate body. A PDF backend slots in behind the same trait.

use chrono::{DateTime, Utc};
use thiserror::Error;

use bims_documents::DocumentKind;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),
}

/// Everything a renderer needs to produce a certificate.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub kind: DocumentKind,
    pub resident_name: String,
    pub resident_address: String,
    pub purpose: String,
    pub control_number: String,
    pub issued_at: DateTime<Utc>,
}

pub trait DocumentRenderer: Send + Sync {
    /// Render the certificate body. Mime type is reported alongside so the
    /// HTTP layer can serve the file without sniffing.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<u8>, RenderError>;

    fn content_type(&self) -> &'static str;
}

/// Plain-text certificate renderer.
pub struct TextCertificateRenderer {
    barangay_name: String,
}

impl TextCertificateRenderer {
    pub fn new(barangay_name: impl Into<String>) -> Self {
        Self {
            barangay_name: barangay_name.into(),
        }
    }
}

impl DocumentRenderer for TextCertificateRenderer {
    fn render(&self, ctx: &RenderContext) -> Result<Vec<u8>, RenderError> {
        let date = ctx.issued_at.format("%B %e, %Y");
        let body = format!(
            "REPUBLIC OF THE PHILIPPINES\n\
             {barangay}\n\
             OFFICE OF THE PUNONG BARANGAY\n\
             \n\
             {title}\n\
             Control No. {control}\n\
             \n\
             TO WHOM IT MAY CONCERN:\n\
             \n\
             This is to certify that {name}, a resident of {address},\n\
             is known to this office and is issued this {title} for the\n\
             following purpose: {purpose}.\n\
             \n\
             Issued this {date} at the Barangay Hall.\n",
            barangay = self.barangay_name,
            title = ctx.kind.title(),
            control = ctx.control_number,
            name = ctx.resident_name,
            address = ctx.resident_address,
            purpose = ctx.purpose,
            date = date,
        );
        Ok(body.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_resident_details_into_body() {
        let renderer = TextCertificateRenderer::new("Barangay San Isidro");
        let ctx = RenderContext {
            kind: DocumentKind::BarangayClearance,
            resident_name: "dela Cruz, Juan Santos".to_string(),
            resident_address: "Purok 3, Zone 2".to_string(),
            purpose: "employment".to_string(),
            control_number: "BRGY-2026-00042".to_string(),
            issued_at: Utc::now(),
        };
        let body = String::from_utf8(renderer.render(&ctx).unwrap()).unwrap();
        assert!(body.contains("Barangay San Isidro"));
        assert!(body.contains("dela Cruz, Juan Santos"));
        assert!(body.contains("BRGY-2026-00042"));
        assert!(body.contains("employment"));
    }
}
