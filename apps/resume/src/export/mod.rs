//! Export Sink: turns the current draft into a downloadable PDF.
//!
//! Flow: `begin_export` (validate + save-through + in-flight flag) under the
//! session lock, then layout and PDF encoding inside `spawn_blocking` with the
//! lock released. The ticket guard clears the in-flight flag on every exit.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::layout::{layout_resume, PageConfig};
use crate::render::pdf::encode_pdf;
use crate::resume::controller::FormController;
use crate::resume::validation::ValidationReport;

pub const FILENAME_LABEL: &str = "履歴書";
pub const NAME_PLACEHOLDER: &str = "未入力";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("An export is already in progress")]
    InFlight,

    #[error("Resume has {} invalid field(s)", .0.errors.len())]
    Invalid(ValidationReport),

    #[error("Failed to persist resume before export: {0:#}")]
    Persist(anyhow::Error),

    #[error("Failed to encode resume document: {0:#}")]
    Encode(anyhow::Error),
}

/// A finished document ready to hand to the client's download manager.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Bytes,
    pub page_count: usize,
}

impl ExportArtifact {
    /// `Content-Disposition` value with an ASCII fallback name and the real
    /// UTF-8 filename (RFC 6266 / RFC 5987).
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"resume.pdf\"; filename*=UTF-8''{}",
            percent_encode(&self.filename)
        )
    }
}

/// `履歴書_<name>_<YYYY-MM-DD>.pdf`, with a placeholder for an empty name.
///
/// Same-day exports for the same person share a name; the download manager
/// decides whether to overwrite.
pub fn export_filename(name: &str, date: NaiveDate) -> String {
    let name = sanitize_filename_part(name.trim());
    let name = if name.is_empty() {
        NAME_PLACEHOLDER.to_string()
    } else {
        name
    };
    format!("{FILENAME_LABEL}_{name}_{}.pdf", date.format("%Y-%m-%d"))
}

fn sanitize_filename_part(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Runs one export of the session's draft.
///
/// Concurrent calls while one is in flight return `ExportError::InFlight`
/// immediately instead of queueing.
pub async fn export_resume(
    session: Arc<Mutex<FormController>>,
    page_config: PageConfig,
) -> Result<ExportArtifact, ExportError> {
    let ticket = {
        let mut controller = session.lock().await;
        controller.begin_export()?
    };

    let started = Instant::now();
    let snapshot = ticket.snapshot.clone();
    let filename = export_filename(&snapshot.personal_info.name, Utc::now().date_naive());

    let encoded = tokio::task::spawn_blocking(move || {
        let document = layout_resume(&snapshot, &page_config);
        let page_count = document.pages.len();
        encode_pdf(&document, &page_config).map(|bytes| (bytes, page_count))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking failed in export: {e}"))
    .and_then(|result| result);

    // Clear the in-flight flag before reporting either outcome.
    drop(ticket);

    match encoded {
        Ok((bytes, page_count)) => {
            info!(
                filename = %filename,
                pages = page_count,
                bytes = bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Resume exported"
            );
            Ok(ExportArtifact {
                filename,
                content_type: PDF_CONTENT_TYPE,
                body: Bytes::from(bytes),
                page_count,
            })
        }
        Err(e) => {
            error!("Resume export failed: {e:#}");
            Err(ExportError::Encode(e))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_page_config;
    use crate::resume::controller::PersonalInfoPatch;
    use crate::store::{MemoryStore, ResumeRepository};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_filename_embeds_name_and_date() {
        assert_eq!(
            export_filename("山田太郎", date()),
            "履歴書_山田太郎_2025-03-14.pdf"
        );
    }

    #[test]
    fn test_filename_placeholder_for_empty_name() {
        assert_eq!(export_filename("", date()), "履歴書_未入力_2025-03-14.pdf");
        assert_eq!(export_filename("   ", date()), "履歴書_未入力_2025-03-14.pdf");
    }

    #[test]
    fn test_filename_strips_path_separators() {
        assert_eq!(export_filename("a/b\\c", date()), "履歴書_a_b_c_2025-03-14.pdf");
    }

    #[test]
    fn test_content_disposition_is_ascii() {
        let artifact = ExportArtifact {
            filename: export_filename("太郎", date()),
            content_type: PDF_CONTENT_TYPE,
            body: Bytes::new(),
            page_count: 1,
        };
        let header = artifact.content_disposition();
        assert!(header.is_ascii());
        assert!(header.starts_with("attachment; filename=\"resume.pdf\"; filename*=UTF-8''"));
        assert!(header.ends_with("_2025-03-14.pdf"));
    }

    #[test]
    fn test_percent_encode_keeps_unreserved() {
        assert_eq!(percent_encode("a-b_c.d~"), "a-b_c.d~");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("履"), "%E5%B1%A5");
    }

    fn session_with_valid_draft() -> (Arc<MemoryStore>, Arc<Mutex<FormController>>) {
        let store = Arc::new(MemoryStore::new());
        let mut controller = FormController::open(ResumeRepository::new(store.clone()));
        controller.update_personal_info(PersonalInfoPatch {
            name: Some("山田太郎".to_string()),
            name_kana: Some("ヤマダタロウ".to_string()),
            birth_date: Some("1990年1月1日".to_string()),
            address: Some("東京都".to_string()),
            phone: Some("090-0000-0000".to_string()),
            email: Some("taro@example.com".to_string()),
            ..Default::default()
        });
        (store, Arc::new(Mutex::new(controller)))
    }

    #[tokio::test]
    async fn test_export_produces_pdf_and_saves_through() {
        let (store, session) = session_with_valid_draft();
        let artifact = export_resume(session.clone(), default_page_config())
            .await
            .unwrap();

        assert!(artifact.body.starts_with(b"%PDF-"));
        assert_eq!(artifact.content_type, "application/pdf");
        assert!(artifact.filename.starts_with("履歴書_山田太郎_"));
        assert_eq!(artifact.page_count, 1);
        assert_eq!(store.write_count(), 1);

        let controller = session.lock().await;
        assert!(!controller.is_exporting(), "flag cleared after export");
        assert!(!controller.is_dirty());
    }

    #[tokio::test]
    async fn test_export_rejected_while_in_flight() {
        let (_, session) = session_with_valid_draft();
        let ticket = session.lock().await.begin_export().unwrap();

        let second = export_resume(session.clone(), default_page_config()).await;
        assert!(matches!(second, Err(ExportError::InFlight)));

        drop(ticket);
        assert!(export_resume(session, default_page_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_export_of_invalid_draft_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let session = Arc::new(Mutex::new(FormController::open(ResumeRepository::new(
            store.clone(),
        ))));
        let result = export_resume(session.clone(), default_page_config()).await;
        assert!(matches!(result, Err(ExportError::Invalid(_))));
        assert_eq!(store.write_count(), 0);
        assert!(!session.lock().await.is_exporting());
    }
}
