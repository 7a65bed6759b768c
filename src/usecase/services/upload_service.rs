use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::infra::import::csv::{parse_upload_csv, CsvParseOutcome};
use crate::infra::import::file_check::{validate_file, CandidateFile, FileCheck, FileCheckPolicy};
use crate::usecase::ports::backend::{BackendError, CsvValidation, ForecastBackend, UploadResult};

/// Staging flow for the CSV mass upload: precheck the file, parse and
/// validate locally, then hand the raw content to the backend.
pub struct UploadService {
    backend: Arc<dyn ForecastBackend>,
    policy: FileCheckPolicy,
}

impl UploadService {
    pub fn new(backend: Arc<dyn ForecastBackend>) -> Self {
        Self {
            backend,
            policy: FileCheckPolicy::default(),
        }
    }

    pub fn candidate_from_path(path: &Path) -> Result<CandidateFile> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to inspect file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let mime_type = if name.to_ascii_lowercase().ends_with(".csv") {
            "text/csv".to_string()
        } else {
            String::new()
        };

        Ok(CandidateFile {
            name,
            size: metadata.len(),
            mime_type,
        })
    }

    pub fn read_content(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read csv file: {}", path.display()))
    }

    /// Size/type/extension gate; runs before anything is parsed or sent.
    pub fn precheck(&self, file: &CandidateFile) -> FileCheck {
        validate_file(file, &self.policy)
    }

    /// Client-side parse and format validation of the upload content.
    /// Structural failures (empty file, missing columns) abort; row-level
    /// problems land in the outcome's error list, partial success allowed.
    pub fn parse(&self, content: &str) -> Result<CsvParseOutcome> {
        parse_upload_csv(content)
    }

    pub fn validate_remote(&self, content: &str) -> Result<CsvValidation, BackendError> {
        self.backend.validate_csv(content)
    }

    pub fn upload(&self, content: &str) -> Result<UploadResult, BackendError> {
        self.backend.process_mass_upload(content)
    }

    /// Result row shown when the upload call itself failed, mirroring what a
    /// successful call would have returned.
    pub fn failed_upload_result(message: &str) -> UploadResult {
        UploadResult {
            total_rows: 0,
            success_rows: 0,
            error_rows: 0,
            errors: vec![message.to_string()],
            success: false,
            message: "Upload failed with error".to_string(),
        }
    }

    pub fn download_template(&self, destination: &Path) -> Result<()> {
        let template = self
            .backend
            .csv_template()
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;
        fs::write(destination, template)
            .with_context(|| format!("failed to write template: {}", destination.display()))
    }
}
