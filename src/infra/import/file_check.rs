/// A file the user picked for upload, described before its content is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// Limits a candidate file must satisfy before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheckPolicy {
    pub max_size: u64,
    pub allowed_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

impl Default for FileCheckPolicy {
    fn default() -> Self {
        Self {
            max_size: 5 * 1024 * 1024,
            allowed_types: vec![
                "text/csv".to_string(),
                "application/vnd.ms-excel".to_string(),
            ],
            allowed_extensions: vec![".csv".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Size and type gate. A file passes the type check when either its reported
/// mime type or its name extension is allowed, so systems that report a blank
/// or generic mime type still get through on extension.
pub fn validate_file(file: &CandidateFile, policy: &FileCheckPolicy) -> FileCheck {
    let mut errors = Vec::new();

    if file.size > policy.max_size {
        errors.push(format!(
            "File size ({}) exceeds maximum allowed size ({})",
            format_file_size(file.size),
            format_file_size(policy.max_size)
        ));
    }

    let type_allowed = policy
        .allowed_types
        .iter()
        .any(|allowed| allowed == &file.mime_type);
    let lower_name = file.name.to_ascii_lowercase();
    let extension_allowed = policy
        .allowed_extensions
        .iter()
        .any(|ext| lower_name.ends_with(&ext.to_ascii_lowercase()));
    if !type_allowed && !extension_allowed {
        errors.push(format!(
            "Invalid file type. Allowed types: {}",
            policy.allowed_extensions.join(", ")
        ));
    }

    FileCheck {
        valid: errors.is_empty(),
        errors,
    }
}

/// 1024-based size with at most two decimals, "0 Bytes" for zero.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;

    let mut text = format!("{rounded:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{} {}", text, UNITS[exponent])
}
