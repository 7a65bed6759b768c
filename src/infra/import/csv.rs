use anyhow::{bail, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};

use crate::domain::numbers::parse_quantity;

/// Columns of the mass-upload template, in template order.
pub const UPLOAD_COLUMNS: [&str; 8] = [
    "AccountId",
    "ProductId",
    "Month",
    "Quantity",
    "UnitPrice",
    "Direct",
    "Local",
    "Warehouse",
];

pub const REQUIRED_UPLOAD_COLUMNS: [&str; 4] = ["AccountId", "ProductId", "Month", "Quantity"];

/// One parsed data row: header -> value, in column order. `line` is the
/// 1-based position among non-blank lines of the file, header line included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    fields: Vec<(String, String)>,
}

impl CsvRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvParseOutcome {
    pub data: Vec<CsvRow>,
    pub errors: Vec<String>,
    pub row_count: usize,
    pub headers: Vec<String>,
}

/// Parses CSV content with a mandatory header row. Structural problems
/// (empty content, too few lines, missing required columns) abort the parse;
/// a row whose column count does not match the header is skipped with an
/// error entry and the rest of the file still goes through.
pub fn parse_csv(content: &str, required_columns: &[&str]) -> Result<CsvParseOutcome> {
    if content.trim().is_empty() {
        bail!("CSV content is empty");
    }

    let non_blank_lines = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();
    if non_blank_lines < 2 {
        bail!("CSV must contain headers and at least one data row");
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(err) => bail!("failed to read csv headers: {err}"),
    };

    for required in required_columns {
        if !headers.iter().any(|header| header == required) {
            bail!("Missing required column: {required}");
        }
    }

    let mut data = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // header is line 1, first data row is line 2
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                errors.push(format!("Row {line}: {err}"));
                continue;
            }
        };

        if record.len() != headers.len() {
            errors.push(format!(
                "Row {line}: Column count mismatch (expected {}, got {})",
                headers.len(),
                record.len()
            ));
            continue;
        }

        data.push(CsvRow {
            line,
            fields: headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        });
    }

    let row_count = data.len();
    Ok(CsvParseOutcome {
        data,
        errors,
        row_count,
        headers,
    })
}

/// Parse plus the per-row format checks the upload template documents.
/// Format violations land in the outcome's error list next to the
/// column-count mismatches.
pub fn parse_upload_csv(content: &str) -> Result<CsvParseOutcome> {
    let mut outcome = parse_csv(content, &REQUIRED_UPLOAD_COLUMNS)?;
    let mut format_errors = validate_upload_rows(&outcome);
    outcome.errors.append(&mut format_errors);
    Ok(outcome)
}

/// Record ids are 15 or 18 character alphanumeric tokens.
pub fn is_valid_record_id(id: &str) -> bool {
    (id.len() == 15 || id.len() == 18) && id.chars().all(|ch| ch.is_ascii_alphanumeric())
}

pub fn validate_upload_rows(outcome: &CsvParseOutcome) -> Vec<String> {
    let mut errors = Vec::new();

    for row in &outcome.data {
        let line = row.line;

        for id_column in ["AccountId", "ProductId"] {
            let value = row.get(id_column).unwrap_or_default();
            if !is_valid_record_id(value) {
                errors.push(format!(
                    "Row {line}: {id_column} must be a 15 or 18 character record id"
                ));
            }
        }

        let month = row.get("Month").unwrap_or_default();
        if NaiveDate::parse_from_str(month, "%m/%d/%Y").is_err() {
            errors.push(format!("Row {line}: Month must use MM/DD/YYYY format"));
        }

        let quantity = row.get("Quantity").unwrap_or_default().trim();
        if quantity.is_empty() || quantity.replace(',', "").parse::<f64>().is_err() {
            errors.push(format!("Row {line}: Quantity must be numeric"));
        } else if parse_quantity(quantity) < 0.0 {
            errors.push(format!("Row {line}: Quantity must not be negative"));
        }

        if let Some(price) = row.get("UnitPrice") {
            let price = price.trim();
            if !price.is_empty() && price.parse::<f64>().is_err() {
                errors.push(format!("Row {line}: UnitPrice must be a decimal value"));
            }
        }

        for flag_column in ["Direct", "Local"] {
            if let Some(flag) = row.get(flag_column) {
                let flag = flag.trim();
                if !flag.is_empty() && flag != "true" && flag != "false" {
                    errors.push(format!("Row {line}: {flag_column} must be true or false"));
                }
            }
        }
    }

    errors
}
