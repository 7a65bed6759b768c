use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::numbers::{format_grouped, parse_quantity, round2};

/// Month-keyed numeric map exactly as the backend serializes it. The insertion
/// order of the keys is the render order.
pub type MonthMap = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMethod {
    Direct,
    Local,
}

impl FulfillmentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            FulfillmentMethod::Direct => "Direct Shipment",
            FulfillmentMethod::Local => "Local Warehouse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnit {
    Pieces,
    Cases,
}

impl VolumeUnit {
    pub fn label(&self) -> &'static str {
        match self {
            VolumeUnit::Pieces => "Pieces",
            VolumeUnit::Cases => "Cases",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// One month cell of a read-only display series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyPoint {
    pub month: String,
    pub value: String,
}

/// One month cell of a derived numeric series (revenue).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAmount {
    pub month: String,
    pub value: f64,
}

/// Projects a backend month map to display points in server key order, with
/// grouped number formatting. Values the map carries as strings pass through
/// the same numeric cleanup as everything else.
pub fn map_to_points(map: &MonthMap) -> Vec<MonthlyPoint> {
    map.iter()
        .map(|(month, value)| MonthlyPoint {
            month: month.clone(),
            value: format_grouped(value_as_quantity(value)),
        })
        .collect()
}

/// Derives per-month revenue: cleaned quantity times unit price, rounded to
/// two decimals. A missing unit price counts as zero. Running this over its
/// own numeric output yields the same amounts.
pub fn revenue_series(map: &MonthMap, unit_price: Option<f64>) -> Vec<MonthlyAmount> {
    let price = unit_price.unwrap_or(0.0);
    map.iter()
        .map(|(month, value)| MonthlyAmount {
            month: month.clone(),
            value: round2(value_as_quantity(value) * price),
        })
        .collect()
}

/// Numeric coercion for map cells: numbers pass through, strings get
/// grouping separators stripped, anything unparseable is zero.
pub fn value_as_quantity(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_quantity(text),
        _ => 0.0,
    }
}

/// Raw cell text for seeding draft edits: keeps the server's own rendering of
/// the value rather than reformatting it.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub record_id: String,
    pub name: String,
    #[serde(default)]
    pub unit_price: Option<f64>,
    /// Pieces per case, the unit-conversion factor.
    pub uom: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentEntry {
    pub record_id: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub opportunity_forecast_id: Option<String>,
    #[serde(default)]
    pub opportunity_name: Option<String>,
    pub forecast_numbers: MonthMap,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityEntry {
    pub record_id: String,
    pub opportunity_id: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub bu_approval: Option<String>,
    pub approved: bool,
    pub rejected: bool,
    pub pending: bool,
    pub forecast_numbers: MonthMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRef {
    pub value: String,
    pub label: String,
}
