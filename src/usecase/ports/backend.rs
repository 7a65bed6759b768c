use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::checklist::{ChecklistItem, CompletedAction};
use crate::domain::entities::forecast::{
    AdjustmentEntry, ApprovalStatus, FulfillmentMethod, MonthMap, OpportunityEntry, ProductInfo,
    VolumeUnit, WarehouseRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// Error body as the backend serializes it: a direct message plus optional
/// page-level and field-level sub-errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub page_errors: Vec<ErrorDetail>,
    #[serde(default)]
    pub field_errors: BTreeMap<String, Vec<ErrorDetail>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The call never produced a response body (connection, timeout, decode).
    Transport(String),
    /// The backend answered with a structured error.
    Rpc(ErrorBody),
}

impl BackendError {
    pub fn message(text: impl Into<String>) -> Self {
        BackendError::Rpc(ErrorBody {
            message: Some(text.into()),
            ..ErrorBody::default()
        })
    }

    /// Human-readable message, extracted in priority order: direct message,
    /// first page-level error, first field-level error, stringified fallback.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Transport(message) => message.clone(),
            BackendError::Rpc(body) => body
                .message
                .clone()
                .or_else(|| body.page_errors.first().map(|err| err.message.clone()))
                .or_else(|| {
                    body.field_errors
                        .values()
                        .flatten()
                        .next()
                        .map(|err| err.message.clone())
                })
                .unwrap_or_else(|| format!("{body:?}")),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchForecastRequest {
    pub account_id: String,
    pub product_id: String,
    pub volume: VolumeUnit,
    pub direct: bool,
}

/// One month quantity in a save payload. The quantity travels as entered;
/// the `volume` field of the enclosing request names its unit and the backend
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityUpsert {
    pub external_id: String,
    pub quantity: String,
    pub fulfillment: FulfillmentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBaseForecastRequest {
    pub account_id: String,
    pub product_id: String,
    pub entries: Vec<QuantityUpsert>,
    pub volume: VolumeUnit,
    pub uom: f64,
    pub direct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAdjustmentRequest {
    pub account_id: String,
    pub product_id: String,
    pub adjustment_id: String,
    #[serde(default)]
    pub opportunity_id: Option<String>,
    pub name: String,
    pub comment: String,
    pub entries: Vec<QuantityUpsert>,
    pub volume: VolumeUnit,
    pub uom: f64,
}

/// Full per-product forecast payload, field names as the backend sends them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSnapshot {
    pub product_info: ProductInfo,
    pub direct_enabled: bool,
    pub local_enabled: bool,
    #[serde(default)]
    pub date_range: Vec<String>,
    #[serde(default)]
    pub base_direct_map: MonthMap,
    #[serde(default)]
    pub base_local_map: MonthMap,
    #[serde(default)]
    pub direct_adjustment_entries: Vec<AdjustmentEntry>,
    #[serde(default)]
    pub local_adjustment_entries: Vec<AdjustmentEntry>,
    #[serde(default)]
    pub direct_opps_entries: Vec<OpportunityEntry>,
    #[serde(default)]
    pub local_opps_entries: Vec<OpportunityEntry>,
    #[serde(default)]
    pub previous_year_orders_map: MonthMap,
    #[serde(default)]
    pub current_year_orders_map: MonthMap,
    #[serde(default)]
    pub opportunities_total_direct_map: MonthMap,
    #[serde(default)]
    pub adjustments_total_direct_map: MonthMap,
    #[serde(default)]
    pub forecast_total_direct_map: MonthMap,
    #[serde(default)]
    pub opportunities_total_local_map: MonthMap,
    #[serde(default)]
    pub adjustments_total_local_map: MonthMap,
    #[serde(default)]
    pub forecast_total_local_map: MonthMap,
    #[serde(default)]
    pub base_summary_map: MonthMap,
    #[serde(default)]
    pub opportunities_summary_map: MonthMap,
    #[serde(default)]
    pub adjustments_summary_map: MonthMap,
    #[serde(default)]
    pub forecast_summary_map: MonthMap,
    #[serde(default)]
    pub warehouse: Option<WarehouseRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListRequest {
    pub account_id: String,
    pub page: i64,
    pub search: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForecastEntry {
    pub product_info: ProductInfo,
    pub direct_enabled: bool,
    pub local_enabled: bool,
    #[serde(default)]
    pub warehouse_name: Option<String>,
    #[serde(default)]
    pub previous_year_orders_map: MonthMap,
    #[serde(default)]
    pub current_year_orders_map: MonthMap,
    #[serde(default)]
    pub base_total_map: MonthMap,
    #[serde(default)]
    pub opportunities_total_map: MonthMap,
    #[serde(default)]
    pub adjustments_total_map: MonthMap,
    #[serde(default)]
    pub forecast_total_map: MonthMap,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResult {
    pub products: Vec<ProductForecastEntry>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvValidation {
    pub valid: bool,
    #[serde(default)]
    pub row_count: i64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of a mass upload. Returned by the backend and rendered verbatim,
/// never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub total_rows: i64,
    pub success_rows: i64,
    pub error_rows: i64,
    #[serde(default)]
    pub errors: Vec<String>,
    pub success: bool,
    pub message: String,
}

/// The backend RPC surface. Every operation is a named call with a typed
/// argument record and a typed (or error) response; the transport behind it
/// is opaque to the rest of the program.
pub trait ForecastBackend: Send + Sync {
    fn fetch_forecast(&self, request: FetchForecastRequest)
        -> Result<ForecastSnapshot, BackendError>;

    fn upsert_base_forecast(&self, request: UpsertBaseForecastRequest)
        -> Result<(), BackendError>;

    fn upsert_adjustment(&self, request: UpsertAdjustmentRequest) -> Result<(), BackendError>;

    fn set_fulfillment_method(
        &self,
        account_id: &str,
        product_id: &str,
        method: FulfillmentMethod,
        enabled: bool,
    ) -> Result<(), BackendError>;

    fn disable_product(
        &self,
        account_id: &str,
        product_id: &str,
        direct: bool,
    ) -> Result<(), BackendError>;

    fn deactivate_adjustment(&self, adjustment_id: &str) -> Result<(), BackendError>;

    fn set_opportunity_approval(
        &self,
        opportunity_forecast_id: &str,
        status: ApprovalStatus,
    ) -> Result<(), BackendError>;

    fn update_warehouse(
        &self,
        account_id: &str,
        product_id: &str,
        warehouse_id: Option<&str>,
        direct: bool,
    ) -> Result<(), BackendError>;

    fn update_price(
        &self,
        account_id: &str,
        product_id: &str,
        price: f64,
    ) -> Result<(), BackendError>;

    fn list_product_forecasts(
        &self,
        request: ProductListRequest,
    ) -> Result<ProductListResult, BackendError>;

    fn validate_csv(&self, csv_content: &str) -> Result<CsvValidation, BackendError>;

    fn process_mass_upload(&self, csv_content: &str) -> Result<UploadResult, BackendError>;

    fn csv_template(&self) -> Result<String, BackendError>;

    fn checklist_items(
        &self,
        record_id: &str,
        object_name: &str,
    ) -> Result<Vec<ChecklistItem>, BackendError>;

    fn completed_checklist_actions(
        &self,
        record_id: &str,
    ) -> Result<Vec<CompletedAction>, BackendError>;

    fn create_checklist_action(
        &self,
        checklist_item_id: &str,
        record_id: &str,
        object_name: &str,
    ) -> Result<(), BackendError>;
}
