use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::checklist::{ChecklistItem, CompletedAction};
use crate::domain::entities::forecast::{ApprovalStatus, FulfillmentMethod};
use crate::usecase::ports::backend::{
    BackendError, CsvValidation, ErrorBody, FetchForecastRequest, ForecastBackend,
    ForecastSnapshot, ProductListRequest, ProductListResult, UploadResult,
    UpsertAdjustmentRequest, UpsertBaseForecastRequest,
};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC style backend client: every operation is a POST of a JSON
/// argument record to `{base_url}/rpc/{operation}`.
pub struct HttpForecastBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpForecastBackend {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .map_err(|err| BackendError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn execute<R>(
        &self,
        operation: &str,
        request: &R,
    ) -> Result<reqwest::blocking::Response, BackendError>
    where
        R: Serialize + ?Sized,
    {
        let url = format!("{}/rpc/{operation}", self.base_url);
        let mut builder = self.client.post(&url).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().map_err(|err| {
            if err.is_timeout() {
                BackendError::Transport(format!("{operation} timed out"))
            } else if err.is_connect() {
                BackendError::Transport(format!("failed to reach backend for {operation}: {err}"))
            } else {
                BackendError::Transport(format!("{operation} failed: {err}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            // structured error bodies become Rpc errors, anything else stays a
            // transport error with the status attached
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body)
                    if body.message.is_some()
                        || !body.page_errors.is_empty()
                        || !body.field_errors.is_empty() =>
                {
                    BackendError::Rpc(body)
                }
                _ => BackendError::Transport(format!(
                    "{operation} returned HTTP {}: {text}",
                    status.as_u16()
                )),
            });
        }

        Ok(response)
    }

    fn call<R, T>(&self, operation: &str, request: &R) -> Result<T, BackendError>
    where
        R: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(operation, request)?;
        response.json::<T>().map_err(|err| {
            BackendError::Transport(format!("failed to decode {operation} response: {err}"))
        })
    }

    fn call_unit<R>(&self, operation: &str, request: &R) -> Result<(), BackendError>
    where
        R: Serialize + ?Sized,
    {
        self.execute(operation, request).map(|_| ())
    }
}

impl ForecastBackend for HttpForecastBackend {
    fn fetch_forecast(
        &self,
        request: FetchForecastRequest,
    ) -> Result<ForecastSnapshot, BackendError> {
        self.call("getForecastDetails", &request)
    }

    fn upsert_base_forecast(
        &self,
        request: UpsertBaseForecastRequest,
    ) -> Result<(), BackendError> {
        self.call_unit("upsertBaseForecast", &request)
    }

    fn upsert_adjustment(&self, request: UpsertAdjustmentRequest) -> Result<(), BackendError> {
        self.call_unit("upsertAdjustment", &request)
    }

    fn set_fulfillment_method(
        &self,
        account_id: &str,
        product_id: &str,
        method: FulfillmentMethod,
        enabled: bool,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "setFulfillmentMethod",
            &json!({
                "accountId": account_id,
                "productId": product_id,
                "method": method,
                "enabled": enabled,
            }),
        )
    }

    fn disable_product(
        &self,
        account_id: &str,
        product_id: &str,
        direct: bool,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "disableProduct",
            &json!({
                "accountId": account_id,
                "productId": product_id,
                "direct": direct,
            }),
        )
    }

    fn deactivate_adjustment(&self, adjustment_id: &str) -> Result<(), BackendError> {
        self.call_unit(
            "deactivateAdjustment",
            &json!({ "adjustmentId": adjustment_id }),
        )
    }

    fn set_opportunity_approval(
        &self,
        opportunity_forecast_id: &str,
        status: ApprovalStatus,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "setOpportunityApproval",
            &json!({
                "opportunityForecastId": opportunity_forecast_id,
                "status": status,
            }),
        )
    }

    fn update_warehouse(
        &self,
        account_id: &str,
        product_id: &str,
        warehouse_id: Option<&str>,
        direct: bool,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "updateWarehouse",
            &json!({
                "accountId": account_id,
                "productId": product_id,
                "warehouseId": warehouse_id,
                "direct": direct,
            }),
        )
    }

    fn update_price(
        &self,
        account_id: &str,
        product_id: &str,
        price: f64,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "updatePrice",
            &json!({
                "accountId": account_id,
                "productId": product_id,
                "price": price,
            }),
        )
    }

    fn list_product_forecasts(
        &self,
        request: ProductListRequest,
    ) -> Result<ProductListResult, BackendError> {
        self.call("listProductForecasts", &request)
    }

    fn validate_csv(&self, csv_content: &str) -> Result<CsvValidation, BackendError> {
        self.call("validateCsv", &json!({ "csvContent": csv_content }))
    }

    fn process_mass_upload(&self, csv_content: &str) -> Result<UploadResult, BackendError> {
        self.call("processMassUpload", &json!({ "csvContent": csv_content }))
    }

    fn csv_template(&self) -> Result<String, BackendError> {
        self.call("getCsvTemplate", &json!({}))
    }

    fn checklist_items(
        &self,
        record_id: &str,
        object_name: &str,
    ) -> Result<Vec<ChecklistItem>, BackendError> {
        self.call(
            "getChecklistItems",
            &json!({ "recordId": record_id, "objectName": object_name }),
        )
    }

    fn completed_checklist_actions(
        &self,
        record_id: &str,
    ) -> Result<Vec<CompletedAction>, BackendError> {
        self.call(
            "getCompletedChecklistActions",
            &json!({ "recordId": record_id }),
        )
    }

    fn create_checklist_action(
        &self,
        checklist_item_id: &str,
        record_id: &str,
        object_name: &str,
    ) -> Result<(), BackendError> {
        self.call_unit(
            "createChecklistAction",
            &json!({
                "checklistItemId": checklist_item_id,
                "recordId": record_id,
                "objectName": object_name,
            }),
        )
    }
}
