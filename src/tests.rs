use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::domain::entities::checklist::{gate_rows, ChecklistItem, CompletedAction};
use crate::domain::entities::draft::{DraftError, NEW_ADJUSTMENT_KEY};
use crate::domain::entities::forecast::{
    map_to_points, revenue_series, ApprovalStatus, FulfillmentMethod, MonthMap, ProductInfo,
    VolumeUnit,
};
use crate::domain::entities::panel::MethodPanel;
use crate::domain::numbers::{
    convert_quantity, format_grouped, is_chronological, parse_quantity, round2,
};
use crate::infra::import::csv::{is_valid_record_id, parse_csv, parse_upload_csv, UPLOAD_COLUMNS};
use crate::infra::import::file_check::{
    format_file_size, validate_file, CandidateFile, FileCheckPolicy,
};
use crate::usecase::ports::backend::{
    BackendError, CsvValidation, ErrorBody, ErrorDetail, FetchForecastRequest, ForecastBackend,
    ForecastSnapshot, ProductListRequest, ProductListResult, UploadResult,
    UpsertAdjustmentRequest, UpsertBaseForecastRequest,
};
use crate::usecase::services::checklist_service::ChecklistService;
use crate::usecase::services::forecast_service::{ForecastContext, ForecastService};
use crate::usecase::services::upload_service::UploadService;

const ACCOUNT_ID: &str = "001000000000001";
const PRODUCT_ID: &str = "01t000000000001";

fn month_map(pairs: &[(&str, serde_json::Value)]) -> MonthMap {
    pairs
        .iter()
        .map(|(month, value)| (month.to_string(), value.clone()))
        .collect()
}

fn sample_snapshot() -> ForecastSnapshot {
    ForecastSnapshot {
        product_info: ProductInfo {
            record_id: PRODUCT_ID.to_string(),
            name: "Widget".to_string(),
            unit_price: Some(2.0),
            uom: 6.0,
            currency_code: Some("USD".to_string()),
        },
        direct_enabled: true,
        local_enabled: false,
        date_range: vec!["Jan-25".to_string(), "Feb-25".to_string()],
        base_direct_map: month_map(&[("Jan-25", json!(10)), ("Feb-25", json!(12))]),
        base_local_map: MonthMap::new(),
        direct_adjustment_entries: vec![serde_json::from_value(json!({
            "recordId": "adj1",
            "name": "Promo",
            "comment": "spring push",
            "forecastNumbers": { "Jan-25": 5, "Feb-25": 0 }
        }))
        .expect("adjustment entry fixture should deserialize")],
        local_adjustment_entries: Vec::new(),
        direct_opps_entries: vec![serde_json::from_value(json!({
            "recordId": "opp1",
            "opportunityId": "006000000000001",
            "name": "Big Deal",
            "approved": true,
            "rejected": false,
            "pending": false,
            "forecastNumbers": { "Jan-25": 3 }
        }))
        .expect("opportunity entry fixture should deserialize")],
        local_opps_entries: Vec::new(),
        previous_year_orders_map: MonthMap::new(),
        current_year_orders_map: MonthMap::new(),
        opportunities_total_direct_map: MonthMap::new(),
        adjustments_total_direct_map: MonthMap::new(),
        forecast_total_direct_map: month_map(&[("Jan-25", json!(18))]),
        opportunities_total_local_map: MonthMap::new(),
        adjustments_total_local_map: MonthMap::new(),
        forecast_total_local_map: MonthMap::new(),
        base_summary_map: MonthMap::new(),
        opportunities_summary_map: MonthMap::new(),
        adjustments_summary_map: MonthMap::new(),
        forecast_summary_map: MonthMap::new(),
        warehouse: None,
    }
}

fn sample_context() -> ForecastContext {
    ForecastContext {
        account_id: ACCOUNT_ID.to_string(),
        product_id: PRODUCT_ID.to_string(),
        volume: VolumeUnit::Pieces,
        direct: true,
    }
}

#[derive(Default)]
struct FakeBackend {
    snapshot: Mutex<Option<ForecastSnapshot>>,
    fail_upsert: Mutex<bool>,
    fail_fetch: Mutex<bool>,
    upserted_adjustments: Mutex<Vec<UpsertAdjustmentRequest>>,
    upserted_base: Mutex<Vec<UpsertBaseForecastRequest>>,
    items: Mutex<Vec<ChecklistItem>>,
    completed: Mutex<Vec<CompletedAction>>,
    created_actions: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with_snapshot(snapshot: ForecastSnapshot) -> Self {
        let backend = Self::default();
        *backend.snapshot.lock().unwrap() = Some(snapshot);
        backend
    }

    fn set_fail_upsert(&self, fail: bool) {
        *self.fail_upsert.lock().unwrap() = fail;
    }

    fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }
}

impl ForecastBackend for FakeBackend {
    fn fetch_forecast(
        &self,
        _request: FetchForecastRequest,
    ) -> Result<ForecastSnapshot, BackendError> {
        if *self.fail_fetch.lock().unwrap() {
            return Err(BackendError::Transport("fetch unavailable".to_string()));
        }
        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::message("no snapshot configured"))
    }

    fn upsert_base_forecast(&self, request: UpsertBaseForecastRequest) -> Result<(), BackendError> {
        if *self.fail_upsert.lock().unwrap() {
            return Err(BackendError::message("base upsert rejected"));
        }
        self.upserted_base.lock().unwrap().push(request);
        Ok(())
    }

    fn upsert_adjustment(&self, request: UpsertAdjustmentRequest) -> Result<(), BackendError> {
        if *self.fail_upsert.lock().unwrap() {
            return Err(BackendError::message("adjustment upsert rejected"));
        }
        self.upserted_adjustments.lock().unwrap().push(request);
        Ok(())
    }

    fn set_fulfillment_method(
        &self,
        _account_id: &str,
        _product_id: &str,
        _method: FulfillmentMethod,
        _enabled: bool,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn disable_product(
        &self,
        _account_id: &str,
        _product_id: &str,
        _direct: bool,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn deactivate_adjustment(&self, _adjustment_id: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_opportunity_approval(
        &self,
        _opportunity_forecast_id: &str,
        _status: ApprovalStatus,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn update_warehouse(
        &self,
        _account_id: &str,
        _product_id: &str,
        _warehouse_id: Option<&str>,
        _direct: bool,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn update_price(
        &self,
        _account_id: &str,
        _product_id: &str,
        _price: f64,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn list_product_forecasts(
        &self,
        _request: ProductListRequest,
    ) -> Result<ProductListResult, BackendError> {
        Ok(ProductListResult {
            products: Vec::new(),
            has_more: false,
        })
    }

    fn validate_csv(&self, _csv_content: &str) -> Result<CsvValidation, BackendError> {
        Ok(CsvValidation {
            valid: true,
            row_count: 0,
            error: None,
        })
    }

    fn process_mass_upload(&self, _csv_content: &str) -> Result<UploadResult, BackendError> {
        Err(BackendError::message("upload not configured"))
    }

    fn csv_template(&self) -> Result<String, BackendError> {
        Ok(UPLOAD_COLUMNS.join(","))
    }

    fn checklist_items(
        &self,
        _record_id: &str,
        _object_name: &str,
    ) -> Result<Vec<ChecklistItem>, BackendError> {
        Ok(self.items.lock().unwrap().clone())
    }

    fn completed_checklist_actions(
        &self,
        _record_id: &str,
    ) -> Result<Vec<CompletedAction>, BackendError> {
        Ok(self.completed.lock().unwrap().clone())
    }

    fn create_checklist_action(
        &self,
        checklist_item_id: &str,
        _record_id: &str,
        _object_name: &str,
    ) -> Result<(), BackendError> {
        self.created_actions
            .lock()
            .unwrap()
            .push(checklist_item_id.to_string());
        Ok(())
    }
}

#[test]
fn parse_csv_rejects_empty_content() {
    let err = parse_csv("   \n  ", &["A"]).expect_err("empty content should fail");
    assert_eq!(err.to_string(), "CSV content is empty");
}

#[test]
fn parse_csv_requires_header_and_data_row() {
    let err = parse_csv("A,B,C\n", &["A"]).expect_err("header-only content should fail");
    assert_eq!(
        err.to_string(),
        "CSV must contain headers and at least one data row"
    );
}

#[test]
fn parse_csv_reports_missing_required_column() {
    let content = "AccountId,Month,Quantity\n001000000000001,01/01/2025,5\n";
    let err = parse_upload_csv(content).expect_err("missing column should fail");
    assert_eq!(err.to_string(), "Missing required column: ProductId");
}

#[test]
fn parse_csv_skips_mismatched_rows_and_keeps_line_numbers() {
    let content = "A,B,C,D\n1,2,3\n1,2,3,4\n";
    let outcome = parse_csv(content, &["A"]).expect("parse should succeed");

    assert_eq!(
        outcome.errors,
        vec!["Row 2: Column count mismatch (expected 4, got 3)".to_string()]
    );
    assert_eq!(outcome.row_count, 1, "good row should survive the skip");
    assert_eq!(outcome.data[0].line, 3, "line numbering should not shift");
    assert_eq!(outcome.data[0].get("D"), Some("4"));
}

#[test]
fn upload_rows_flag_format_violations() {
    let content = "AccountId,ProductId,Month,Quantity\nshort,01t000000000001,2025-01-01,-5\n";
    let outcome = parse_upload_csv(content).expect("parse should succeed");

    assert!(outcome
        .errors
        .contains(&"Row 2: AccountId must be a 15 or 18 character record id".to_string()));
    assert!(outcome
        .errors
        .contains(&"Row 2: Month must use MM/DD/YYYY format".to_string()));
    assert!(outcome
        .errors
        .contains(&"Row 2: Quantity must not be negative".to_string()));
}

#[test]
fn upload_rows_accept_wellformed_template_content() {
    let content = format!(
        "{}\n001000000000001,01t000000000001,01/15/2025,\"1,200\",9.5,true,false,WH-1\n",
        UPLOAD_COLUMNS.join(",")
    );
    let outcome = parse_upload_csv(&content).expect("parse should succeed");

    assert!(outcome.errors.is_empty(), "unexpected: {:?}", outcome.errors);
    assert_eq!(outcome.row_count, 1);
    assert_eq!(outcome.data[0].get("Warehouse"), Some("WH-1"));
}

#[test]
fn record_id_accepts_only_crm_id_lengths() {
    assert!(is_valid_record_id("001000000000001"));
    assert!(is_valid_record_id("001000000000001AAA"));
    assert!(!is_valid_record_id("0010000000000012"));
    assert!(!is_valid_record_id("001-0000000-0001"));
}

#[test]
fn file_validator_rejects_oversized_files() {
    let file = CandidateFile {
        name: "big.csv".to_string(),
        size: 6 * 1024 * 1024,
        mime_type: "text/csv".to_string(),
    };
    let check = validate_file(&file, &FileCheckPolicy::default());

    assert!(!check.valid);
    assert_eq!(
        check.errors,
        vec!["File size (6 MB) exceeds maximum allowed size (5 MB)".to_string()]
    );
}

#[test]
fn file_validator_accepts_csv_extension_with_blank_mime() {
    let file = CandidateFile {
        name: "Upload.CSV".to_string(),
        size: 1024,
        mime_type: String::new(),
    };
    let check = validate_file(&file, &FileCheckPolicy::default());

    assert!(check.valid, "extension alone should pass: {:?}", check.errors);
}

#[test]
fn file_validator_rejects_disallowed_type_and_extension() {
    let file = CandidateFile {
        name: "notes.txt".to_string(),
        size: 10,
        mime_type: "text/plain".to_string(),
    };
    let check = validate_file(&file, &FileCheckPolicy::default());

    assert!(!check.valid);
    assert_eq!(
        check.errors,
        vec!["Invalid file type. Allowed types: .csv".to_string()]
    );
}

#[test]
fn file_size_formatting_uses_1024_base() {
    assert_eq!(format_file_size(0), "0 Bytes");
    assert_eq!(format_file_size(512), "512 Bytes");
    assert_eq!(format_file_size(1024), "1 KB");
    assert_eq!(format_file_size(1_572_864), "1.5 MB");
}

#[test]
fn quantity_parsing_strips_grouping_and_zeroes_garbage() {
    assert_eq!(parse_quantity("1,234"), 1234.0);
    assert_eq!(parse_quantity("  42.5 "), 42.5);
    assert_eq!(parse_quantity("abc"), 0.0);
}

#[test]
fn grouped_formatting_inserts_thousands_separators() {
    assert_eq!(format_grouped(1234567.0), "1,234,567");
    assert_eq!(format_grouped(1234.5), "1,234.5");
    assert_eq!(format_grouped(-1000.0), "-1,000");
    assert_eq!(format_grouped(0.0), "0");
}

#[test]
fn quantity_conversion_round_trips_within_truncation() {
    let cases = convert_quantity("12", 6.0, VolumeUnit::Cases);
    assert_eq!(cases, "2.00");
    assert_eq!(convert_quantity(&cases, 6.0, VolumeUnit::Pieces), "12");

    // uneven quantities truncate on the way back to pieces
    let uneven = convert_quantity("13", 6.0, VolumeUnit::Cases);
    assert_eq!(uneven, "2.17");
    assert_eq!(convert_quantity(&uneven, 6.0, VolumeUnit::Pieces), "13");
}

#[test]
fn round2_keeps_two_decimals() {
    assert_eq!(round2(1.239), 1.24);
    assert_eq!(round2(2468.0), 2468.0);
}

#[test]
fn chronology_check_parses_month_year_labels() {
    let ordered: Vec<String> = ["Nov-24", "Dec-24", "Jan-25", "Feb-25"]
        .iter()
        .map(|label| label.to_string())
        .collect();
    assert!(is_chronological(&ordered));

    let swapped: Vec<String> = ["Jan-25", "Dec-24"]
        .iter()
        .map(|label| label.to_string())
        .collect();
    assert!(!is_chronological(&swapped));

    // labels that do not parse are skipped rather than failing the check
    let with_junk: Vec<String> = ["Jan-25", "Total", "Feb-25"]
        .iter()
        .map(|label| label.to_string())
        .collect();
    assert!(is_chronological(&with_junk));
}

#[test]
fn revenue_series_multiplies_cleaned_quantities() {
    let map = month_map(&[("Jan-25", json!("1,234")), ("Feb-25", json!("abc"))]);
    let series = revenue_series(&map, Some(2.0));

    assert_eq!(series[0].month, "Jan-25");
    assert_eq!(series[0].value, 2468.0);
    assert_eq!(series[1].value, 0.0, "unparseable quantity counts as zero");

    let without_price = revenue_series(&map, None);
    assert_eq!(without_price[0].value, 0.0);
}

#[test]
fn map_to_points_keeps_server_key_order() {
    let map = month_map(&[("Feb-25", json!(2000)), ("Jan-25", json!(1000))]);
    let points = map_to_points(&map);

    assert_eq!(points[0].month, "Feb-25");
    assert_eq!(points[0].value, "2,000");
    assert_eq!(points[1].month, "Jan-25");
}

#[test]
fn draft_edits_require_edit_mode() {
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);

    let err = panel
        .session
        .set_quantity("adj1", "Jan-25", "7")
        .expect_err("edit without begin should fail");
    assert_eq!(err, DraftError::NotEditing("adj1".to_string()));

    let err = panel
        .session
        .set_base_quantity("Jan-25", "7")
        .expect_err("base edit without begin should fail");
    assert_eq!(err, DraftError::BaseNotEditing);
}

#[test]
fn draft_coerces_cleared_quantities_to_zero() {
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.session.open_new_adjustment();

    panel
        .session
        .set_quantity(NEW_ADJUSTMENT_KEY, "Jan-25", "   ")
        .expect("draft exists");

    assert_eq!(panel.session.quantity(NEW_ADJUSTMENT_KEY, "Jan-25"), Some("0"));
}

#[test]
fn panel_overlays_draft_quantities_until_cancel() {
    let snapshot = sample_snapshot();
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.refresh(
        &snapshot.base_direct_map,
        &snapshot.direct_adjustment_entries,
        &snapshot.direct_opps_entries,
        None,
    );

    assert_eq!(panel.display_quantity("adj1", "Jan-25"), "5");

    panel.begin_adjustment_edit("adj1");
    panel
        .session
        .set_quantity("adj1", "Jan-25", "7")
        .expect("row is editing");
    assert_eq!(panel.display_quantity("adj1", "Jan-25"), "7");
    assert!(panel.adjustments[0].editing);

    panel.cancel_adjustment_edit("adj1");
    assert_eq!(
        panel.display_quantity("adj1", "Jan-25"),
        "5",
        "cancel should fall back to the server value"
    );
    assert!(!panel.adjustments[0].editing);
}

#[test]
fn panel_seeds_opportunity_options_from_approved_rows() {
    let snapshot = sample_snapshot();
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.refresh(
        &snapshot.base_direct_map,
        &snapshot.direct_adjustment_entries,
        &snapshot.direct_opps_entries,
        None,
    );

    assert_eq!(panel.opportunity_options.len(), 2);
    assert_eq!(panel.opportunity_options[0].value, "-");
    assert_eq!(panel.opportunity_options[0].label, "--None--");
    assert_eq!(panel.opportunity_options[1].value, "opp1");
}

#[test]
fn panel_row_span_counts_forms_and_edit_rows() {
    let snapshot = sample_snapshot();
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.refresh(
        &snapshot.base_direct_map,
        &snapshot.direct_adjustment_entries,
        &snapshot.direct_opps_entries,
        None,
    );

    // 4 fixed rows, one adjustment, one visible opportunity
    assert_eq!(panel.row_span(), 6);

    panel.session.open_new_adjustment();
    assert_eq!(panel.row_span(), 7, "new form adds one row");

    panel.begin_adjustment_edit("adj1");
    assert_eq!(panel.row_span(), 8, "edit mode adds one row per adjustment");
}

#[test]
fn draft_rescale_converts_inflight_quantities() {
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.session.open_new_adjustment();
    panel
        .session
        .set_quantity(NEW_ADJUSTMENT_KEY, "Jan-25", "12")
        .expect("draft exists");
    panel.session.begin_base();
    panel
        .session
        .set_base_quantity("Jan-25", "24")
        .expect("base is editing");

    panel.session.rescale(6.0, VolumeUnit::Cases);

    assert_eq!(
        panel.session.quantity(NEW_ADJUSTMENT_KEY, "Jan-25"),
        Some("2.00")
    );
    assert_eq!(panel.session.base_quantity("Jan-25"), Some("4.00"));
}

#[test]
fn failed_adjustment_save_retains_draft() {
    let backend = Arc::new(FakeBackend::with_snapshot(sample_snapshot()));
    let service = ForecastService::new(backend.clone());
    let ctx = sample_context();

    let snapshot = sample_snapshot();
    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.refresh(
        &snapshot.base_direct_map,
        &snapshot.direct_adjustment_entries,
        &snapshot.direct_opps_entries,
        None,
    );
    panel.begin_adjustment_edit("adj1");
    panel
        .session
        .set_quantity("adj1", "Jan-25", "7")
        .expect("row is editing");

    backend.set_fail_upsert(true);
    let err = service
        .save_adjustment(&ctx, &mut panel, "adj1", 6.0)
        .expect_err("rejected upsert should fail the save");
    assert_eq!(err.user_message(), "adjustment upsert rejected");
    assert!(
        panel.session.is_editing("adj1"),
        "draft must survive a failed upsert"
    );
    assert_eq!(panel.display_quantity("adj1", "Jan-25"), "7");

    backend.set_fail_upsert(false);
    backend.set_fail_fetch(true);
    service
        .save_adjustment(&ctx, &mut panel, "adj1", 6.0)
        .expect_err("failed refetch should fail the save");
    assert!(
        panel.session.is_editing("adj1"),
        "draft must survive until the refetch confirms"
    );

    backend.set_fail_fetch(false);
    let refreshed = service
        .save_adjustment(&ctx, &mut panel, "adj1", 6.0)
        .expect("save should succeed once upsert and refetch both pass");
    assert!(!panel.session.is_editing("adj1"));
    assert_eq!(refreshed.product_info.record_id, PRODUCT_ID);

    let upserts = backend.upserted_adjustments.lock().unwrap();
    let last = upserts.last().expect("upsert request recorded");
    assert_eq!(last.adjustment_id, "adj1");
    assert_eq!(last.entries[0].external_id, "Jan-25");
    assert_eq!(last.entries[0].quantity, "7");
    assert_eq!(last.entries[0].fulfillment, FulfillmentMethod::Direct);
}

#[test]
fn base_save_clears_session_after_refetch() {
    let backend = Arc::new(FakeBackend::with_snapshot(sample_snapshot()));
    let service = ForecastService::new(backend.clone());
    let ctx = sample_context();

    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    panel.session.begin_base();
    panel
        .session
        .set_base_quantity("Jan-25", "9")
        .expect("base is editing");

    service
        .save_base(&ctx, &mut panel, 6.0)
        .expect("base save should succeed");

    assert!(!panel.session.base_editing());
    assert!(panel.session.base_entries().is_empty());

    let upserts = backend.upserted_base.lock().unwrap();
    assert_eq!(upserts[0].entries[0].quantity, "9");
    assert!(upserts[0].direct);
}

#[test]
fn save_without_draft_is_rejected() {
    let backend = Arc::new(FakeBackend::with_snapshot(sample_snapshot()));
    let service = ForecastService::new(backend);
    let ctx = sample_context();

    let mut panel = MethodPanel::new(FulfillmentMethod::Direct);
    let err = service
        .save_adjustment(&ctx, &mut panel, "adj1", 6.0)
        .expect_err("save without a draft should fail");
    assert!(err.user_message().contains("no pending edit"));
}

fn checklist_items_fixture() -> Vec<ChecklistItem> {
    vec![
        ChecklistItem {
            record_id: "c2".to_string(),
            label: "Review pricing".to_string(),
            order: 2,
        },
        ChecklistItem {
            record_id: "c1".to_string(),
            label: "Confirm volumes".to_string(),
            order: 1,
        },
        ChecklistItem {
            record_id: "c3".to_string(),
            label: "Submit forecast".to_string(),
            order: 3,
        },
    ]
}

#[test]
fn checklist_gate_unlocks_sequentially() {
    let rows = gate_rows(checklist_items_fixture(), &HashSet::new());

    assert_eq!(rows[0].item.record_id, "c1", "rows sort by order");
    assert!(rows[0].is_selectable && !rows[0].is_disabled);
    assert!(rows[1].is_disabled, "second item locked until first done");
    assert!(rows[2].is_disabled);
}

#[test]
fn checklist_gate_respects_completed_actions() {
    let completed: HashSet<String> = ["c1".to_string()].into_iter().collect();
    let rows = gate_rows(checklist_items_fixture(), &completed);

    assert!(rows[0].is_completed);
    assert!(rows[0].is_disabled, "completed rows are not clickable");
    assert!(rows[1].is_selectable && !rows[1].is_disabled);
    assert!(rows[2].is_disabled);
}

#[test]
fn checklist_completion_records_action_and_regates() {
    let backend = Arc::new(FakeBackend::default());
    *backend.items.lock().unwrap() = checklist_items_fixture();
    let service = ChecklistService::new(backend.clone());

    let mut rows = service.load("a00000000000001", "Tender").expect("load");
    let label = service
        .complete(&mut rows, "c1", "a00000000000001", "Tender")
        .expect("first item should complete");

    assert_eq!(label, "Confirm volumes");
    assert!(rows[0].is_completed);
    assert!(rows[1].is_selectable, "completion unlocks the next item");
    assert_eq!(
        backend.created_actions.lock().unwrap().as_slice(),
        ["c1".to_string()]
    );
}

#[test]
fn checklist_completion_rejects_locked_items() {
    let backend = Arc::new(FakeBackend::default());
    *backend.items.lock().unwrap() = checklist_items_fixture();
    let service = ChecklistService::new(backend.clone());

    let mut rows = service.load("a00000000000001", "Tender").expect("load");
    let err = service
        .complete(&mut rows, "c3", "a00000000000001", "Tender")
        .expect_err("locked item should be rejected");

    assert!(err.user_message().contains("not selectable"));
    assert!(
        backend.created_actions.lock().unwrap().is_empty(),
        "no action may be recorded for a locked item"
    );
}

#[test]
fn error_messages_extract_in_priority_order() {
    let direct = BackendError::Rpc(ErrorBody {
        message: Some("top level".to_string()),
        page_errors: vec![ErrorDetail {
            message: "page".to_string(),
        }],
        field_errors: Default::default(),
    });
    assert_eq!(direct.user_message(), "top level");

    let page = BackendError::Rpc(ErrorBody {
        message: None,
        page_errors: vec![ErrorDetail {
            message: "page".to_string(),
        }],
        field_errors: Default::default(),
    });
    assert_eq!(page.user_message(), "page");

    let mut field_errors = std::collections::BTreeMap::new();
    field_errors.insert(
        "Quantity".to_string(),
        vec![ErrorDetail {
            message: "field".to_string(),
        }],
    );
    let field = BackendError::Rpc(ErrorBody {
        message: None,
        page_errors: Vec::new(),
        field_errors,
    });
    assert_eq!(field.user_message(), "field");

    let fallback = BackendError::Rpc(ErrorBody::default());
    assert!(fallback.user_message().contains("ErrorBody"));

    let transport = BackendError::Transport("socket closed".to_string());
    assert_eq!(transport.user_message(), "socket closed");
}

#[test]
fn failed_upload_result_mirrors_server_shape() {
    let result = UploadService::failed_upload_result("backend down");

    assert!(!result.success);
    assert_eq!(result.message, "Upload failed with error");
    assert_eq!(result.errors, vec!["backend down".to_string()]);
    assert_eq!(result.total_rows, 0);
}

#[test]
fn chronology_warning_does_not_block_fetch() {
    let mut snapshot = sample_snapshot();
    snapshot.date_range = vec!["Feb-25".to_string(), "Jan-25".to_string()];
    let backend = Arc::new(FakeBackend::with_snapshot(snapshot));
    let service = ForecastService::new(backend);

    let fetched = service
        .fetch(&sample_context())
        .expect("out-of-order months are logged, not fatal");
    assert_eq!(fetched.date_range[0], "Feb-25");
}
