use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::prelude::*;
use log::{info, warn};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::domain::entities::draft::{DraftAdjustment, NEW_ADJUSTMENT_KEY};
use crate::domain::entities::forecast::{
    ApprovalStatus, FulfillmentMethod, MonthlyAmount, MonthlyPoint, VolumeUnit,
};
use crate::domain::entities::panel::{MethodPanel, OpportunityOption};
use crate::infra::config::load_config;
use crate::infra::http::backend::HttpForecastBackend;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::{AppState, Screen};
use crate::usecase::ports::backend::{ForecastSnapshot, ProductListRequest};
use crate::usecase::ports::notify::{Notification, NotificationSink, Severity};
use crate::usecase::services::checklist_service::ChecklistService;
use crate::usecase::services::forecast_service::{ForecastContext, ForecastService};
use crate::usecase::services::upload_service::UploadService;
use crate::{table_cell_style, table_container_style, table_header_cell_style};

/// Notification sink backed by the app's signals: every report lands in the
/// notice stack and the latest one doubles as the status line.
#[derive(Clone, Copy)]
struct StatusSink {
    notices: Signal<Vec<Notification>>,
    status: Signal<String>,
}

impl NotificationSink for StatusSink {
    fn notify(&self, notification: Notification) {
        info!(
            "[{:?}] {}: {}",
            notification.severity, notification.title, notification.message
        );
        let mut notices = self.notices;
        let mut status = self.status;
        *status.write() = format!("{}: {}", notification.title, notification.message);
        notices.write().push(notification);
        if notices.peek().len() > 6 {
            notices.write().remove(0);
        }
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "#2f9e44",
        Severity::Info => "#4c6ef5",
        Severity::Warning => "#e8930c",
        Severity::Error => "#d6336c",
    }
}

fn point_value(points: &[MonthlyPoint], month: &str) -> String {
    points
        .iter()
        .find(|point| point.month == month)
        .map(|point| point.value.clone())
        .unwrap_or_default()
}

fn amount_value(points: &[MonthlyAmount], month: &str) -> String {
    points
        .iter()
        .find(|point| point.month == month)
        .map(|point| format!("{:.2}", point.value))
        .unwrap_or_default()
}

#[component]
fn SeriesRow(label: String, months: Vec<String>, points: Vec<MonthlyPoint>) -> Element {
    rsx! {
        tr {
            td { style: "{table_cell_style()} font-weight: 600;", "{label}" }
            {months.iter().map(|month| {
                let value = point_value(&points, month);
                rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
            })}
        }
    }
}

#[component]
fn AmountRow(label: String, months: Vec<String>, points: Vec<MonthlyAmount>) -> Element {
    rsx! {
        tr {
            td { style: "{table_cell_style()} font-weight: 600;", "{label}" }
            {months.iter().map(|month| {
                let value = amount_value(&points, month);
                rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
            })}
        }
    }
}

/// Inline edit row for an adjustment draft (existing or the new form).
fn adjustment_edit_row(
    mut panel: Signal<MethodPanel>,
    key: String,
    months: &[String],
    options: &[OpportunityOption],
    draft: DraftAdjustment,
    busy: Signal<bool>,
    on_save: EventHandler<String>,
) -> Element {
    let key_for_name = key.clone();
    let key_for_comment = key.clone();
    let key_for_select = key.clone();
    let key_for_save = key.clone();
    let key_for_cancel = key.clone();
    let draft_opportunity = draft.opportunity.clone();
    let options = options.to_vec();

    rsx! {
        tr {
            style: "background: #fdf6e3;",
            td { style: "{table_cell_style()}",
                div { style: "display: flex; flex-direction: column; gap: 4px;",
                    input {
                        placeholder: "Name",
                        value: "{draft.name}",
                        oninput: move |event| {
                            if let Err(err) = panel.write().session.set_name(&key_for_name, &event.value()) {
                                warn!("{err}");
                            }
                        }
                    }
                    input {
                        placeholder: "Comment",
                        value: "{draft.comment}",
                        oninput: move |event| {
                            if let Err(err) = panel.write().session.set_comment(&key_for_comment, &event.value()) {
                                warn!("{err}");
                            }
                        }
                    }
                    select {
                        onchange: move |event| {
                            if let Err(err) = panel.write().session.set_opportunity(&key_for_select, &event.value()) {
                                warn!("{err}");
                            }
                        },
                        {options.iter().map(|option| {
                            let is_selected = draft_opportunity.as_deref() == Some(option.value.as_str())
                                || (draft_opportunity.is_none() && option.value == "-");
                            rsx!(option {
                                value: "{option.value}",
                                selected: is_selected,
                                "{option.label}"
                            })
                        })}
                    }
                }
            }
            {months.iter().map(|month| {
                let month_for_input = month.clone();
                let key_for_input = key.clone();
                let value = panel.read().display_quantity(&key, month);
                rsx!(td { style: "{table_cell_style()}",
                    input {
                        style: "width: 72px; text-align: right;",
                        value: "{value}",
                        oninput: move |event| {
                            if let Err(err) = panel
                                .write()
                                .session
                                .set_quantity(&key_for_input, &month_for_input, &event.value())
                            {
                                warn!("{err}");
                            }
                        }
                    }
                })
            })}
            td { style: "{table_cell_style()} white-space: nowrap;",
                button {
                    disabled: busy(),
                    onclick: move |_| on_save.call(key_for_save.clone()),
                    "Save"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        panel.write().cancel_adjustment_edit(&key_for_cancel);
                    },
                    "Cancel"
                }
            }
        }
    }
}

/// One fulfillment method's table: the fixed rows, the adjustments with their
/// drafts, and the opportunity rows with approval actions.
#[component]
fn PanelSection(
    panel: Signal<MethodPanel>,
    months: Vec<String>,
    opportunities_total: Vec<MonthlyPoint>,
    adjustments_total: Vec<MonthlyPoint>,
    forecast_total: Vec<MonthlyPoint>,
    busy: Signal<bool>,
    on_save_adjustment: EventHandler<String>,
    on_save_base: EventHandler<()>,
    on_deactivate: EventHandler<String>,
    on_approval: EventHandler<(String, ApprovalStatus)>,
) -> Element {
    let mut panel = panel;
    let snapshot = panel.read().clone();
    let base_editing = snapshot.session.base_editing();
    let show_rejected = snapshot.show_rejected;

    rsx! {
        div {
            style: "border: 1px solid #ccc; border-radius: 8px; padding: 12px; margin-bottom: 16px; background: #fff;",
            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 8px;",
                h3 { style: "margin: 0;", "{snapshot.method.label()}" }
                if snapshot.has_rejected() {
                    label {
                        style: "display: flex; align-items: center; gap: 6px;",
                        input {
                            r#type: "checkbox",
                            checked: show_rejected,
                            onclick: move |_| {
                                let next = !panel.peek().show_rejected;
                                panel.write().set_show_rejected(next);
                            }
                        }
                        "Show rejected ({snapshot.rejected_count()})"
                    }
                }
            }

            div { style: "{table_container_style()}",
                table { style: "border-collapse: collapse; width: 100%;",
                    thead {
                        tr {
                            th { style: "{table_header_cell_style()}", "" }
                            {months.iter().map(|month| rsx!(
                                th { style: "{table_header_cell_style()}", "{month}" }
                            ))}
                            th { style: "{table_header_cell_style()}", "" }
                        }
                    }
                    tbody {
                        tr {
                            td { style: "{table_cell_style()} font-weight: 600;", "Base Forecast" }
                            {months.iter().map(|month| {
                                let month_for_input = month.clone();
                                let value = snapshot.display_base(month);
                                if base_editing {
                                    rsx!(td { style: "{table_cell_style()}",
                                        input {
                                            style: "width: 72px; text-align: right;",
                                            value: "{value}",
                                            oninput: move |event| {
                                                if let Err(err) = panel
                                                    .write()
                                                    .session
                                                    .set_base_quantity(&month_for_input, &event.value())
                                                {
                                                    warn!("{err}");
                                                }
                                            }
                                        }
                                    })
                                } else {
                                    rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
                                }
                            })}
                            td { style: "{table_cell_style()} white-space: nowrap;",
                                if base_editing {
                                    button {
                                        disabled: busy(),
                                        onclick: move |_| on_save_base.call(()),
                                        "Save"
                                    }
                                    button {
                                        disabled: busy(),
                                        onclick: move |_| {
                                            panel.write().session.cancel_base();
                                        },
                                        "Cancel"
                                    }
                                } else {
                                    button {
                                        disabled: busy(),
                                        onclick: move |_| {
                                            panel.write().session.begin_base();
                                        },
                                        "Edit"
                                    }
                                }
                            }
                        }

                        {snapshot.adjustments.iter().map(|row| {
                            let record_id = row.record_id.clone();
                            let record_id_for_edit = record_id.clone();
                            let record_id_for_deactivate = record_id.clone();
                            let label = match &row.opportunity_name {
                                Some(opportunity) => format!("{} ({opportunity})", row.name),
                                None => row.name.clone(),
                            };
                            let comment = row.comment.clone();
                            let entries = row.entries.clone();
                            let editing = row.editing;
                            let draft = snapshot.session.adjustment(&record_id).cloned();
                            rsx!(
                                tr {
                                    td { style: "{table_cell_style()}",
                                        div { "{label}" }
                                        if !comment.is_empty() {
                                            div { style: "color: #888; font-size: 12px;", "{comment}" }
                                        }
                                    }
                                    {months.iter().map(|month| {
                                        let value = point_value(&entries, month);
                                        rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
                                    })}
                                    td { style: "{table_cell_style()} white-space: nowrap;",
                                        if !editing {
                                            button {
                                                disabled: busy(),
                                                onclick: move |_| {
                                                    panel.write().begin_adjustment_edit(&record_id_for_edit);
                                                },
                                                "Edit"
                                            }
                                        }
                                        button {
                                            disabled: busy(),
                                            onclick: move |_| on_deactivate.call(record_id_for_deactivate.clone()),
                                            "Deactivate"
                                        }
                                    }
                                }
                                if let Some(draft) = draft {
                                    {adjustment_edit_row(
                                        panel,
                                        record_id.clone(),
                                        &months,
                                        &snapshot.opportunity_options,
                                        draft,
                                        busy,
                                        on_save_adjustment,
                                    )}
                                }
                            )
                        })}

                        if let Some(draft) = snapshot.session.adjustment(NEW_ADJUSTMENT_KEY).cloned() {
                            {adjustment_edit_row(
                                panel,
                                NEW_ADJUSTMENT_KEY.to_string(),
                                &months,
                                &snapshot.opportunity_options,
                                draft,
                                busy,
                                on_save_adjustment,
                            )}
                        }

                        {snapshot
                            .opportunities
                            .iter()
                            .filter(|row| row.visible(show_rejected))
                            .map(|row| {
                                let record_id = row.record_id.clone();
                                let record_id_for_approve = record_id.clone();
                                let record_id_for_reject = record_id;
                                let status_label = if row.approved {
                                    "Approved"
                                } else if row.rejected {
                                    "Rejected"
                                } else {
                                    "Pending"
                                };
                                let entries = row.entries.clone();
                                let name = row.name.clone();
                                let pending = row.pending;
                                rsx!(tr {
                                    td { style: "{table_cell_style()}",
                                        div { "{name}" }
                                        div { style: "color: #888; font-size: 12px;", "Opportunity · {status_label}" }
                                    }
                                    {months.iter().map(|month| {
                                        let value = point_value(&entries, month);
                                        rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
                                    })}
                                    td { style: "{table_cell_style()} white-space: nowrap;",
                                        if pending {
                                            button {
                                                disabled: busy(),
                                                onclick: move |_| on_approval.call((
                                                    record_id_for_approve.clone(),
                                                    ApprovalStatus::Approved,
                                                )),
                                                "Approve"
                                            }
                                            button {
                                                disabled: busy(),
                                                onclick: move |_| on_approval.call((
                                                    record_id_for_reject.clone(),
                                                    ApprovalStatus::Rejected,
                                                )),
                                                "Reject"
                                            }
                                        }
                                    }
                                })
                            })}

                        SeriesRow {
                            label: "Opportunities Total".to_string(),
                            months: months.clone(),
                            points: opportunities_total.clone(),
                        }
                        SeriesRow {
                            label: "Adjustments Total".to_string(),
                            months: months.clone(),
                            points: adjustments_total.clone(),
                        }
                        SeriesRow {
                            label: "Forecast Total".to_string(),
                            months: months.clone(),
                            points: forecast_total.clone(),
                        }
                    }
                }
            }

            if !snapshot.session.has_new_form() {
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        panel.write().session.open_new_adjustment();
                    },
                    "Add Adjustment"
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to load configuration: {err}" }
                }
            };
        }
    };

    let AppState {
        mut screen,
        mut products,
        mut has_more,
        mut page,
        mut search,
        mut selected,
        mut forecast,
        mut direct_panel,
        mut local_panel,
        mut volume,
        mut price_input,
        mut warehouse_input,
        mut busy,
        mut status,
        mut notices,
        mut upload_candidate,
        mut upload_content,
        mut upload_errors,
        mut upload_row_count,
        mut upload_validation,
        mut upload_result,
        mut checklist,
    } = AppState::new();

    let backend = match HttpForecastBackend::new(config.base_url.clone(), config.api_token.clone())
    {
        Ok(backend) => Arc::new(backend),
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to initialize backend client: {err}" }
                }
            };
        }
    };

    let forecast_service = Arc::new(ForecastService::new(backend.clone()));
    let upload_service = Arc::new(UploadService::new(backend.clone()));
    let checklist_service = Arc::new(ChecklistService::new(backend.clone()));

    let sink = StatusSink { notices, status };

    let account_id = Arc::new(config.account_id.clone());
    let checklist_record_id = Arc::new(config.checklist_record_id.clone());
    let checklist_object = Arc::new(config.checklist_object.clone());

    let forecast_service_for_list = forecast_service.clone();
    let account_for_list = account_id.clone();
    let load_products = Rc::new(RefCell::new(move |next_page: i64| {
        *busy.write() = true;
        let request = ProductListRequest {
            account_id: (*account_for_list).clone(),
            page: next_page,
            search: search.peek().clone(),
        };
        let service = forecast_service_for_list.clone();
        match run_blocking(move || service.list_products(request)) {
            Ok(result) => {
                *products.write() = result.rows;
                *has_more.write() = result.has_more;
                *page.write() = next_page;
                *status.write() = format!("Loaded page {next_page}");
            }
            Err(err) => sink.notify(Notification::error("Product list", err.user_message())),
        }
        *busy.write() = false;
    }));

    let apply_snapshot = Rc::new(RefCell::new(
        move |snapshot: ForecastSnapshot, rescale: Option<(f64, VolumeUnit)>| {
            let assembled = ForecastService::assemble(&snapshot);
            {
                let mut direct = direct_panel.write();
                let mut local = local_panel.write();
                ForecastService::refresh_panels(&snapshot, &mut direct, &mut local, rescale);
            }
            price_input.set(
                assembled
                    .product
                    .unit_price
                    .map(|price| price.to_string())
                    .unwrap_or_default(),
            );
            warehouse_input.set(
                assembled
                    .warehouse
                    .as_ref()
                    .map(|warehouse| warehouse.value.clone())
                    .unwrap_or_default(),
            );
            forecast.set(Some(assembled));
        },
    ));

    let forecast_service_for_refresh = forecast_service.clone();
    let apply_snapshot_for_refresh = apply_snapshot.clone();
    let refresh_detail = Rc::new(RefCell::new(move |rescale: Option<(f64, VolumeUnit)>| {
        let Some(ctx) = selected.peek().clone() else {
            return;
        };
        let service = forecast_service_for_refresh.clone();
        match run_blocking(move || service.fetch(&ctx)) {
            Ok(snapshot) => apply_snapshot_for_refresh.borrow_mut()(snapshot, rescale),
            Err(err) => sink.notify(Notification::error("Forecast", err.user_message())),
        }
    }));

    let forecast_service_for_save_adjustment = forecast_service.clone();
    let apply_snapshot_for_save_adjustment = apply_snapshot.clone();
    let save_adjustment = Rc::new(RefCell::new(
        move |method: FulfillmentMethod, adjustment_id: String| {
            let Some(ctx) = selected.peek().clone() else {
                return;
            };
            let uom = forecast
                .peek()
                .as_ref()
                .map(|assembled| assembled.product.uom)
                .unwrap_or(1.0);
            let mut panel_signal = match method {
                FulfillmentMethod::Direct => direct_panel,
                FulfillmentMethod::Local => local_panel,
            };

            *busy.write() = true;
            let result = {
                let mut panel = panel_signal.write();
                forecast_service_for_save_adjustment.save_adjustment(
                    &ctx,
                    &mut panel,
                    &adjustment_id,
                    uom,
                )
            };
            match result {
                Ok(snapshot) => {
                    apply_snapshot_for_save_adjustment.borrow_mut()(snapshot, None);
                    sink.notify(Notification::success("Forecast", "Adjustment saved"));
                }
                Err(err) => sink.notify(Notification::error("Save failed", err.user_message())),
            }
            *busy.write() = false;
        },
    ));

    let forecast_service_for_save_base = forecast_service.clone();
    let apply_snapshot_for_save_base = apply_snapshot.clone();
    let save_base = Rc::new(RefCell::new(move |method: FulfillmentMethod| {
        let Some(ctx) = selected.peek().clone() else {
            return;
        };
        let uom = forecast
            .peek()
            .as_ref()
            .map(|assembled| assembled.product.uom)
            .unwrap_or(1.0);
        let mut panel_signal = match method {
            FulfillmentMethod::Direct => direct_panel,
            FulfillmentMethod::Local => local_panel,
        };

        *busy.write() = true;
        let result = {
            let mut panel = panel_signal.write();
            forecast_service_for_save_base.save_base(&ctx, &mut panel, uom)
        };
        match result {
            Ok(snapshot) => {
                apply_snapshot_for_save_base.borrow_mut()(snapshot, None);
                sink.notify(Notification::success("Forecast", "Base forecast saved"));
            }
            Err(err) => sink.notify(Notification::error("Save failed", err.user_message())),
        }
        *busy.write() = false;
    }));

    let forecast_service_for_deactivate = forecast_service.clone();
    let refresh_detail_for_deactivate = refresh_detail.clone();
    let deactivate_adjustment = Rc::new(RefCell::new(move |adjustment_id: String| {
        let confirmed = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Deactivate adjustment")
            .set_description("The adjustment will stop counting toward the forecast totals.")
            .set_buttons(MessageButtons::YesNo)
            .show();
        if confirmed != MessageDialogResult::Yes {
            return;
        }

        *busy.write() = true;
        let service = forecast_service_for_deactivate.clone();
        let id = adjustment_id.clone();
        match run_blocking(move || service.deactivate_adjustment(&id)) {
            Ok(()) => {
                refresh_detail_for_deactivate.borrow_mut()(None);
                sink.notify(Notification::success("Forecast", "Adjustment deactivated"));
            }
            Err(err) => sink.notify(Notification::error("Deactivate failed", err.user_message())),
        }
        *busy.write() = false;
    }));

    let forecast_service_for_approval = forecast_service.clone();
    let refresh_detail_for_approval = refresh_detail.clone();
    let set_approval = Rc::new(RefCell::new(
        move |(record_id, approval): (String, ApprovalStatus)| {
            *busy.write() = true;
            let service = forecast_service_for_approval.clone();
            let id = record_id.clone();
            match run_blocking(move || service.set_opportunity_approval(&id, approval)) {
                Ok(()) => {
                    refresh_detail_for_approval.borrow_mut()(None);
                    sink.notify(Notification::success(
                        "Opportunity",
                        format!("Marked {}", approval.as_str()),
                    ));
                }
                Err(err) => sink.notify(Notification::error("Approval failed", err.user_message())),
            }
            *busy.write() = false;
        },
    ));

    let refresh_detail_for_volume = refresh_detail.clone();
    let switch_volume = Rc::new(RefCell::new(move |unit: VolumeUnit| {
        if *volume.peek() == unit {
            return;
        }
        volume.set(unit);
        let Some(mut ctx) = selected.peek().clone() else {
            return;
        };
        ctx.volume = unit;
        selected.set(Some(ctx));
        let uom = forecast
            .peek()
            .as_ref()
            .map(|assembled| assembled.product.uom)
            .unwrap_or(1.0);
        *busy.write() = true;
        refresh_detail_for_volume.borrow_mut()(Some((uom, unit)));
        *busy.write() = false;
    }));

    let forecast_service_for_method = forecast_service.clone();
    let refresh_detail_for_method = refresh_detail.clone();
    let toggle_method = Rc::new(RefCell::new(
        move |method: FulfillmentMethod, enabled: bool| {
            let Some(ctx) = selected.peek().clone() else {
                return;
            };
            *busy.write() = true;
            let service = forecast_service_for_method.clone();
            let ctx_for_call = ctx.clone();
            match run_blocking(move || {
                service.set_fulfillment_method(&ctx_for_call, method, enabled)
            }) {
                Ok(()) => {
                    if method == FulfillmentMethod::Direct {
                        let mut next = ctx;
                        next.direct = enabled;
                        selected.set(Some(next));
                    }
                    refresh_detail_for_method.borrow_mut()(None);
                    sink.notify(Notification::success(
                        "Forecast",
                        format!(
                            "{} {}",
                            method.label(),
                            if enabled { "enabled" } else { "disabled" }
                        ),
                    ));
                }
                Err(err) => sink.notify(Notification::error("Update failed", err.user_message())),
            }
            *busy.write() = false;
        },
    ));

    let forecast_service_for_disable = forecast_service.clone();
    let load_products_for_disable = load_products.clone();
    let disable_product = Rc::new(RefCell::new(move || {
        let Some(ctx) = selected.peek().clone() else {
            return;
        };
        let confirmed = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Remove product")
            .set_description("The product will be removed from the forecast.")
            .set_buttons(MessageButtons::YesNo)
            .show();
        if confirmed != MessageDialogResult::Yes {
            return;
        }

        *busy.write() = true;
        let service = forecast_service_for_disable.clone();
        match run_blocking(move || service.disable_product(&ctx)) {
            Ok(()) => {
                selected.set(None);
                forecast.set(None);
                screen.set(Screen::Products);
                let current = *page.peek();
                load_products_for_disable.borrow_mut()(current);
                sink.notify(Notification::success("Forecast", "Product removed"));
            }
            Err(err) => sink.notify(Notification::error("Remove failed", err.user_message())),
        }
        *busy.write() = false;
    }));

    let forecast_service_for_price = forecast_service.clone();
    let refresh_detail_for_price = refresh_detail.clone();
    let apply_price = Rc::new(RefCell::new(move || {
        let Some(ctx) = selected.peek().clone() else {
            return;
        };
        let raw = price_input.peek().clone();
        let Ok(price) = raw.trim().parse::<f64>() else {
            sink.notify(Notification::warning(
                "Unit price",
                "Enter a numeric price before applying",
            ));
            return;
        };

        *busy.write() = true;
        let service = forecast_service_for_price.clone();
        match run_blocking(move || service.update_price(&ctx, price)) {
            Ok(()) => {
                refresh_detail_for_price.borrow_mut()(None);
                sink.notify(Notification::success("Forecast", "Unit price updated"));
            }
            Err(err) => {
                sink.notify(Notification::error("Price update failed", err.user_message()))
            }
        }
        *busy.write() = false;
    }));

    let forecast_service_for_warehouse = forecast_service.clone();
    let refresh_detail_for_warehouse = refresh_detail.clone();
    let apply_warehouse = Rc::new(RefCell::new(move || {
        let Some(ctx) = selected.peek().clone() else {
            return;
        };
        let raw = warehouse_input.peek().trim().to_string();
        let warehouse = if raw.is_empty() { None } else { Some(raw) };

        *busy.write() = true;
        let service = forecast_service_for_warehouse.clone();
        match run_blocking(move || service.update_warehouse(&ctx, warehouse.as_deref())) {
            Ok(()) => {
                refresh_detail_for_warehouse.borrow_mut()(None);
                sink.notify(Notification::success("Forecast", "Warehouse updated"));
            }
            Err(err) => sink.notify(Notification::error(
                "Warehouse update failed",
                err.user_message(),
            )),
        }
        *busy.write() = false;
    }));

    let checklist_service_for_load = checklist_service.clone();
    let record_for_checklist = checklist_record_id.clone();
    let object_for_checklist = checklist_object.clone();
    let load_checklist = Rc::new(RefCell::new(move || {
        *busy.write() = true;
        let service = checklist_service_for_load.clone();
        let record_id = (*record_for_checklist).clone();
        let object_name = (*object_for_checklist).clone();
        match run_blocking(move || service.load(&record_id, &object_name)) {
            Ok(rows) => {
                *checklist.write() = rows;
            }
            Err(err) => sink.notify(Notification::error("Checklist", err.user_message())),
        }
        *busy.write() = false;
    }));

    let checklist_service_for_complete = checklist_service.clone();
    let record_for_complete = checklist_record_id.clone();
    let object_for_complete = checklist_object.clone();
    let complete_checklist_item = Rc::new(RefCell::new(move |item_id: String| {
        *busy.write() = true;
        let result = {
            let mut rows = checklist.write();
            checklist_service_for_complete.complete(
                &mut rows,
                &item_id,
                &record_for_complete,
                &object_for_complete,
            )
        };
        match result {
            Ok(label) => sink.notify(Notification::success("Checklist", format!("{label} done"))),
            Err(err) => sink.notify(Notification::error("Checklist", err.user_message())),
        }
        *busy.write() = false;
    }));

    let upload_service_for_pick = upload_service.clone();
    let pick_upload_file = Rc::new(RefCell::new(move || {
        let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() else {
            return;
        };

        upload_validation.set(None);
        upload_result.set(None);
        let candidate = match UploadService::candidate_from_path(&path) {
            Ok(candidate) => candidate,
            Err(err) => {
                sink.notify(Notification::error("Upload", err.to_string()));
                return;
            }
        };

        let check = upload_service_for_pick.precheck(&candidate);
        upload_candidate.set(Some(candidate));
        if !check.valid {
            upload_errors.set(check.errors.clone());
            upload_content.set(String::new());
            upload_row_count.set(0);
            sink.notify(Notification::error("Upload", check.errors.join("; ")));
            return;
        }

        let content = match UploadService::read_content(&path) {
            Ok(content) => content,
            Err(err) => {
                sink.notify(Notification::error("Upload", err.to_string()));
                return;
            }
        };

        match upload_service_for_pick.parse(&content) {
            Ok(outcome) => {
                upload_row_count.set(outcome.row_count);
                upload_errors.set(outcome.errors);
                upload_content.set(content);
                sink.notify(Notification::info(
                    "Upload",
                    format!("Parsed {} data rows", *upload_row_count.peek()),
                ));
            }
            Err(err) => {
                upload_row_count.set(0);
                upload_errors.set(vec![err.to_string()]);
                upload_content.set(String::new());
                sink.notify(Notification::error("Upload", err.to_string()));
            }
        }
    }));

    let upload_service_for_validate = upload_service.clone();
    let validate_upload = Rc::new(RefCell::new(move || {
        let content = upload_content.peek().clone();
        if content.is_empty() {
            sink.notify(Notification::warning("Upload", "Pick a CSV file first"));
            return;
        }
        *busy.write() = true;
        let service = upload_service_for_validate.clone();
        match run_blocking(move || service.validate_remote(&content)) {
            Ok(validation) => {
                if validation.valid {
                    sink.notify(Notification::success(
                        "Upload",
                        format!("{} rows ready", validation.row_count),
                    ));
                } else {
                    sink.notify(Notification::error(
                        "Upload",
                        validation
                            .error
                            .clone()
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    ));
                }
                upload_validation.set(Some(validation));
            }
            Err(err) => sink.notify(Notification::error("Validation failed", err.user_message())),
        }
        *busy.write() = false;
    }));

    let upload_service_for_upload = upload_service.clone();
    let run_upload = Rc::new(RefCell::new(move || {
        let content = upload_content.peek().clone();
        if content.is_empty() {
            sink.notify(Notification::warning("Upload", "Pick a CSV file first"));
            return;
        }
        *busy.write() = true;
        let service = upload_service_for_upload.clone();
        match run_blocking(move || service.upload(&content)) {
            Ok(result) => {
                if result.success {
                    sink.notify(Notification::success("Upload", result.message.clone()));
                } else {
                    sink.notify(Notification::error("Upload", result.message.clone()));
                }
                upload_result.set(Some(result));
            }
            Err(err) => {
                let message = err.user_message();
                upload_result.set(Some(UploadService::failed_upload_result(&message)));
                sink.notify(Notification::error("Upload failed", message));
            }
        }
        *busy.write() = false;
    }));

    let upload_service_for_template = upload_service.clone();
    let download_template = Rc::new(RefCell::new(move || {
        let Some(destination) = FileDialog::new()
            .set_file_name("forecast_upload_template.csv")
            .save_file()
        else {
            return;
        };
        *busy.write() = true;
        let service = upload_service_for_template.clone();
        match run_blocking(move || service.download_template(&destination)) {
            Ok(()) => sink.notify(Notification::success("Upload", "Template saved")),
            Err(err) => sink.notify(Notification::error("Template failed", err.to_string())),
        }
        *busy.write() = false;
    }));

    let load_products_for_init = load_products.clone();
    use_effect(move || {
        load_products_for_init.borrow_mut()(1);
    });

    let screen_snapshot = screen();
    let products_snapshot = products();
    let forecast_snapshot = forecast();
    let notices_snapshot = notices();
    let checklist_snapshot = checklist();
    let upload_candidate_snapshot = upload_candidate();
    let upload_errors_snapshot = upload_errors();
    let upload_validation_snapshot = upload_validation();
    let upload_result_snapshot = upload_result();
    let volume_snapshot = volume();
    let list_months: Vec<String> = products_snapshot
        .first()
        .map(|row| {
            row.forecast_total
                .iter()
                .map(|point| point.month.clone())
                .collect()
        })
        .unwrap_or_default();

    let load_products_for_nav = load_products.clone();
    let load_products_for_search = load_products.clone();
    let load_products_for_prev = load_products.clone();
    let load_products_for_next = load_products.clone();
    let load_checklist_for_nav = load_checklist.clone();
    let refresh_detail_for_open = refresh_detail.clone();
    let account_for_open = account_id.clone();

    rsx! {
        div {
            style: "font-family: 'Segoe UI', sans-serif; padding: 12px; background: #f5f6f8; min-height: 100vh; height: 100vh; overflow: auto;",

            if !notices_snapshot.is_empty() {
                div {
                    style: "position: fixed; right: 16px; top: 16px; z-index: 1300; display: flex; flex-direction: column; gap: 8px; max-width: 380px;",
                    {notices_snapshot.iter().enumerate().map(|(idx, notice)| {
                        let color = severity_color(notice.severity);
                        let title = notice.title.clone();
                        let message = notice.message.clone();
                        rsx!(div {
                            style: "background: #fff; border-left: 4px solid {color}; border-radius: 6px; box-shadow: 0 6px 16px rgba(0,0,0,0.12); padding: 8px 12px; display: flex; justify-content: space-between; gap: 8px;",
                            div {
                                div { style: "font-weight: 600;", "{title}" }
                                div { style: "font-size: 13px; color: #555;", "{message}" }
                            }
                            button {
                                style: "border: none; background: transparent; cursor: pointer;",
                                onclick: move |_| {
                                    let mut next = notices.write();
                                    if idx < next.len() {
                                        next.remove(idx);
                                    }
                                },
                                "×"
                            }
                        })
                    })}
                }
            }

            h2 { "Forecast Desk" }

            div {
                style: "display: flex; gap: 8px; align-items: center; margin-bottom: 12px; position: sticky; top: 0; background: #f5f6f8; z-index: 900; padding: 8px 0;",
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        screen.set(Screen::Products);
                        let current = *page.peek();
                        load_products_for_nav.borrow_mut()(current);
                    },
                    "Products"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| screen.set(Screen::Upload),
                    "Mass Upload"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        screen.set(Screen::Checklist);
                        load_checklist_for_nav.borrow_mut()();
                    },
                    "Checklist"
                }
                span { " {status}" }
            }

            if screen_snapshot == Screen::Products {
                div {
                    div {
                        style: "display: flex; gap: 8px; align-items: center; margin-bottom: 12px;",
                        input {
                            placeholder: "Search products",
                            value: search(),
                            oninput: move |event| search.set(event.value()),
                        }
                        button {
                            disabled: busy(),
                            onclick: move |_| load_products_for_search.borrow_mut()(1),
                            "Search"
                        }
                        button {
                            disabled: busy() || page() <= 1,
                            onclick: move |_| {
                                let previous = *page.peek() - 1;
                                load_products_for_prev.borrow_mut()(previous);
                            },
                            "Previous"
                        }
                        button {
                            disabled: busy() || !has_more(),
                            onclick: move |_| {
                                let next = *page.peek() + 1;
                                load_products_for_next.borrow_mut()(next);
                            },
                            "Next"
                        }
                        span { "Page {page}" }
                    }

                    div { style: "{table_container_style()}",
                        table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                            thead {
                                tr {
                                    th { style: "{table_header_cell_style()}", "Product" }
                                    th { style: "{table_header_cell_style()}", "Unit Price" }
                                    th { style: "{table_header_cell_style()}", "Methods" }
                                    th { style: "{table_header_cell_style()}", "Warehouse" }
                                    {list_months.iter().map(|month| rsx!(
                                        th { style: "{table_header_cell_style()}", "{month}" }
                                    ))}
                                }
                            }
                            tbody {
                                {products_snapshot.iter().map(|row| {
                                    let product_id = row.product.record_id.clone();
                                    let product_name = row.product.name.clone();
                                    let unit_price = row
                                        .product
                                        .unit_price
                                        .map(|price| format!("{price:.2}"))
                                        .unwrap_or_else(|| "-".to_string());
                                    let methods = match (row.direct_enabled, row.local_enabled) {
                                        (true, true) => "Direct, Local",
                                        (true, false) => "Direct",
                                        (false, true) => "Local",
                                        (false, false) => "-",
                                    };
                                    let warehouse = row
                                        .warehouse_name
                                        .clone()
                                        .unwrap_or_else(|| "-".to_string());
                                    let totals = row.forecast_total.clone();
                                    let direct_enabled = row.direct_enabled;
                                    let refresh_detail_for_row = refresh_detail_for_open.clone();
                                    let account_for_row = account_for_open.clone();
                                    rsx!(tr {
                                        td { style: "{table_cell_style()}",
                                            button {
                                                style: "border: none; background: transparent; color: #4c6ef5; cursor: pointer; padding: 0;",
                                                onclick: move |_| {
                                                    let ctx = ForecastContext {
                                                        account_id: (*account_for_row).clone(),
                                                        product_id: product_id.clone(),
                                                        volume: *volume.peek(),
                                                        direct: direct_enabled,
                                                    };
                                                    selected.set(Some(ctx));
                                                    screen.set(Screen::Detail);
                                                    *busy.write() = true;
                                                    refresh_detail_for_row.borrow_mut()(None);
                                                    *busy.write() = false;
                                                },
                                                "{product_name}"
                                            }
                                        }
                                        td { style: "{table_cell_style()} text-align: right;", "{unit_price}" }
                                        td { style: "{table_cell_style()}", "{methods}" }
                                        td { style: "{table_cell_style()}", "{warehouse}" }
                                        {list_months.iter().map(|month| {
                                            let value = point_value(&totals, month);
                                            rsx!(td { style: "{table_cell_style()} text-align: right;", "{value}" })
                                        })}
                                    })
                                })}
                            }
                        }
                    }
                }
            }

            if screen_snapshot == Screen::Detail {
                if let Some(detail) = forecast_snapshot.clone() {
                    div {
                        div {
                            style: "display: flex; gap: 12px; align-items: center; margin-bottom: 12px; flex-wrap: wrap;",
                            button {
                                disabled: busy(),
                                onclick: move |_| {
                                    selected.set(None);
                                    forecast.set(None);
                                    screen.set(Screen::Products);
                                },
                                "Back"
                            }
                            h3 { style: "margin: 0;", "{detail.product.name}" }
                            if let Some(currency) = detail.product.currency_code.clone() {
                                span { style: "color: #888;", "{currency}" }
                            }

                            label { "Unit price" }
                            input {
                                style: "width: 90px;",
                                value: price_input(),
                                oninput: move |event| price_input.set(event.value()),
                            }
                            button {
                                disabled: busy(),
                                onclick: {
                                    let apply_price = apply_price.clone();
                                    move |_| apply_price.borrow_mut()()
                                },
                                "Apply"
                            }

                            label { "Warehouse" }
                            input {
                                style: "width: 140px;",
                                value: warehouse_input(),
                                oninput: move |event| warehouse_input.set(event.value()),
                            }
                            button {
                                disabled: busy(),
                                onclick: {
                                    let apply_warehouse = apply_warehouse.clone();
                                    move |_| apply_warehouse.borrow_mut()()
                                },
                                "Apply"
                            }
                            if let Some(warehouse) = detail.warehouse.clone() {
                                span { style: "color: #888;", "({warehouse.label})" }
                            }
                        }

                        div {
                            style: "display: flex; gap: 12px; align-items: center; margin-bottom: 12px; flex-wrap: wrap;",
                            span { "Volume:" }
                            {[VolumeUnit::Pieces, VolumeUnit::Cases].iter().map(|unit| {
                                let unit = *unit;
                                let active = volume_snapshot == unit;
                                let switch_volume = switch_volume.clone();
                                let style = if active {
                                    "padding: 4px 10px; border: 1px solid #4c6ef5; background: #eef4ff; border-radius: 6px;"
                                } else {
                                    "padding: 4px 10px; border: 1px solid #bbb; background: #fff; border-radius: 6px;"
                                };
                                rsx!(button {
                                    style: "{style}",
                                    disabled: busy(),
                                    onclick: move |_| switch_volume.borrow_mut()(unit),
                                    "{unit.label()}"
                                })
                            })}

                            {[FulfillmentMethod::Direct, FulfillmentMethod::Local].iter().map(|method| {
                                let method = *method;
                                let enabled = match method {
                                    FulfillmentMethod::Direct => detail.direct_enabled,
                                    FulfillmentMethod::Local => detail.local_enabled,
                                };
                                let toggle_method = toggle_method.clone();
                                rsx!(label {
                                    style: "display: flex; align-items: center; gap: 6px;",
                                    input {
                                        r#type: "checkbox",
                                        checked: enabled,
                                        disabled: busy(),
                                        onclick: move |_| toggle_method.borrow_mut()(method, !enabled),
                                    }
                                    "{method.label()}"
                                })
                            })}

                            button {
                                disabled: busy(),
                                onclick: {
                                    let disable_product = disable_product.clone();
                                    move |_| disable_product.borrow_mut()()
                                },
                                "Remove Product"
                            }
                        }

                        div { style: "{table_container_style()} margin-bottom: 16px;",
                            table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                                thead {
                                    tr {
                                        th { style: "{table_header_cell_style()}", "" }
                                        {detail.date_range.iter().map(|month| rsx!(
                                            th { style: "{table_header_cell_style()}", "{month}" }
                                        ))}
                                    }
                                }
                                tbody {
                                    SeriesRow {
                                        label: "Previous Year Orders".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.previous_year_orders.clone(),
                                    }
                                    SeriesRow {
                                        label: "Current Year Orders".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.current_year_orders.clone(),
                                    }
                                    SeriesRow {
                                        label: "Base Forecast".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.base_summary.clone(),
                                    }
                                    SeriesRow {
                                        label: "Opportunities".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.opportunities_summary.clone(),
                                    }
                                    SeriesRow {
                                        label: "Adjustments".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.adjustments_summary.clone(),
                                    }
                                    SeriesRow {
                                        label: "Forecast Total".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.forecast_summary.clone(),
                                    }
                                    AmountRow {
                                        label: "Forecast Revenue".to_string(),
                                        months: detail.date_range.clone(),
                                        points: detail.forecast_revenue.clone(),
                                    }
                                }
                            }
                        }

                        if detail.direct_enabled {
                            PanelSection {
                                panel: direct_panel,
                                months: detail.date_range.clone(),
                                opportunities_total: detail.opportunities_total_direct.clone(),
                                adjustments_total: detail.adjustments_total_direct.clone(),
                                forecast_total: detail.forecast_total_direct.clone(),
                                busy: busy,
                                on_save_adjustment: {
                                    let save_adjustment = save_adjustment.clone();
                                    move |id: String| {
                                        save_adjustment.borrow_mut()(FulfillmentMethod::Direct, id)
                                    }
                                },
                                on_save_base: {
                                    let save_base = save_base.clone();
                                    move |_| save_base.borrow_mut()(FulfillmentMethod::Direct)
                                },
                                on_deactivate: {
                                    let deactivate_adjustment = deactivate_adjustment.clone();
                                    move |id: String| deactivate_adjustment.borrow_mut()(id)
                                },
                                on_approval: {
                                    let set_approval = set_approval.clone();
                                    move |args: (String, ApprovalStatus)| set_approval.borrow_mut()(args)
                                },
                            }
                        }

                        if detail.local_enabled {
                            PanelSection {
                                panel: local_panel,
                                months: detail.date_range.clone(),
                                opportunities_total: detail.opportunities_total_local.clone(),
                                adjustments_total: detail.adjustments_total_local.clone(),
                                forecast_total: detail.forecast_total_local.clone(),
                                busy: busy,
                                on_save_adjustment: {
                                    let save_adjustment = save_adjustment.clone();
                                    move |id: String| {
                                        save_adjustment.borrow_mut()(FulfillmentMethod::Local, id)
                                    }
                                },
                                on_save_base: {
                                    let save_base = save_base.clone();
                                    move |_| save_base.borrow_mut()(FulfillmentMethod::Local)
                                },
                                on_deactivate: {
                                    let deactivate_adjustment = deactivate_adjustment.clone();
                                    move |id: String| deactivate_adjustment.borrow_mut()(id)
                                },
                                on_approval: {
                                    let set_approval = set_approval.clone();
                                    move |args: (String, ApprovalStatus)| set_approval.borrow_mut()(args)
                                },
                            }
                        }
                    }
                } else {
                    div { p { "Loading forecast…" } }
                }
            }

            if screen_snapshot == Screen::Upload {
                div {
                    style: "background: #fff; border: 1px solid #ccc; border-radius: 8px; padding: 16px; max-width: 760px;",
                    h3 { style: "margin-top: 0;", "Mass Upload" }
                    div {
                        style: "display: flex; gap: 8px; margin-bottom: 12px;",
                        button {
                            disabled: busy(),
                            onclick: {
                                let pick_upload_file = pick_upload_file.clone();
                                move |_| pick_upload_file.borrow_mut()()
                            },
                            "Choose CSV"
                        }
                        button {
                            disabled: busy() || upload_content().is_empty(),
                            onclick: {
                                let validate_upload = validate_upload.clone();
                                move |_| validate_upload.borrow_mut()()
                            },
                            "Validate"
                        }
                        button {
                            disabled: busy() || upload_content().is_empty(),
                            onclick: {
                                let run_upload = run_upload.clone();
                                move |_| run_upload.borrow_mut()()
                            },
                            "Upload"
                        }
                        button {
                            disabled: busy(),
                            onclick: {
                                let download_template = download_template.clone();
                                move |_| download_template.borrow_mut()()
                            },
                            "Download Template"
                        }
                    }

                    if let Some(candidate) = upload_candidate_snapshot.clone() {
                        p { "File: {candidate.name} ({candidate.size} bytes)" }
                    }
                    if upload_row_count() > 0 {
                        p { "{upload_row_count()} data rows parsed" }
                    }
                    if !upload_errors_snapshot.is_empty() {
                        div {
                            style: "border: 1px solid #d6336c; border-radius: 6px; padding: 8px; margin-bottom: 12px;",
                            div { style: "font-weight: 600; color: #d6336c;", "Problems found" }
                            ul {
                                {upload_errors_snapshot.iter().map(|error| rsx!(li { "{error}" }))}
                            }
                        }
                    }
                    if let Some(validation) = upload_validation_snapshot.clone() {
                        if validation.valid {
                            p { "Server validation passed ({validation.row_count} rows)." }
                        } else {
                            p { "Server validation failed." }
                        }
                    }
                    if let Some(result) = upload_result_snapshot.clone() {
                        div {
                            style: "border-top: 1px solid #ddd; padding-top: 8px;",
                            p { "{result.message}" }
                            p { "Total: {result.total_rows} · Succeeded: {result.success_rows} · Failed: {result.error_rows}" }
                            if !result.errors.is_empty() {
                                ul {
                                    {result.errors.iter().map(|error| rsx!(li { "{error}" }))}
                                }
                            }
                        }
                    }
                }
            }

            if screen_snapshot == Screen::Checklist {
                div {
                    style: "background: #fff; border: 1px solid #ccc; border-radius: 8px; padding: 16px; max-width: 560px;",
                    h3 { style: "margin-top: 0;", "Checklist" }
                    if checklist_snapshot.is_empty() {
                        p { "No checklist items." }
                    }
                    {checklist_snapshot.iter().map(|row| {
                        let item_id = row.item.record_id.clone();
                        let label = row.item.label.clone();
                        let completed = row.is_completed;
                        let disabled = row.is_disabled;
                        let complete_checklist_item = complete_checklist_item.clone();
                        let text_style = if completed {
                            "text-decoration: line-through; color: #888;"
                        } else if disabled {
                            "color: #bbb;"
                        } else {
                            ""
                        };
                        rsx!(div {
                            style: "display: flex; align-items: center; gap: 8px; padding: 6px 0;",
                            input {
                                r#type: "checkbox",
                                checked: completed,
                                disabled: disabled || busy(),
                                onclick: move |_| complete_checklist_item.borrow_mut()(item_id.clone()),
                            }
                            span { style: "{text_style}", "{label}" }
                        })
                    })}
                }
            }
        }
    }
}
