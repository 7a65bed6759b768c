use std::sync::Arc;

use log::{debug, warn};

use crate::domain::entities::forecast::{
    map_to_points, revenue_series, ApprovalStatus, FulfillmentMethod, MonthlyAmount, MonthlyPoint,
    ProductInfo, VolumeUnit, WarehouseRef,
};
use crate::domain::entities::panel::MethodPanel;
use crate::domain::numbers::is_chronological;
use crate::usecase::ports::backend::{
    BackendError, FetchForecastRequest, ForecastBackend, ForecastSnapshot, ProductListRequest,
    QuantityUpsert, UpsertAdjustmentRequest, UpsertBaseForecastRequest,
};

/// Identity of the forecast a detail view is working on. Travels with every
/// call so quantities are always interpreted against the selected volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastContext {
    pub account_id: String,
    pub product_id: String,
    pub volume: VolumeUnit,
    pub direct: bool,
}

/// Read-only series of one product detail view, projected from a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForecast {
    pub product: ProductInfo,
    pub direct_enabled: bool,
    pub local_enabled: bool,
    pub date_range: Vec<String>,
    pub previous_year_orders: Vec<MonthlyPoint>,
    pub current_year_orders: Vec<MonthlyPoint>,
    pub opportunities_total_direct: Vec<MonthlyPoint>,
    pub adjustments_total_direct: Vec<MonthlyPoint>,
    pub forecast_total_direct: Vec<MonthlyPoint>,
    pub opportunities_total_local: Vec<MonthlyPoint>,
    pub adjustments_total_local: Vec<MonthlyPoint>,
    pub forecast_total_local: Vec<MonthlyPoint>,
    pub base_summary: Vec<MonthlyPoint>,
    pub opportunities_summary: Vec<MonthlyPoint>,
    pub adjustments_summary: Vec<MonthlyPoint>,
    pub forecast_summary: Vec<MonthlyPoint>,
    pub forecast_revenue: Vec<MonthlyAmount>,
    pub warehouse: Option<WarehouseRef>,
}

/// One row of the paged product list, with derived revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product: ProductInfo,
    pub direct_enabled: bool,
    pub local_enabled: bool,
    pub warehouse_name: Option<String>,
    pub previous_year_orders: Vec<MonthlyPoint>,
    pub current_year_orders: Vec<MonthlyPoint>,
    pub base_total: Vec<MonthlyPoint>,
    pub opportunities_total: Vec<MonthlyPoint>,
    pub adjustments_total: Vec<MonthlyPoint>,
    pub forecast_total: Vec<MonthlyPoint>,
    pub forecast_revenue: Vec<MonthlyAmount>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub rows: Vec<ProductRow>,
    pub has_more: bool,
}

pub struct ForecastService {
    backend: Arc<dyn ForecastBackend>,
}

impl ForecastService {
    pub fn new(backend: Arc<dyn ForecastBackend>) -> Self {
        Self { backend }
    }

    pub fn fetch(&self, ctx: &ForecastContext) -> Result<ForecastSnapshot, BackendError> {
        let snapshot = self.backend.fetch_forecast(FetchForecastRequest {
            account_id: ctx.account_id.clone(),
            product_id: ctx.product_id.clone(),
            volume: ctx.volume,
            direct: ctx.direct,
        })?;

        if !snapshot.date_range.is_empty() && !is_chronological(&snapshot.date_range) {
            warn!(
                "forecast months for product {} arrived out of chronological order",
                snapshot.product_info.record_id
            );
        }

        Ok(snapshot)
    }

    /// Projects the snapshot's aggregate maps into ordered display series and
    /// derives the revenue row from the forecast totals.
    pub fn assemble(snapshot: &ForecastSnapshot) -> ProductForecast {
        let revenue_source = if !snapshot.forecast_summary_map.is_empty() {
            &snapshot.forecast_summary_map
        } else if snapshot.direct_enabled {
            &snapshot.forecast_total_direct_map
        } else {
            &snapshot.forecast_total_local_map
        };

        ProductForecast {
            product: snapshot.product_info.clone(),
            direct_enabled: snapshot.direct_enabled,
            local_enabled: snapshot.local_enabled,
            date_range: snapshot.date_range.clone(),
            previous_year_orders: map_to_points(&snapshot.previous_year_orders_map),
            current_year_orders: map_to_points(&snapshot.current_year_orders_map),
            opportunities_total_direct: map_to_points(&snapshot.opportunities_total_direct_map),
            adjustments_total_direct: map_to_points(&snapshot.adjustments_total_direct_map),
            forecast_total_direct: map_to_points(&snapshot.forecast_total_direct_map),
            opportunities_total_local: map_to_points(&snapshot.opportunities_total_local_map),
            adjustments_total_local: map_to_points(&snapshot.adjustments_total_local_map),
            forecast_total_local: map_to_points(&snapshot.forecast_total_local_map),
            base_summary: map_to_points(&snapshot.base_summary_map),
            opportunities_summary: map_to_points(&snapshot.opportunities_summary_map),
            adjustments_summary: map_to_points(&snapshot.adjustments_summary_map),
            forecast_summary: map_to_points(&snapshot.forecast_summary_map),
            forecast_revenue: revenue_series(revenue_source, snapshot.product_info.unit_price),
            warehouse: snapshot.warehouse.clone(),
        }
    }

    /// Rebuilds both method panels from a fresh snapshot. `rescale` carries
    /// the conversion factor when the volume unit flipped since the panels
    /// were last refreshed.
    pub fn refresh_panels(
        snapshot: &ForecastSnapshot,
        direct: &mut MethodPanel,
        local: &mut MethodPanel,
        rescale: Option<(f64, VolumeUnit)>,
    ) {
        direct.refresh(
            &snapshot.base_direct_map,
            &snapshot.direct_adjustment_entries,
            &snapshot.direct_opps_entries,
            rescale,
        );
        local.refresh(
            &snapshot.base_local_map,
            &snapshot.local_adjustment_entries,
            &snapshot.local_opps_entries,
            rescale,
        );
    }

    /// Saves an adjustment draft: upsert, then refetch, and only once the
    /// refetch succeeded the draft is dropped. Any failure leaves the draft
    /// in place for retry.
    pub fn save_adjustment(
        &self,
        ctx: &ForecastContext,
        panel: &mut MethodPanel,
        adjustment_id: &str,
        uom: f64,
    ) -> Result<ForecastSnapshot, BackendError> {
        let draft = panel
            .session
            .adjustment(adjustment_id)
            .cloned()
            .ok_or_else(|| {
                BackendError::message(format!("no pending edit for adjustment {adjustment_id}"))
            })?;

        let entries = draft
            .quantities
            .iter()
            .map(|(month, quantity)| QuantityUpsert {
                external_id: month.clone(),
                quantity: quantity.clone(),
                fulfillment: panel.method,
            })
            .collect();

        self.backend.upsert_adjustment(UpsertAdjustmentRequest {
            account_id: ctx.account_id.clone(),
            product_id: ctx.product_id.clone(),
            adjustment_id: adjustment_id.to_string(),
            opportunity_id: draft.opportunity.clone(),
            name: draft.name.clone(),
            comment: draft.comment.clone(),
            entries,
            volume: ctx.volume,
            uom,
        })?;

        let refreshed = self.fetch(ctx)?;
        panel.finish_adjustment_save(adjustment_id);
        debug!(
            "saved adjustment {adjustment_id} for product {}",
            ctx.product_id
        );
        Ok(refreshed)
    }

    /// Same round-trip discipline as `save_adjustment`, for the base rows.
    pub fn save_base(
        &self,
        ctx: &ForecastContext,
        panel: &mut MethodPanel,
        uom: f64,
    ) -> Result<ForecastSnapshot, BackendError> {
        let entries = panel
            .session
            .base_entries()
            .iter()
            .map(|(month, quantity)| QuantityUpsert {
                external_id: month.clone(),
                quantity: quantity.clone(),
                fulfillment: panel.method,
            })
            .collect();

        self.backend.upsert_base_forecast(UpsertBaseForecastRequest {
            account_id: ctx.account_id.clone(),
            product_id: ctx.product_id.clone(),
            entries,
            volume: ctx.volume,
            uom,
            direct: ctx.direct,
        })?;

        let refreshed = self.fetch(ctx)?;
        panel.session.complete_base_save();
        Ok(refreshed)
    }

    pub fn list_products(&self, request: ProductListRequest) -> Result<ProductPage, BackendError> {
        let result = self.backend.list_product_forecasts(request)?;

        let rows = result
            .products
            .iter()
            .map(|entry| ProductRow {
                product: entry.product_info.clone(),
                direct_enabled: entry.direct_enabled,
                local_enabled: entry.local_enabled,
                warehouse_name: entry.warehouse_name.clone(),
                previous_year_orders: map_to_points(&entry.previous_year_orders_map),
                current_year_orders: map_to_points(&entry.current_year_orders_map),
                base_total: map_to_points(&entry.base_total_map),
                opportunities_total: map_to_points(&entry.opportunities_total_map),
                adjustments_total: map_to_points(&entry.adjustments_total_map),
                forecast_total: map_to_points(&entry.forecast_total_map),
                forecast_revenue: revenue_series(
                    &entry.forecast_total_map,
                    entry.product_info.unit_price,
                ),
            })
            .collect();

        Ok(ProductPage {
            rows,
            has_more: result.has_more,
        })
    }

    pub fn set_fulfillment_method(
        &self,
        ctx: &ForecastContext,
        method: FulfillmentMethod,
        enabled: bool,
    ) -> Result<(), BackendError> {
        self.backend
            .set_fulfillment_method(&ctx.account_id, &ctx.product_id, method, enabled)
    }

    pub fn disable_product(&self, ctx: &ForecastContext) -> Result<(), BackendError> {
        self.backend
            .disable_product(&ctx.account_id, &ctx.product_id, ctx.direct)
    }

    pub fn deactivate_adjustment(&self, adjustment_id: &str) -> Result<(), BackendError> {
        self.backend.deactivate_adjustment(adjustment_id)
    }

    pub fn set_opportunity_approval(
        &self,
        opportunity_forecast_id: &str,
        status: ApprovalStatus,
    ) -> Result<(), BackendError> {
        self.backend
            .set_opportunity_approval(opportunity_forecast_id, status)
    }

    pub fn update_warehouse(
        &self,
        ctx: &ForecastContext,
        warehouse_id: Option<&str>,
    ) -> Result<(), BackendError> {
        self.backend
            .update_warehouse(&ctx.account_id, &ctx.product_id, warehouse_id, ctx.direct)
    }

    pub fn update_price(&self, ctx: &ForecastContext, price: f64) -> Result<(), BackendError> {
        self.backend
            .update_price(&ctx.account_id, &ctx.product_id, price)
    }
}
