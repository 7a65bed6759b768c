use std::collections::BTreeMap;

use crate::domain::entities::draft::{DraftAdjustment, DraftEditSession, NEW_ADJUSTMENT_KEY};
use crate::domain::entities::forecast::{
    value_as_text, AdjustmentEntry, FulfillmentMethod, MonthMap, MonthlyPoint, OpportunityEntry,
    VolumeUnit,
};

/// Fixed rows a fulfillment section always renders: base forecast, base
/// total, opportunities total, forecast total.
pub const FULFILLMENT_BASE_ROWS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentRow {
    pub record_id: String,
    pub name: String,
    pub comment: String,
    pub opportunity: Option<String>,
    pub opportunity_name: Option<String>,
    pub entries: Vec<MonthlyPoint>,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityRow {
    pub record_id: String,
    pub opportunity_id: String,
    pub name: String,
    pub comment: String,
    pub approved: bool,
    pub rejected: bool,
    pub pending: bool,
    pub entries: Vec<MonthlyPoint>,
}

impl OpportunityRow {
    pub fn visible(&self, show_rejected: bool) -> bool {
        show_rejected || !self.rejected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityOption {
    pub value: String,
    pub label: String,
}

/// Display state of one fulfillment method: the server-confirmed rows, the
/// draft session layered over them, and the counters the table needs.
///
/// Rows keep the server values; a draft quantity overlays them only at
/// display time, so cancelling an edit falls back to the pre-edit snapshot
/// without any restore step.
#[derive(Debug, Clone)]
pub struct MethodPanel {
    pub method: FulfillmentMethod,
    pub base: Vec<MonthlyPoint>,
    pub adjustments: Vec<AdjustmentRow>,
    pub opportunities: Vec<OpportunityRow>,
    pub opportunity_options: Vec<OpportunityOption>,
    pub show_rejected: bool,
    pub session: DraftEditSession,
}

impl MethodPanel {
    pub fn new(method: FulfillmentMethod) -> Self {
        Self {
            method,
            base: Vec::new(),
            adjustments: Vec::new(),
            opportunities: Vec::new(),
            opportunity_options: Vec::new(),
            show_rejected: false,
            session: DraftEditSession::default(),
        }
    }

    /// Rebuilds the display rows from a fresh snapshot. Drafts survive the
    /// refresh; when the volume unit flipped since the last fetch, they are
    /// rescaled first so overlay and server rows agree on the unit.
    pub fn refresh(
        &mut self,
        base: &MonthMap,
        adjustments: &[AdjustmentEntry],
        opportunities: &[OpportunityEntry],
        rescale: Option<(f64, VolumeUnit)>,
    ) {
        if let Some((uom, unit)) = rescale {
            self.session.rescale(uom, unit);
        }

        self.base = base
            .iter()
            .map(|(month, value)| MonthlyPoint {
                month: month.clone(),
                value: value_as_text(value),
            })
            .collect();

        self.adjustments = adjustments
            .iter()
            .map(|entry| AdjustmentRow {
                record_id: entry.record_id.clone(),
                name: entry.name.clone(),
                comment: entry.comment.clone().unwrap_or_default(),
                opportunity: entry.opportunity_forecast_id.clone(),
                opportunity_name: entry.opportunity_name.clone(),
                entries: entry
                    .forecast_numbers
                    .iter()
                    .map(|(month, value)| MonthlyPoint {
                        month: month.clone(),
                        value: value_as_text(value),
                    })
                    .collect(),
                editing: self.session.is_editing(&entry.record_id),
            })
            .collect();

        self.opportunity_options = vec![OpportunityOption {
            value: "-".to_string(),
            label: "--None--".to_string(),
        }];
        self.opportunities = opportunities
            .iter()
            .map(|entry| {
                if entry.approved {
                    self.opportunity_options.push(OpportunityOption {
                        value: entry.record_id.clone(),
                        label: entry.name.clone(),
                    });
                }
                OpportunityRow {
                    record_id: entry.record_id.clone(),
                    opportunity_id: entry.opportunity_id.clone(),
                    name: entry.name.clone(),
                    comment: entry.comment.clone().unwrap_or_default(),
                    approved: entry.approved,
                    rejected: entry.rejected,
                    pending: entry.pending,
                    entries: entry
                        .forecast_numbers
                        .iter()
                        .map(|(month, value)| MonthlyPoint {
                            month: month.clone(),
                            value: value_as_text(value),
                        })
                        .collect(),
                }
            })
            .collect();
    }

    /// Seeds an edit draft from the displayed row.
    pub fn begin_adjustment_edit(&mut self, record_id: &str) {
        let seed = self
            .adjustments
            .iter()
            .find(|row| row.record_id == record_id)
            .map(|row| DraftAdjustment {
                name: row.name.clone(),
                comment: row.comment.clone(),
                opportunity: row.opportunity.clone(),
                quantities: BTreeMap::new(),
            })
            .unwrap_or_default();

        self.session.begin_adjustment(record_id, seed);
        self.mark_editing(record_id, true);
    }

    pub fn cancel_adjustment_edit(&mut self, record_id: &str) {
        self.session.cancel_adjustment(record_id);
        self.mark_editing(record_id, false);
    }

    pub fn finish_adjustment_save(&mut self, record_id: &str) {
        self.session.complete_adjustment_save(record_id);
        self.mark_editing(record_id, false);
    }

    /// Draft quantity if the row is being edited, else the server value.
    pub fn display_quantity(&self, record_id: &str, month: &str) -> String {
        if let Some(draft) = self.session.quantity(record_id, month) {
            return draft.to_string();
        }
        self.adjustments
            .iter()
            .find(|row| row.record_id == record_id)
            .and_then(|row| row.entries.iter().find(|point| point.month == month))
            .map(|point| point.value.clone())
            .unwrap_or_default()
    }

    pub fn display_base(&self, month: &str) -> String {
        if let Some(draft) = self.session.base_quantity(month) {
            return draft.to_string();
        }
        self.base
            .iter()
            .find(|point| point.month == month)
            .map(|point| point.value.clone())
            .unwrap_or_default()
    }

    pub fn rejected_count(&self) -> usize {
        self.opportunities.iter().filter(|row| row.rejected).count()
    }

    pub fn has_rejected(&self) -> bool {
        self.rejected_count() > 0
    }

    pub fn visible_opportunity_count(&self) -> usize {
        self.opportunities
            .iter()
            .filter(|row| row.visible(self.show_rejected))
            .count()
    }

    /// Rendered row count for the fulfillment cell: the fixed rows, one per
    /// adjustment, the visible opportunities, one extra while the new
    /// adjustment form is open, and one extra per adjustment in edit mode.
    pub fn row_span(&self) -> usize {
        let mut span =
            FULFILLMENT_BASE_ROWS + self.adjustments.len() + self.visible_opportunity_count();
        if self.session.has_new_form() {
            span += 1;
        }
        span + self.session.editing_row_count()
    }

    pub fn set_show_rejected(&mut self, show: bool) {
        self.show_rejected = show;
    }

    fn mark_editing(&mut self, record_id: &str, editing: bool) {
        if record_id == NEW_ADJUSTMENT_KEY {
            return;
        }
        for row in &mut self.adjustments {
            if row.record_id == record_id {
                row.editing = editing;
            }
        }
    }
}
