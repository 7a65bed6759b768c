use std::collections::BTreeMap;

use crate::domain::entities::forecast::VolumeUnit;
use crate::domain::numbers::convert_quantity;

/// Sentinel key for the not-yet-persisted "new adjustment" form.
pub const NEW_ADJUSTMENT_KEY: &str = "new";

/// An uncommitted adjustment edit. Quantities are kept as entered (raw text)
/// until save builds the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftAdjustment {
    pub name: String,
    pub comment: String,
    pub opportunity: Option<String>,
    pub quantities: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// A field change arrived for a row that was never put into edit mode.
    NotEditing(String),
    BaseNotEditing,
}

impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::NotEditing(key) => {
                write!(f, "adjustment {key} is not in edit mode")
            }
            DraftError::BaseNotEditing => write!(f, "base forecast is not in edit mode"),
        }
    }
}

impl std::error::Error for DraftError {}

/// Client-side staging area for pending edits of one fulfillment method.
///
/// Invariant: a draft entry exists for a key exactly while that row is in
/// edit mode. All mutation goes through the transition functions below;
/// cancel and a confirmed save are the only ways a draft disappears.
#[derive(Debug, Clone, Default)]
pub struct DraftEditSession {
    adjustments: BTreeMap<String, DraftAdjustment>,
    base: BTreeMap<String, String>,
    base_editing: bool,
}

impl DraftEditSession {
    pub fn phase(&self, key: &str) -> RowPhase {
        if self.adjustments.contains_key(key) {
            RowPhase::Editing
        } else {
            RowPhase::Viewing
        }
    }

    pub fn is_editing(&self, key: &str) -> bool {
        matches!(self.phase(key), RowPhase::Editing)
    }

    pub fn has_new_form(&self) -> bool {
        self.adjustments.contains_key(NEW_ADJUSTMENT_KEY)
    }

    /// Persisted adjustments currently in edit mode (the new-adjustment form
    /// is counted separately for row bookkeeping).
    pub fn editing_row_count(&self) -> usize {
        self.adjustments
            .keys()
            .filter(|key| key.as_str() != NEW_ADJUSTMENT_KEY)
            .count()
    }

    /// Enters edit mode for an existing adjustment, seeded with its current
    /// header fields. Re-entering reseeds the draft.
    pub fn begin_adjustment(&mut self, key: &str, seed: DraftAdjustment) {
        self.adjustments.insert(key.to_string(), seed);
    }

    pub fn open_new_adjustment(&mut self) {
        self.adjustments
            .insert(NEW_ADJUSTMENT_KEY.to_string(), DraftAdjustment::default());
    }

    pub fn adjustment(&self, key: &str) -> Option<&DraftAdjustment> {
        self.adjustments.get(key)
    }

    pub fn quantity(&self, key: &str, month: &str) -> Option<&str> {
        self.adjustments
            .get(key)
            .and_then(|draft| draft.quantities.get(month))
            .map(String::as_str)
    }

    pub fn set_name(&mut self, key: &str, name: &str) -> Result<(), DraftError> {
        self.draft_mut(key)?.name = name.to_string();
        Ok(())
    }

    pub fn set_comment(&mut self, key: &str, comment: &str) -> Result<(), DraftError> {
        self.draft_mut(key)?.comment = comment.to_string();
        Ok(())
    }

    pub fn set_opportunity(&mut self, key: &str, opportunity: &str) -> Result<(), DraftError> {
        let draft = self.draft_mut(key)?;
        draft.opportunity = if opportunity.is_empty() || opportunity == "-" {
            None
        } else {
            Some(opportunity.to_string())
        };
        Ok(())
    }

    /// Records a quantity change. Cleared inputs are coerced to zero so the
    /// save payload never carries holes.
    pub fn set_quantity(&mut self, key: &str, month: &str, raw: &str) -> Result<(), DraftError> {
        let quantity = if raw.trim().is_empty() { "0" } else { raw };
        self.draft_mut(key)?
            .quantities
            .insert(month.to_string(), quantity.to_string());
        Ok(())
    }

    pub fn cancel_adjustment(&mut self, key: &str) -> Option<DraftAdjustment> {
        self.adjustments.remove(key)
    }

    /// Drops the draft after the save round-trip (upsert plus refetch) has
    /// confirmed. A failed save never reaches this point, so the draft stays
    /// available for retry.
    pub fn complete_adjustment_save(&mut self, key: &str) {
        self.adjustments.remove(key);
    }

    pub fn begin_base(&mut self) {
        self.base_editing = true;
    }

    pub fn base_editing(&self) -> bool {
        self.base_editing
    }

    pub fn base_quantity(&self, month: &str) -> Option<&str> {
        self.base.get(month).map(String::as_str)
    }

    pub fn base_entries(&self) -> &BTreeMap<String, String> {
        &self.base
    }

    pub fn set_base_quantity(&mut self, month: &str, raw: &str) -> Result<(), DraftError> {
        if !self.base_editing {
            return Err(DraftError::BaseNotEditing);
        }
        let quantity = if raw.trim().is_empty() { "0" } else { raw };
        self.base.insert(month.to_string(), quantity.to_string());
        Ok(())
    }

    pub fn cancel_base(&mut self) {
        self.base.clear();
        self.base_editing = false;
    }

    pub fn complete_base_save(&mut self) {
        self.base.clear();
        self.base_editing = false;
    }

    /// Converts every in-flight quantity when the display unit flips, so the
    /// next save submits values in whatever unit is selected then.
    pub fn rescale(&mut self, uom: f64, target: VolumeUnit) {
        for draft in self.adjustments.values_mut() {
            for quantity in draft.quantities.values_mut() {
                *quantity = convert_quantity(quantity, uom, target);
            }
        }
        for quantity in self.base.values_mut() {
            *quantity = convert_quantity(quantity, uom, target);
        }
    }

    fn draft_mut(&mut self, key: &str) -> Result<&mut DraftAdjustment, DraftError> {
        self.adjustments
            .get_mut(key)
            .ok_or_else(|| DraftError::NotEditing(key.to_string()))
    }
}
