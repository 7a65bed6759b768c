use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::entities::checklist::{gate_rows, regate, ChecklistRow};
use crate::usecase::ports::backend::{BackendError, ForecastBackend};

pub struct ChecklistService {
    backend: Arc<dyn ForecastBackend>,
}

impl ChecklistService {
    pub fn new(backend: Arc<dyn ForecastBackend>) -> Self {
        Self { backend }
    }

    /// Loads items and completed actions, then gates. Both calls must have
    /// answered before any row state is computed.
    pub fn load(
        &self,
        record_id: &str,
        object_name: &str,
    ) -> Result<Vec<ChecklistRow>, BackendError> {
        let items = self.backend.checklist_items(record_id, object_name)?;
        let completed = self.backend.completed_checklist_actions(record_id)?;

        let completed_ids: HashSet<String> = completed
            .into_iter()
            .map(|action| action.checklist_item_id)
            .collect();

        Ok(gate_rows(items, &completed_ids))
    }

    /// Records a completion and re-evaluates the unlock rule over the whole
    /// list. Returns the completed item's label for the notification.
    pub fn complete(
        &self,
        rows: &mut [ChecklistRow],
        item_id: &str,
        record_id: &str,
        object_name: &str,
    ) -> Result<String, BackendError> {
        let row = rows
            .iter()
            .find(|row| row.item.record_id == item_id)
            .ok_or_else(|| BackendError::message(format!("unknown checklist item {item_id}")))?;

        if row.is_disabled {
            return Err(BackendError::message(
                "checklist item is not selectable yet",
            ));
        }
        let label = row.item.label.clone();

        self.backend
            .create_checklist_action(item_id, record_id, object_name)?;

        for row in rows.iter_mut() {
            if row.item.record_id == item_id {
                row.is_completed = true;
            }
        }
        regate(rows);

        Ok(label)
    }
}
