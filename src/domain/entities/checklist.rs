use std::collections::HashSet;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub record_id: String,
    pub label: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedAction {
    pub checklist_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistRow {
    pub item: ChecklistItem,
    pub is_completed: bool,
    pub is_selectable: bool,
    pub is_disabled: bool,
}

/// Sorts items by their order field and applies the sequential unlock rule:
/// an item is selectable only when it is first or its predecessor is
/// completed, and disabled when not selectable or already completed.
pub fn gate_rows(mut items: Vec<ChecklistItem>, completed: &HashSet<String>) -> Vec<ChecklistRow> {
    items.sort_by_key(|item| item.order);

    let mut previous_completed = true;
    items
        .into_iter()
        .map(|item| {
            let is_completed = completed.contains(&item.record_id);
            let is_selectable = previous_completed;
            previous_completed = is_completed;

            ChecklistRow {
                is_completed,
                is_selectable,
                is_disabled: !is_selectable || is_completed,
                item,
            }
        })
        .collect()
}

/// Recomputes selectability for every row from the current completion flags.
/// Runs over the whole list after each mutation; the rule is global, never an
/// incremental patch of the next row.
pub fn regate(rows: &mut [ChecklistRow]) {
    let mut previous_completed = true;
    for row in rows.iter_mut() {
        row.is_selectable = previous_completed;
        row.is_disabled = !row.is_selectable || row.is_completed;
        previous_completed = row.is_completed;
    }
}
