pub mod checklist;
pub mod draft;
pub mod forecast;
pub mod panel;
