pub mod checklist_service;
pub mod forecast_service;
pub mod upload_service;
