use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::checklist::ChecklistRow;
use crate::domain::entities::forecast::{FulfillmentMethod, VolumeUnit};
use crate::domain::entities::panel::MethodPanel;
use crate::infra::import::file_check::CandidateFile;
use crate::usecase::ports::backend::{CsvValidation, UploadResult};
use crate::usecase::ports::notify::Notification;
use crate::usecase::services::forecast_service::{ForecastContext, ProductForecast, ProductRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Products,
    Detail,
    Upload,
    Checklist,
}

pub struct AppState {
    pub screen: Signal<Screen>,
    pub products: Signal<Vec<ProductRow>>,
    pub has_more: Signal<bool>,
    pub page: Signal<i64>,
    pub search: Signal<String>,
    pub selected: Signal<Option<ForecastContext>>,
    pub forecast: Signal<Option<ProductForecast>>,
    pub direct_panel: Signal<MethodPanel>,
    pub local_panel: Signal<MethodPanel>,
    pub volume: Signal<VolumeUnit>,
    pub price_input: Signal<String>,
    pub warehouse_input: Signal<String>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
    pub notices: Signal<Vec<Notification>>,
    pub upload_candidate: Signal<Option<CandidateFile>>,
    pub upload_content: Signal<String>,
    pub upload_errors: Signal<Vec<String>>,
    pub upload_row_count: Signal<usize>,
    pub upload_validation: Signal<Option<CsvValidation>>,
    pub upload_result: Signal<Option<UploadResult>>,
    pub checklist: Signal<Vec<ChecklistRow>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: use_signal(|| Screen::Products),
            products: use_signal(Vec::<ProductRow>::new),
            has_more: use_signal(|| false),
            page: use_signal(|| 1_i64),
            search: use_signal(String::new),
            selected: use_signal(|| None::<ForecastContext>),
            forecast: use_signal(|| None::<ProductForecast>),
            direct_panel: use_signal(|| MethodPanel::new(FulfillmentMethod::Direct)),
            local_panel: use_signal(|| MethodPanel::new(FulfillmentMethod::Local)),
            volume: use_signal(|| VolumeUnit::Pieces),
            price_input: use_signal(String::new),
            warehouse_input: use_signal(String::new),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
            notices: use_signal(Vec::<Notification>::new),
            upload_candidate: use_signal(|| None::<CandidateFile>),
            upload_content: use_signal(String::new),
            upload_errors: use_signal(Vec::<String>::new),
            upload_row_count: use_signal(|| 0_usize),
            upload_validation: use_signal(|| None::<CsvValidation>),
            upload_result: use_signal(|| None::<UploadResult>),
            checklist: use_signal(Vec::<ChecklistRow>::new),
        }
    }
}
