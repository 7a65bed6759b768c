use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

/// Runtime configuration, read once at startup from the per-user config file
/// with environment variable overrides on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub account_id: String,
    pub checklist_record_id: String,
    pub checklist_object: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_token: None,
            account_id: String::new(),
            checklist_record_id: String::new(),
            checklist_object: "Tender".to_string(),
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "forecast-desk", "forecast-desk")
        .ok_or_else(|| anyhow!("failed to resolve user directories"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    let mut config = if path.exists() {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config: {}", path.display()))?
    } else {
        AppConfig::default()
    };

    if let Ok(base_url) = env::var("FORECAST_DESK_BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(token) = env::var("FORECAST_DESK_API_TOKEN") {
        config.api_token = Some(token);
    }
    if let Ok(account_id) = env::var("FORECAST_DESK_ACCOUNT_ID") {
        config.account_id = account_id;
    }

    Ok(config)
}
