use std::path::PathBuf;

use anyhow::{Context, Result};

mod app;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;

#[cfg(test)]
mod tests;

use app::App;

fn main() {
    env_logger::init();

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create webview data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new()
                        .with_title("Forecast Desk")
                        .with_inner_size(dioxus::desktop::LogicalSize::new(1440.0, 900.0)),
                )
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let dirs = infra::config::project_dirs()?;
    let webview_data_dir = dirs.data_local_dir().join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn table_container_style() -> &'static str {
    "overflow-x: auto; border: 1px solid #ccc; border-radius: 6px;"
}

pub fn table_header_cell_style() -> &'static str {
    "border: 1px solid #ddd; padding: 6px 8px; background: #f2f2f2; text-align: right; white-space: nowrap;"
}

pub fn table_cell_style() -> &'static str {
    "border: 1px solid #eee; padding: 6px 8px;"
}
