use crate::vitrage::settings::LayoutSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const LAYOUT_SETTINGS_FILE_NAME: &str = "vitrage_settings.json";

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(LAYOUT_SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

/// Load settings stored next to the executable, falling back to defaults when
/// no file exists yet.
pub fn load() -> Result<LayoutSettings> {
    let path = resolve_settings_path()?;
    Ok(load_from_path(&path)?.unwrap_or_default())
}

pub fn save(settings: &LayoutSettings) -> Result<PathBuf> {
    let path = resolve_settings_path()?;
    save_to_path(&path, settings)?;
    Ok(path)
}

pub fn load_from_path(path: &Path) -> Result<Option<LayoutSettings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read layout settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(Some(LayoutSettings::default()));
    }

    let mut loaded: LayoutSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize layout settings file {}", path.display()))?;
    loaded.sanitize();
    Ok(Some(loaded))
}

pub fn save_to_path(path: &Path, settings: &LayoutSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create layout settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = *settings;
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize layout settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write layout settings file {}", path.display()))
}
