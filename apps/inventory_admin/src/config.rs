use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::{
    api::DEFAULT_REQUEST_TIMEOUT,
    currency::DEFAULT_GROUP_SEPARATOR,
    list::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_WINDOW},
    FieldKind, FieldSpec, FormSchema,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "inventory-admin.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub page_window: u32,
    pub request_timeout_secs: u64,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub currency_separator: char,
    pub collections: Vec<CollectionSettings>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionSettings {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl CollectionSettings {
    fn new(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_window: DEFAULT_PAGE_WINDOW,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            token: None,
            token_file: None,
            currency_separator: DEFAULT_GROUP_SEPARATOR,
            collections: default_collections(),
        }
    }
}

impl Settings {
    pub fn schema_for(&self, collection: &str) -> Option<FormSchema> {
        self.collections
            .iter()
            .find(|c| c.name == collection)
            .map(|c| FormSchema::new(c.fields.clone()))
    }
}

/// The five inventory collections with the fields the admin screens edit.
pub fn default_collections() -> Vec<CollectionSettings> {
    use FieldKind::{Currency, Date, Text};
    vec![
        CollectionSettings::new(
            "assets",
            vec![
                FieldSpec::new("kode_aset", Text).required(),
                FieldSpec::new("nama_aset", Text).required(),
                FieldSpec::new("tanggal_perolehan", Date),
                FieldSpec::new("harga", Currency),
            ],
        ),
        CollectionSettings::new(
            "placements",
            vec![
                FieldSpec::new("asset_id", Text).required(),
                FieldSpec::new("lokasi", Text).required(),
                FieldSpec::new("tanggal_penempatan", Date),
            ],
        ),
        CollectionSettings::new(
            "mutations",
            vec![
                FieldSpec::new("asset_id", Text).required(),
                FieldSpec::new("lokasi_asal", Text),
                FieldSpec::new("lokasi_tujuan", Text).required(),
                FieldSpec::new("tanggal_mutasi", Date),
            ],
        ),
        CollectionSettings::new(
            "maintenances",
            vec![
                FieldSpec::new("asset_id", Text).required(),
                FieldSpec::new("tanggal", Date),
                FieldSpec::new("keterangan", Text),
                FieldSpec::new("biaya", Currency),
            ],
        ),
        CollectionSettings::new(
            "disposals",
            vec![
                FieldSpec::new("asset_id", Text).required(),
                FieldSpec::new("tanggal", Date),
                FieldSpec::new("alasan", Text),
                FieldSpec::new("nilai", Currency),
            ],
        ),
    ]
}

/// Defaults, then the config file, then environment overrides. An explicit `path` must exist;
/// the default file is optional.
pub fn load_settings(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            read_settings_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => Settings::default(),
    };
    apply_env_overrides(&mut settings, env);
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_settings(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

pub fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    let var = |names: &[&str]| names.iter().find_map(|name| env(name));

    if let Some(v) = var(&["INVENTORY_API_URL", "APP__API_BASE_URL"]) {
        settings.api_base_url = v;
    }
    if let Some(v) = var(&["INVENTORY_PAGE_SIZE", "APP__PAGE_SIZE"]) {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.page_size = parsed.max(1);
        }
    }
    if let Some(v) = var(&["APP__PAGE_WINDOW"]) {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.page_window = parsed.max(1);
        }
    }
    if let Some(v) = var(&["APP__REQUEST_TIMEOUT_SECS"]) {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = var(&["INVENTORY_TOKEN", "APP__TOKEN"]) {
        settings.token = Some(v);
    }
    if let Some(v) = var(&["INVENTORY_TOKEN_FILE", "APP__TOKEN_FILE"]) {
        settings.token_file = Some(PathBuf::from(v));
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
