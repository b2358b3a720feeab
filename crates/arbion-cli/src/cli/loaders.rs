// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.

//! Reading input documents and writing offer files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arbion_types::{AgentConfig, MarketInfo, OfferDocument, ResourceInfo};
use serde::de::DeserializeOwned;
use tracing::info;

/// Load the agent configuration, falling back to defaults without a file
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AgentConfig::from_file(path)
        }
        None => Ok(AgentConfig::default()),
    }
}

pub fn load_market(path: &Path) -> Result<MarketInfo> {
    read_json(path)
}

pub fn load_resource(path: &Path) -> Result<ResourceInfo> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))
}

/// Write `offer_<time_step>.json` into `dir`, creating the directory if needed
pub fn write_offer(dir: &Path, time_step: &str, offer: &OfferDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(format!("offer_{time_step}.json"));
    let content = serde_json::to_string_pretty(offer).context("Failed to serialize offer")?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write offer file: {}", path.display()))?;

    info!("Saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_load_market_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("market.json");
        fs::write(
            &path,
            r#"{
                "market_type": "TSRTM",
                "uid": "TSRTM202408011200",
                "timestamps": ["202408011205", "202408011210"]
            }"#,
        )
        .unwrap();

        let market = load_market(&path).unwrap();
        assert_eq!(market.timestamps.len(), 2);
        assert!(market.previous.is_empty());
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let err = load_resource(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resource.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_resource(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse JSON file"));
    }

    #[test]
    fn test_write_offer_creates_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("offers");

        let path = write_offer(&out, "42", &BTreeMap::new()).unwrap();

        assert_eq!(path.file_name().unwrap(), "offer_42.json");
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }
}
