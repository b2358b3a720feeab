// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============= Agent Configuration =============

/// Complete configuration for one offer-generating agent
///
/// Every section has defaults matching the standard market battery, so an
/// empty TOML file (or no file at all) yields a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub binning: BinningConfig,
    #[serde(default)]
    pub market: MarketSettings,
    #[serde(default)]
    pub constants: OfferConstantsConfig,
}

/// Physical limits of the storage resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Maximum state of charge (MWh)
    #[serde(default = "default_socmax")]
    pub socmax: f64,
    /// Minimum state of charge (MWh)
    #[serde(default = "default_socmin")]
    pub socmin: f64,
    /// Maximum charging power (MW)
    #[serde(default = "default_chmax")]
    pub chmax: f64,
    /// Maximum discharging power (MW)
    #[serde(default = "default_dcmax")]
    pub dcmax: f64,
    /// Charging efficiency (0.0 to 1.0], discharge efficiency is fixed at 1.0
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Length of one dispatch interval in minutes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
}

/// Price bounds and post-assembly adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub price_floor: f64,
    #[serde(default = "default_price_ceiling")]
    pub price_ceiling: f64,
    /// Added to every discharge price after assembly ($/MWh)
    #[serde(default = "default_discharge_markup")]
    pub discharge_markup: f64,
    /// Subtracted from every charge price after assembly ($/MWh)
    #[serde(default)]
    pub charge_markdown: f64,
    /// Clamp day-ahead opportunity costs into [price_floor, price_ceiling]
    #[serde(default = "default_true")]
    pub clamp_day_ahead_prices: bool,
}

/// Offer curve compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Upper bound on the number of steps in a binned curve
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
    /// Prices closer than this are merged into one step ($/MWh)
    #[serde(default = "default_price_resolution")]
    pub price_resolution: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSettings {
    /// Price node used to read day-ahead prices; falls back to the resource bus
    #[serde(default)]
    pub price_bus: Option<String>,
}

/// Static values copied into every offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferConstantsConfig {
    #[serde(default = "default_ramp")]
    pub ramp_up: f64,
    #[serde(default = "default_ramp")]
    pub ramp_dn: f64,
    #[serde(default = "default_init_status")]
    pub init_status: i32,
}

// Default value functions for serde
fn default_socmax() -> f64 {
    608.0
}
fn default_socmin() -> f64 {
    128.0
}
fn default_chmax() -> f64 {
    125.0
}
fn default_dcmax() -> f64 {
    125.0
}
fn default_efficiency() -> f64 {
    0.892
}
fn default_interval_minutes() -> u32 {
    5
}
fn default_price_ceiling() -> f64 {
    999.0
}
fn default_discharge_markup() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_max_bins() -> usize {
    10
}
fn default_price_resolution() -> f64 {
    0.01
}
fn default_ramp() -> f64 {
    9999.0
}
fn default_init_status() -> i32 {
    1
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            socmax: default_socmax(),
            socmin: default_socmin(),
            chmax: default_chmax(),
            dcmax: default_dcmax(),
            efficiency: default_efficiency(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

impl BatteryConfig {
    /// Usable energy between the SoC bounds (MWh)
    pub fn capacity(&self) -> f64 {
        self.socmax - self.socmin
    }

    /// Interval length as a fraction of an hour, converts MW to MWh
    pub fn interval_hours(&self) -> f64 {
        f64::from(self.interval_minutes) / 60.0
    }

    /// Clamp a state of charge into [socmin, socmax]
    pub fn clamp_soc(&self, soc: f64) -> f64 {
        soc.max(self.socmin).min(self.socmax)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_floor: 0.0,
            price_ceiling: default_price_ceiling(),
            discharge_markup: default_discharge_markup(),
            charge_markdown: 0.0,
            clamp_day_ahead_prices: true,
        }
    }
}

impl PricingConfig {
    pub fn clamp(&self, price: f64) -> f64 {
        price.max(self.price_floor).min(self.price_ceiling)
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            max_bins: default_max_bins(),
            price_resolution: default_price_resolution(),
        }
    }
}

impl Default for OfferConstantsConfig {
    fn default() -> Self {
        Self {
            ramp_up: default_ramp(),
            ramp_dn: default_ramp(),
            init_status: default_init_status(),
        }
    }
}

impl AgentConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let battery = &self.battery;
        if battery.socmin < 0.0 {
            bail!("battery.socmin must be non-negative");
        }
        if battery.socmin >= battery.socmax {
            bail!(
                "battery.socmin ({}) must be less than battery.socmax ({})",
                battery.socmin,
                battery.socmax
            );
        }
        if battery.chmax <= 0.0 || battery.dcmax <= 0.0 {
            bail!("battery.chmax and battery.dcmax must be positive");
        }
        if battery.efficiency <= 0.0 || battery.efficiency > 1.0 {
            bail!("battery.efficiency must be in (0.0, 1.0]");
        }
        if battery.interval_minutes == 0 {
            bail!("battery.interval_minutes must be at least 1");
        }

        if self.pricing.price_floor >= self.pricing.price_ceiling {
            bail!("pricing.price_floor must be less than pricing.price_ceiling");
        }

        if self.binning.max_bins == 0 {
            bail!("binning.max_bins must be at least 1");
        }
        if self.binning.price_resolution <= 0.0 {
            bail!("binning.price_resolution must be positive");
        }
        Ok(())
    }
}
