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

//! Market and resource documents shared by the end-to-end tests.
//!
//! Fixtures are built as JSON first so the tests go through the same
//! deserialization path as documents read from disk.

use anyhow::{Context, Result};
use arbion_types::{MarketInfo, ResourceInfo};
use serde_json::{Value, json};

pub const RID: &str = "R00229";
pub const BUS: &str = "NEVP";

/// Invocation time encoded in the market uid
pub const NOW: &str = "202408011200";

/// `len` five-minute periods starting at midnight of 2024-08-02
pub fn horizon(len: u32) -> Vec<String> {
    (0..len)
        .map(|i| {
            let minutes = i * 5;
            format!(
                "20240802{:02}{:02}",
                minutes.div_euclid(60),
                minutes.rem_euclid(60)
            )
        })
        .collect()
}

/// Day-ahead market with previous clearing prices at [`BUS`]
pub fn day_ahead_market(prices: &[f64]) -> Value {
    let len = u32::try_from(prices.len()).unwrap_or(u32::MAX);
    json!({
        "market_type": "TSDAM",
        "uid": format!("TSDAM{NOW}"),
        "timestamps": horizon(len),
        "previous": {"TSDAM": {"prices": {"EN": {BUS: prices}}}}
    })
}

pub fn real_time_market(len: u32) -> Value {
    json!({
        "market_type": "TSRTM",
        "uid": format!("TSRTM{NOW}"),
        "timestamps": horizon(len),
    })
}

/// Resource with a status and no schedule or ledger
pub fn resource(soc: f64) -> Value {
    json!({
        "rid": RID,
        "bus": BUS,
        "status": {RID: {"soc": soc, "dispatch": 0.0}},
    })
}

/// Attach an energy schedule of `(period, MW)` pairs to a resource document
pub fn with_schedule(mut resource: Value, schedule: &[(&str, f64)]) -> Value {
    let energy: serde_json::Map<String, Value> = schedule
        .iter()
        .map(|&(period, quantity)| (period.to_owned(), json!(quantity)))
        .collect();
    resource["schedule"] = json!({RID: {"EN": energy}});
    resource
}

/// Attach an energy ledger of `(period, [(MW, $/MWh)])` entries to a resource document
pub fn with_ledger(mut resource: Value, ledger: &[(&str, &[(f64, f64)])]) -> Value {
    let energy: serde_json::Map<String, Value> = ledger
        .iter()
        .map(|&(period, entries)| {
            let entries: Vec<Value> = entries.iter().map(|&(q, p)| json!([q, p])).collect();
            (period.to_owned(), Value::Array(entries))
        })
        .collect();
    resource["ledger"] = json!({RID: {"EN": energy}});
    resource
}

pub fn market_info(value: Value) -> Result<MarketInfo> {
    serde_json::from_value(value).context("Failed to parse market fixture")
}

pub fn resource_info(value: Value) -> Result<ResourceInfo> {
    serde_json::from_value(value).context("Failed to parse resource fixture")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_rolls_over_the_hour() {
        let periods = horizon(14);
        assert_eq!(periods[0], "202408020000");
        assert_eq!(periods[11], "202408020055");
        assert_eq!(periods[12], "202408020100");
    }

    #[test]
    fn test_fixtures_parse() {
        let market = market_info(day_ahead_market(&[10.0, 50.0])).unwrap();
        assert_eq!(market.previous_prices(BUS), Some(&[10.0, 50.0][..]));

        let resource = resource_info(with_ledger(
            resource(300.0),
            &[("202408020000", &[(-100.0, 12.0)])],
        ))
        .unwrap();
        assert_eq!(resource.own_status().unwrap().soc, 300.0);
        assert_eq!(resource.energy_ledger().unwrap().len(), 1);
    }
}
