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

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Start of a market dispatch interval
///
/// Markets exchange periods as compact `YYYYMMDDHHMM` strings. Keeping the
/// parsed timestamp lets ledgers and schedules sort by time instead of by text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDateTime);

impl Period {
    /// Wire format used by market and resource documents
    pub const FORMAT: &'static str = "%Y%m%d%H%M";

    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, Self::FORMAT).map(Self)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for Period {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw.trim()).map_err(|err| {
            serde::de::Error::custom(format!("invalid period '{raw}': {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_period_round_trips_wire_format() {
        let period = Period::parse("202408011305").unwrap();
        assert_eq!(period.to_string(), "202408011305");
        assert_eq!("202408011305".parse::<Period>().unwrap(), period);
    }

    #[test]
    fn test_period_orders_by_time() {
        let early = Period::parse("202408012355").unwrap();
        let late = Period::parse("202408020000").unwrap();
        assert!(early < late);
    }

    #[test]
    fn test_period_as_json_map_key() {
        let json = r#"{"202408010005": 2.0, "202408010000": 1.0}"#;
        let map: BTreeMap<Period, f64> = serde_json::from_str(json).unwrap();
        let keys: Vec<String> = map.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["202408010000", "202408010005"]);

        let out = serde_json::to_string(&map).unwrap();
        assert_eq!(out, r#"{"202408010000":1.0,"202408010005":2.0}"#);
    }

    #[test]
    fn test_period_rejects_garbage() {
        assert!(Period::parse("2024-08-01").is_err());
        assert!(serde_json::from_str::<Period>("\"tomorrow\"").is_err());
    }
}
