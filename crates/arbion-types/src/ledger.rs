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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::period::Period;

/// An order already accepted by the market
///
/// Quantity is power: negative charges the battery, positive discharges it.
/// Documents carry entries as `[quantity, price]` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct LedgerEntry {
    pub quantity: f64,
    pub price: f64,
}

impl LedgerEntry {
    pub fn new(quantity: f64, price: f64) -> Self {
        Self { quantity, price }
    }

    /// Energy moved over one interval of `interval_hours`
    pub fn energy(&self, interval_hours: f64) -> f64 {
        self.quantity * interval_hours
    }
}

impl From<(f64, f64)> for LedgerEntry {
    fn from((quantity, price): (f64, f64)) -> Self {
        Self { quantity, price }
    }
}

impl From<LedgerEntry> for (f64, f64) {
    fn from(entry: LedgerEntry) -> Self {
        (entry.quantity, entry.price)
    }
}

/// Accepted orders keyed by period, in time order
pub type Ledger = BTreeMap<Period, Vec<LedgerEntry>>;

/// Entries strictly after `last`, flattened in period order
pub fn entries_after(ledger: &Ledger, last: Period) -> Vec<LedgerEntry> {
    ledger
        .range((std::ops::Bound::Excluded(last), std::ops::Bound::Unbounded))
        .flat_map(|(_, entries)| entries.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_json_pair() {
        let entry: LedgerEntry = serde_json::from_str("[-50.0, 12.5]").unwrap();
        assert_eq!(entry.quantity, -50.0);
        assert_eq!(entry.price, 12.5);
        assert_eq!(serde_json::to_string(&entry).unwrap(), "[-50.0,12.5]");
    }

    #[test]
    fn test_energy_uses_interval() {
        let entry = LedgerEntry::new(600.0, 30.0);
        assert!((entry.energy(5.0 / 60.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_entries_after_excludes_boundary() {
        let mut ledger = Ledger::new();
        let [p0, p1, p2] = ["202408010000", "202408010005", "202408010010"]
            .map(|raw| Period::parse(raw).unwrap());
        ledger.insert(p0, vec![LedgerEntry::new(1.0, 1.0)]);
        ledger.insert(p1, vec![LedgerEntry::new(2.0, 2.0)]);
        ledger.insert(
            p2,
            vec![LedgerEntry::new(3.0, 3.0), LedgerEntry::new(4.0, 4.0)],
        );

        let after = entries_after(&ledger, p1);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].quantity, 3.0);
    }
}
