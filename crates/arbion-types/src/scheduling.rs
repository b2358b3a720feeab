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

// ============= Dispatch Schedule =============

/// Per-period charge and discharge quantities over a horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Charging power per period (MW, non-negative)
    pub charge: Vec<f64>,
    /// Discharging power per period (MW, non-negative)
    pub discharge: Vec<f64>,
}

impl Schedule {
    pub fn new(charge: Vec<f64>, discharge: Vec<f64>) -> Self {
        Self { charge, discharge }
    }

    /// All-zero schedule over `periods` periods
    pub fn idle(periods: usize) -> Self {
        Self {
            charge: vec![0.0; periods],
            discharge: vec![0.0; periods],
        }
    }

    pub fn len(&self) -> usize {
        self.charge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge.is_empty()
    }

    /// Net flow per period, positive when discharging
    pub fn net_flow(&self) -> Vec<f64> {
        self.charge
            .iter()
            .zip(&self.discharge)
            .map(|(ch, dc)| dc - ch)
            .collect()
    }

    /// True when neither side moves any energy
    pub fn is_idle(&self) -> bool {
        self.charge.iter().all(|c| c.abs() == 0.0) && self.discharge.iter().all(|d| d.abs() == 0.0)
    }

    /// Stored energy before each period plus the final level, starting from zero
    pub fn soc_trajectory(&self, efficiency: f64) -> Vec<f64> {
        let mut soc = Vec::with_capacity(self.len() + 1);
        let mut level = 0.0;
        soc.push(level);
        for (ch, dc) in self.charge.iter().zip(&self.discharge) {
            level += efficiency * ch - dc;
            soc.push(level);
        }
        soc
    }

    /// Arbitrage profit: discharge revenue minus charging cost
    pub fn profit(&self, prices: &[f64]) -> f64 {
        prices
            .iter()
            .zip(self.charge.iter().zip(&self.discharge))
            .map(|(price, (ch, dc))| price * (dc - ch))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_flow_sign() {
        let schedule = Schedule::new(vec![10.0, 0.0], vec![0.0, 8.0]);
        assert_eq!(schedule.net_flow(), vec![-10.0, 8.0]);
    }

    #[test]
    fn test_soc_trajectory_applies_efficiency_on_charge() {
        let schedule = Schedule::new(vec![100.0, 0.0], vec![0.0, 50.0]);
        let soc = schedule.soc_trajectory(0.9);
        assert_eq!(soc.len(), 3);
        assert!((soc[1] - 90.0).abs() < 1e-9);
        assert!((soc[2] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_profit() {
        let schedule = Schedule::new(vec![10.0, 0.0], vec![0.0, 9.0]);
        assert!((schedule.profit(&[20.0, 50.0]) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle() {
        assert!(Schedule::idle(4).is_idle());
        assert!(!Schedule::new(vec![0.0, 1.0], vec![0.0, 0.0]).is_idle());
    }
}
