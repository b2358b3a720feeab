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

use arbion_types::{BinningConfig, CurvePoint, CurveSide, OfferCurve, Period};
use tracing::debug;

use crate::error::{OfferError, Result};

/// Quantities below this are treated as zero when weighting bucket prices
const QUANTITY_EPSILON: f64 = 1e-9;

/// Compresses raw (quantity, price) pairs into a bounded monotonic step curve
///
/// Pairs are sorted by price and merged in two passes:
/// 1. prices closer than `price_resolution` collapse into one step
/// 2. if more than `max_bins` steps remain, they are regrouped into
///    `max_bins` equal-width price buckets
///
/// Quantities inside a step are summed, so the curve's total quantity is
/// preserved. Output is ascending in price for discharge curves and
/// descending for charge curves.
#[derive(Debug, Clone)]
pub struct CurveBinner {
    max_bins: usize,
    price_resolution: f64,
}

impl CurveBinner {
    pub fn new(config: &BinningConfig) -> Self {
        Self {
            max_bins: config.max_bins.max(1),
            price_resolution: config.price_resolution,
        }
    }

    /// Bin a curve; scalar curves pass through untouched
    pub fn collate(&self, curve: OfferCurve, side: CurveSide) -> Result<OfferCurve> {
        match curve {
            OfferCurve::Scalar(_) => Ok(curve),
            OfferCurve::Steps { quantities, prices } => {
                self.collate_lists(None, &quantities, &prices, side)
            }
        }
    }

    /// Bin parallel quantity and price lists belonging to `period`
    pub fn collate_lists(
        &self,
        period: Option<Period>,
        quantities: &[f64],
        prices: &[f64],
        side: CurveSide,
    ) -> Result<OfferCurve> {
        if quantities.len() != prices.len() {
            return Err(OfferError::malformed(
                period,
                format!(
                    "{} quantities but {} prices",
                    quantities.len(),
                    prices.len()
                ),
            ));
        }

        let mut points: Vec<CurvePoint> = quantities
            .iter()
            .zip(prices)
            .map(|(&q, &p)| CurvePoint::new(q, p))
            .collect();
        points.sort_by(|a, b| a.price.total_cmp(&b.price));

        let mut merged = self.merge_by_resolution(&points);
        if merged.len() > self.max_bins {
            merged = Self::merge_into_bins(&merged, self.max_bins);
        }
        if side == CurveSide::Charge {
            merged.reverse();
        }

        debug!(
            "{:?} curve{}: {} steps --> {} after binning",
            side,
            period.map(|p| format!(" in {p}")).unwrap_or_default(),
            points.len(),
            merged.len()
        );

        Ok(OfferCurve::from_points(&merged))
    }

    fn merge_by_resolution(&self, sorted: &[CurvePoint]) -> Vec<CurvePoint> {
        let mut merged = Vec::new();
        let mut start = 0;
        for idx in 1..=sorted.len() {
            let split = idx == sorted.len()
                || sorted[idx].price - sorted[start].price >= self.price_resolution;
            if split {
                merged.push(merge_group(&sorted[start..idx]));
                start = idx;
            }
        }
        merged
    }

    fn merge_into_bins(sorted: &[CurvePoint], bins: usize) -> Vec<CurvePoint> {
        let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
            return Vec::new();
        };
        let width = (last.price - first.price) / bins as f64;

        let mut merged = Vec::with_capacity(bins);
        let mut start = 0;
        let mut edge = first.price + width;
        let mut opened = 1;
        for (idx, point) in sorted.iter().enumerate() {
            // the last bucket is closed on the right and absorbs the maximum
            while point.price >= edge && opened < bins {
                if idx > start {
                    merged.push(merge_group(&sorted[start..idx]));
                    start = idx;
                }
                edge += width;
                opened += 1;
            }
        }
        if start < sorted.len() {
            merged.push(merge_group(&sorted[start..]));
        }
        merged
    }
}

/// Collapse a price-sorted, non-empty group into one step
fn merge_group(group: &[CurvePoint]) -> CurvePoint {
    let quantity: f64 = group.iter().map(|p| p.quantity).sum();
    let lowest = group[0].price;
    let highest = group[group.len() - 1].price;

    let weighted = group.iter().all(|p| p.quantity >= 0.0) && quantity > QUANTITY_EPSILON;
    let price = if weighted {
        let mean = group.iter().map(|p| p.quantity * p.price).sum::<f64>() / quantity;
        mean.max(lowest).min(highest)
    } else {
        lowest
    };

    CurvePoint::new(quantity, price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binner(max_bins: usize) -> CurveBinner {
        CurveBinner::new(&BinningConfig {
            max_bins,
            price_resolution: 0.01,
        })
    }

    fn prices_of(curve: &OfferCurve) -> Vec<f64> {
        curve.points().iter().map(|p| p.price).collect()
    }

    #[test]
    fn test_scalar_passes_through() {
        let curve = OfferCurve::scalar(125.0, 17.3);
        let out = binner(3).collate(curve.clone(), CurveSide::Charge).unwrap();
        assert_eq!(out, curve);
    }

    #[test]
    fn test_equal_prices_merge() {
        let out = binner(10)
            .collate_lists(None, &[10.0, 5.0, 2.0], &[20.0, 20.0, 30.0], CurveSide::Discharge)
            .unwrap();
        assert_eq!(
            out,
            OfferCurve::Steps {
                quantities: vec![15.0, 2.0],
                prices: vec![20.0, 30.0],
            }
        );
    }

    #[test]
    fn test_total_quantity_preserved() {
        let quantities: Vec<f64> = (0..40).map(|i| f64::from(i) * 1.5 + 0.25).collect();
        let prices: Vec<f64> = (0..40).map(|i| f64::from((i * 37) % 41)).collect();
        let input_total: f64 = quantities.iter().sum();

        let out = binner(6)
            .collate_lists(None, &quantities, &prices, CurveSide::Discharge)
            .unwrap();

        assert!(out.len() <= 6);
        assert!((out.total_quantity() - input_total).abs() < 1e-9);
    }

    #[test]
    fn test_discharge_prices_non_decreasing() {
        let out = binner(4)
            .collate_lists(
                None,
                &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
                &[50.0, 5.0, 999.0, 0.0, 12.0, 47.5, 300.0],
                CurveSide::Discharge,
            )
            .unwrap();
        let prices = prices_of(&out);
        assert!(prices.windows(2).all(|w| w[0] <= w[1]), "{prices:?}");
    }

    #[test]
    fn test_charge_prices_non_increasing() {
        let out = binner(4)
            .collate_lists(
                None,
                &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
                &[50.0, 5.0, 999.0, 0.0, 12.0, 47.5, 300.0],
                CurveSide::Charge,
            )
            .unwrap();
        let prices = prices_of(&out);
        assert!(prices.windows(2).all(|w| w[0] >= w[1]), "{prices:?}");
        assert!((out.total_quantity() - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_quantity_bucket_keeps_lowest_price() {
        let out = binner(10)
            .collate_lists(None, &[0.0, 0.0], &[40.0, 40.001], CurveSide::Discharge)
            .unwrap();
        assert_eq!(
            out,
            OfferCurve::Steps {
                quantities: vec![0.0],
                prices: vec![40.0],
            }
        );
    }

    #[test]
    fn test_single_bin_collapses_everything() {
        let out = binner(1)
            .collate_lists(None, &[10.0, 30.0], &[0.0, 100.0], CurveSide::Discharge)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!((out.points()[0].price - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let period = Period::parse("202408010000").unwrap();
        let err = binner(10)
            .collate_lists(Some(period), &[1.0, 2.0], &[3.0], CurveSide::Charge)
            .unwrap_err();
        assert!(matches!(err, OfferError::MalformedCurve { .. }));
        assert!(err.to_string().contains("202408010000"));
    }

    #[test]
    fn test_empty_lists() {
        let out = binner(10)
            .collate_lists(None, &[], &[], CurveSide::Charge)
            .unwrap();
        assert!(out.is_empty());
    }
}
