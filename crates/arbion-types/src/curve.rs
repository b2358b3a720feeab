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

/// Which side of the market a curve bids into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveSide {
    /// Buying energy, steps ordered from highest to lowest price
    Charge,
    /// Selling energy, steps ordered from lowest to highest price
    Discharge,
}

/// One (quantity, price) offer increment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub quantity: f64,
    pub price: f64,
}

impl CurvePoint {
    pub fn new(quantity: f64, price: f64) -> Self {
        Self { quantity, price }
    }
}

/// Offer curve for a single period
///
/// Day-ahead offers carry a single scheduled quantity at its opportunity cost,
/// real-time offers carry a list of steps. The two shapes are kept apart so
/// that consumers never have to guess which one they hold.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferCurve {
    Scalar(CurvePoint),
    Steps {
        quantities: Vec<f64>,
        prices: Vec<f64>,
    },
}

impl OfferCurve {
    pub fn scalar(quantity: f64, price: f64) -> Self {
        Self::Scalar(CurvePoint::new(quantity, price))
    }

    pub fn from_points(points: &[CurvePoint]) -> Self {
        Self::Steps {
            quantities: points.iter().map(|p| p.quantity).collect(),
            prices: points.iter().map(|p| p.price).collect(),
        }
    }

    /// Number of steps (a scalar counts as one)
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Steps { quantities, .. } => quantities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_quantity(&self) -> f64 {
        match self {
            Self::Scalar(point) => point.quantity,
            Self::Steps { quantities, .. } => quantities.iter().sum(),
        }
    }

    pub fn points(&self) -> Vec<CurvePoint> {
        match self {
            Self::Scalar(point) => vec![*point],
            Self::Steps { quantities, prices } => quantities
                .iter()
                .zip(prices)
                .map(|(&q, &p)| CurvePoint::new(q, p))
                .collect(),
        }
    }

    /// Shift every price by `delta` without carrying it past `floor` or
    /// `ceiling`; a price already outside the bounds is never moved further out
    pub fn shift_prices(&mut self, delta: f64, floor: f64, ceiling: f64) {
        match self {
            Self::Scalar(point) => {
                point.price = shift_within(point.price, delta, floor, ceiling);
            }
            Self::Steps { prices, .. } => {
                for price in prices.iter_mut() {
                    *price = shift_within(*price, delta, floor, ceiling);
                }
            }
        }
    }

    /// Split into the (quantity, price) block values written to offer files
    pub fn into_blocks(self) -> (BlockValue, BlockValue) {
        match self {
            Self::Scalar(point) => (BlockValue::Flat(point.quantity), BlockValue::Flat(point.price)),
            Self::Steps { quantities, prices } => {
                (BlockValue::Steps(quantities), BlockValue::Steps(prices))
            }
        }
    }
}

/// Quantity or price block as it appears in offer documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    Flat(f64),
    Steps(Vec<f64>),
}

impl BlockValue {
    pub fn shape(&self) -> String {
        match self {
            Self::Flat(_) => "scalar".to_owned(),
            Self::Steps(values) => format!("list of {}", values.len()),
        }
    }
}

fn shift_within(price: f64, delta: f64, floor: f64, ceiling: f64) -> f64 {
    let shifted = price + delta;
    if delta > 0.0 {
        shifted.min(ceiling.max(price))
    } else {
        shifted.max(floor.min(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_curve_basics() {
        let curve = OfferCurve::scalar(125.0, 20.0);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.total_quantity(), 125.0);
        assert_eq!(curve.points(), vec![CurvePoint::new(125.0, 20.0)]);
    }

    #[test]
    fn test_shift_prices_on_steps() {
        let mut curve = OfferCurve::from_points(&[
            CurvePoint::new(10.0, 5.0),
            CurvePoint::new(20.0, 7.5),
        ]);
        curve.shift_prices(1.0, 0.0, 999.0);
        assert_eq!(
            curve,
            OfferCurve::Steps {
                quantities: vec![10.0, 20.0],
                prices: vec![6.0, 8.5],
            }
        );
    }

    #[test]
    fn test_shift_prices_stops_at_bounds() {
        let mut curve = OfferCurve::from_points(&[
            CurvePoint::new(10.0, 998.5),
            CurvePoint::new(20.0, 999.0),
            CurvePoint::new(5.0, 1200.0),
        ]);
        curve.shift_prices(1.0, 0.0, 999.0);
        let prices: Vec<f64> = curve.points().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![999.0, 999.0, 1200.0]);

        let mut curve = OfferCurve::scalar(10.0, 0.5);
        curve.shift_prices(-1.0, 0.0, 999.0);
        assert_eq!(curve, OfferCurve::scalar(10.0, 0.0));

        let mut curve = OfferCurve::scalar(10.0, -5.0);
        curve.shift_prices(-1.0, 0.0, 999.0);
        assert_eq!(curve, OfferCurve::scalar(10.0, -5.0));
    }

    #[test]
    fn test_block_value_untagged_json() {
        let flat: BlockValue = serde_json::from_str("3.5").unwrap();
        let steps: BlockValue = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(flat, BlockValue::Flat(3.5));
        assert_eq!(steps, BlockValue::Steps(vec![1.0, 2.0]));
        assert_eq!(steps.shape(), "list of 2");
    }

    #[test]
    fn test_into_blocks_keeps_shape() {
        let (mq, mc) = OfferCurve::scalar(1.0, 2.0).into_blocks();
        assert_eq!(mq, BlockValue::Flat(1.0));
        assert_eq!(mc, BlockValue::Flat(2.0));
    }
}
