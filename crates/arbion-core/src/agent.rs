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

use std::collections::BTreeMap;
use std::sync::Arc;

use arbion_types::{
    AgentConfig, Ledger, MarketInfo, MarketKind, OfferDocument, ResourceInfo, ResourceOffer,
    ResourceStatus,
};
use tracing::{debug, info, warn};

use crate::assembler::OfferAssembler;
use crate::binning::CurveBinner;
use crate::error::{OfferError, Result};
use crate::opportunity::OpportunityCostEngine;
use crate::realtime::RealTimeCurveBuilder;
use crate::scheduling::{DispatchScheduler, DispatchSolver};

/// Runs one offer cycle for a storage resource
///
/// The market type decides the cycle: day-ahead markets are scheduled
/// against the previous clearing prices, real-time markets are built from
/// the resource's ledger. Nothing is carried between invocations.
#[derive(Debug, Clone)]
pub struct OfferAgent {
    config: AgentConfig,
    scheduler: DispatchScheduler,
    costs: OpportunityCostEngine,
    real_time: RealTimeCurveBuilder,
    assembler: OfferAssembler,
}

impl OfferAgent {
    /// Agent using the bundled LP backend
    pub fn new(config: AgentConfig) -> Self {
        let scheduler = DispatchScheduler::new(&config.battery);
        Self::build(config, scheduler)
    }

    pub fn with_solver(config: AgentConfig, solver: Arc<dyn DispatchSolver>) -> Self {
        let scheduler = DispatchScheduler::with_solver(solver, &config.battery);
        Self::build(config, scheduler)
    }

    fn build(config: AgentConfig, scheduler: DispatchScheduler) -> Self {
        Self {
            costs: OpportunityCostEngine::new(&config.battery, &config.pricing),
            real_time: RealTimeCurveBuilder::new(
                &config.battery,
                &config.pricing,
                CurveBinner::new(&config.binning),
            ),
            assembler: OfferAssembler::new(&config),
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &DispatchScheduler {
        &self.scheduler
    }

    pub fn cost_engine(&self) -> &OpportunityCostEngine {
        &self.costs
    }

    /// Produce the offer document for `resource` in `market`
    pub fn make_offer(
        &self,
        market: &MarketInfo,
        resource: &ResourceInfo,
    ) -> Result<OfferDocument> {
        let kind = market
            .kind()
            .ok_or_else(|| OfferError::UnknownMarketType(market.market_type.clone()))?;

        let offer = match kind {
            MarketKind::DayAhead => self.day_ahead_offer(market, resource)?,
            MarketKind::RealTime => self.real_time_offer(market, resource)?,
        };
        Ok(BTreeMap::from([(resource.rid.clone(), offer)]))
    }

    /// Previous clearing prices for the day-ahead horizon
    ///
    /// The configured bus wins over the resource's own bus. The list is cut
    /// to the horizon length.
    pub fn day_ahead_prices<'a>(
        &self,
        market: &'a MarketInfo,
        resource: &ResourceInfo,
    ) -> Result<&'a [f64]> {
        let bus = self
            .config
            .market
            .price_bus
            .as_deref()
            .or(resource.bus.as_deref())
            .unwrap_or_default();
        let prices = market
            .previous_prices(bus)
            .ok_or_else(|| OfferError::MissingPrices {
                market_type: market.market_type.clone(),
                bus: bus.to_owned(),
            })?;

        let horizon = market.timestamps.len();
        if horizon == 0 {
            return Err(OfferError::EmptyForecast);
        }
        if prices.len() < horizon {
            return Err(OfferError::ForecastLength {
                expected: horizon,
                actual: prices.len(),
            });
        }
        if prices.len() > horizon {
            debug!(
                "Using the first {horizon} of {} previous prices at {bus}",
                prices.len()
            );
        }
        Ok(&prices[..horizon])
    }

    fn day_ahead_offer(
        &self,
        market: &MarketInfo,
        resource: &ResourceInfo,
    ) -> Result<ResourceOffer> {
        info!("Generating DA offer for {}", resource.rid);
        let status = own_status(resource)?;
        let prices = self.day_ahead_prices(market, resource)?;

        let schedule = self.scheduler.schedule(prices)?;
        let costs = self.costs.compute(prices, &schedule)?;

        let Some(first) = market.horizon_start() else {
            return Err(OfferError::EmptyForecast);
        };
        let initial = self
            .assembler
            .estimate_initial_state(resource, status, market.now(), first);
        debug!("DA start: soc {:.3}, dispatch {:.3}", initial.soc_begin, initial.init_en);

        let offer = self
            .assembler
            .day_ahead(&market.timestamps, &schedule, &costs, initial)?;
        debug!("Ready to save DA offer");
        Ok(offer)
    }

    fn real_time_offer(
        &self,
        market: &MarketInfo,
        resource: &ResourceInfo,
    ) -> Result<ResourceOffer> {
        info!("Generating RT offer for {}", resource.rid);
        let status = own_status(resource)?;

        let empty = Ledger::new();
        let ledger = resource.energy_ledger().unwrap_or_else(|| {
            debug!("No energy ledger for {}, offering slack only", resource.rid);
            &empty
        });

        let curves = self
            .real_time
            .build(&market.timestamps, status.soc, ledger)?;
        if !curves.warnings.is_empty() {
            warn!(
                "{} ledger entries exceeded the SoC bounds for {}",
                curves.warnings.len(),
                resource.rid
            );
        }
        self.assembler
            .real_time(&market.timestamps, curves, status)
    }
}

fn own_status(resource: &ResourceInfo) -> Result<&ResourceStatus> {
    resource
        .own_status()
        .ok_or_else(|| OfferError::MissingResource(format!("status for {}", resource.rid)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbion_types::{
        BlockValue, MarketPrices, Period, PreviousMarket, ProductLedger, LedgerEntry,
    };

    fn horizon(len: u32) -> Vec<Period> {
        (0..len)
            .map(|i| Period::parse(&format!("2024080200{:02}", i * 5)).unwrap())
            .collect()
    }

    fn market(market_type: &str, prices: Vec<f64>, len: u32) -> MarketInfo {
        MarketInfo {
            market_type: market_type.to_owned(),
            timestamps: horizon(len),
            uid: Some(format!("{market_type}202408011200")),
            current_time: None,
            previous: BTreeMap::from([(
                market_type.to_owned(),
                PreviousMarket {
                    prices: MarketPrices {
                        energy: BTreeMap::from([("NEVP".to_owned(), prices)]),
                    },
                },
            )]),
        }
    }

    fn resource() -> ResourceInfo {
        ResourceInfo {
            rid: "R00229".to_owned(),
            bus: Some("NEVP".to_owned()),
            status: BTreeMap::from([(
                "R00229".to_owned(),
                ResourceStatus {
                    soc: 228.0,
                    dispatch: 0.0,
                },
            )]),
            schedule: BTreeMap::new(),
            ledger: BTreeMap::new(),
        }
    }

    #[test]
    fn test_day_ahead_cycle() {
        let market = market("TSDAM", vec![10.0, 10.0, 50.0, 50.0], 4);
        let document = OfferAgent::new(AgentConfig::default())
            .make_offer(&market, &resource())
            .unwrap();

        let offer = &document["R00229"];
        assert!(!offer.constants.bid_soc);
        assert_eq!(offer.block_ch_mq.len(), 4);
        assert!(matches!(offer.block_ch_mq[&horizon(4)[0]], BlockValue::Flat(q) if q > 124.0));
        assert!(matches!(offer.block_dc_mq[&horizon(4)[3]], BlockValue::Flat(q) if q > 0.0));
    }

    #[test]
    fn test_real_time_cycle() {
        let mut resource = resource();
        resource.ledger.insert(
            "R00229".to_owned(),
            ProductLedger {
                energy: BTreeMap::from([(horizon(3)[1], vec![LedgerEntry::new(-120.0, 15.0)])]),
            },
        );
        let market = market("TSRTM", Vec::new(), 3);

        let document = OfferAgent::new(AgentConfig::default())
            .make_offer(&market, &resource)
            .unwrap();

        let offer = &document["R00229"];
        assert!(offer.constants.bid_soc);
        assert_eq!(offer.block_soc_mq.len(), 1);
        assert!(offer.block_soc_mq.contains_key(&horizon(3)[2]));
        assert_eq!(offer.block_ch_mq[&horizon(3)[0]], BlockValue::Steps(vec![125.0]));
    }

    #[test]
    fn test_unknown_market_type() {
        let market = market("TSXYZ", vec![10.0], 1);
        let err = OfferAgent::new(AgentConfig::default())
            .make_offer(&market, &resource())
            .unwrap_err();
        assert!(matches!(err, OfferError::UnknownMarketType(t) if t == "TSXYZ"));
    }

    #[test]
    fn test_missing_prices_names_bus() {
        let mut resource = resource();
        resource.bus = Some("WALC".to_owned());
        let err = OfferAgent::new(AgentConfig::default())
            .make_offer(&market("TSDAM", vec![10.0, 50.0], 2), &resource)
            .unwrap_err();
        assert!(matches!(err, OfferError::MissingPrices { ref bus, .. } if bus == "WALC"));
    }

    #[test]
    fn test_configured_bus_overrides_resource_bus() {
        let mut config = AgentConfig::default();
        config.market.price_bus = Some("NEVP".to_owned());
        let mut resource = resource();
        resource.bus = Some("WALC".to_owned());
        let market = market("TSDAM", vec![10.0, 50.0, 20.0], 2);

        let prices = OfferAgent::new(config)
            .day_ahead_prices(&market, &resource)
            .unwrap()
            .to_vec();
        assert_eq!(prices, vec![10.0, 50.0]);
    }

    #[test]
    fn test_short_price_list() {
        let err = OfferAgent::new(AgentConfig::default())
            .make_offer(&market("TSDAM", vec![10.0, 50.0], 4), &resource())
            .unwrap_err();
        assert!(matches!(
            err,
            OfferError::ForecastLength {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_missing_status() {
        let mut resource = resource();
        resource.status.clear();
        let err = OfferAgent::new(AgentConfig::default())
            .make_offer(&market("TSRTM", Vec::new(), 2), &resource)
            .unwrap_err();
        assert!(matches!(err, OfferError::MissingResource(_)));
    }
}
