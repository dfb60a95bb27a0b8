//! End-to-end scouting: discovery records in, ranked offers out.
//!
//! Each restaurant is calibrated, given a menu and delivery info from its own
//! seed, and the resulting candidates are ranked. Restaurants are independent,
//! so a bad one is handled per the batch policy without touching the rest.

use common::config::{BatchPolicy, ScoutConfig};
use common::{Candidate, RankedOffer, RestaurantRecord, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::{parse_candidates, parse_restaurants, BatchParse, RejectedEntry};
use crate::calibration::{CalibrationRecord, PriceCalibrator};
use crate::delivery::DeliverySynthesizer;
use crate::menu::synthesize_menu;
use crate::rank::{rank_with, RankOptions};

/// Result of one scouting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutReport {
    pub cheapest: Option<RankedOffer>,
    pub offers: Vec<RankedOffer>,
    pub restaurants_checked: usize,
    pub offers_found: usize,
    pub rejected: Vec<RejectedEntry>,
    /// Restaurants priced from the fallback tier for lack of any signal.
    pub uncalibrated: Vec<String>,
}

impl ScoutReport {
    fn new(offers: Vec<RankedOffer>, total: usize, rejected: Vec<RejectedEntry>) -> Self {
        Self {
            cheapest: offers.first().cloned(),
            offers_found: offers.len(),
            offers,
            restaurants_checked: total,
            rejected,
            uncalibrated: Vec::new(),
        }
    }
}

/// Everything the pipeline derives for one restaurant.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub calibration: CalibrationRecord,
    pub candidate: Candidate,
}

/// Stateless pipeline over one configuration.
pub struct Scout {
    config: ScoutConfig,
    calibrator: PriceCalibrator,
    delivery: DeliverySynthesizer,
}

impl Scout {
    pub fn new(config: ScoutConfig) -> Self {
        let calibrator =
            PriceCalibrator::new(config.calibration.clone(), config.menu.currency.clone());
        let delivery = DeliverySynthesizer::new(config.delivery.clone());
        Self {
            config,
            calibrator,
            delivery,
        }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Calibrate and synthesize one discovery record.
    pub fn synthesize(&self, record: &RestaurantRecord) -> Result<Synthesized> {
        let signal = record.price_signal(&self.config.menu.currency);
        let calibration = self.calibrator.calibrate(signal.as_ref())?;
        let menu = synthesize_menu(&record.id, &calibration, self.config.menu.item_count)?;
        let delivery_info = self.delivery.synthesize(&record.id, &record.delivery_hint())?;
        Ok(Synthesized {
            calibration,
            candidate: Candidate {
                restaurant_id: record.id.clone(),
                restaurant_name: record.display_name().to_string(),
                menu,
                delivery_info,
            },
        })
    }

    /// Discovery payload → ranked report.
    pub fn scout_cheapest(&self, restaurants_json: &str) -> Result<ScoutReport> {
        let policy = self.config.ranking.batch_policy;
        let mut parsed = parse_restaurants(restaurants_json, policy)?;

        let mut candidates = Vec::with_capacity(parsed.entries.len());
        let mut uncalibrated = Vec::new();
        let indices = surviving_indices(&parsed);
        let records = std::mem::take(&mut parsed.entries);
        for (record, &index) in records.iter().zip(indices.iter()) {
            match self.synthesize(record) {
                Ok(synth) => {
                    if !synth.calibration.calibrated {
                        uncalibrated.push(record.id.clone());
                    }
                    candidates.push(synth.candidate);
                }
                Err(e) => {
                    parsed.reject(policy, index, Some(record.id.clone()), e)?;
                }
            }
        }

        parsed.rejected.sort_by_key(|r| r.index);
        let mut report = self.rank_parsed(&candidates, parsed.total, parsed.rejected)?;
        report.uncalibrated = uncalibrated;
        Ok(report)
    }

    /// Pre-synthesized candidate payload → ranked report.
    pub fn rank_candidates(&self, candidates_json: &str) -> Result<ScoutReport> {
        let parsed = parse_candidates(candidates_json, self.config.ranking.batch_policy)?;
        self.rank_parsed(&parsed.entries, parsed.total, parsed.rejected)
    }

    fn rank_parsed(
        &self,
        candidates: &[Candidate],
        total: usize,
        rejected: Vec<RejectedEntry>,
    ) -> Result<ScoutReport> {
        let options = RankOptions::from(&self.config.ranking);
        let offers = rank_with(candidates, &options)?;
        info!(
            "Scouted {} restaurants ({} rejected): {} {} offers",
            total,
            rejected.len(),
            offers.len(),
            options.category
        );
        Ok(ScoutReport::new(offers, total, rejected))
    }
}

/// Payload indices of the entries that survived parsing, in order.
fn surviving_indices<T>(parsed: &BatchParse<T>) -> Vec<usize> {
    (0..parsed.total)
        .filter(|i| !parsed.rejected.iter().any(|r| r.index == *i))
        .collect()
}

/// Run the pipeline with the default configuration and partial batches.
pub fn scout_cheapest(restaurants_json: &str) -> Result<ScoutReport> {
    let mut config = ScoutConfig::default();
    config.ranking.batch_policy = BatchPolicy::Partial;
    Scout::new(config).scout_cheapest(restaurants_json)
}
