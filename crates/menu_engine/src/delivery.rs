//! Delivery info synthesizer.
//!
//! Draws from the restaurant's delivery stream, so delivery and menu
//! randomness never overlap. A known "no delivery" from discovery is never
//! contradicted.

use common::config::DeliveryConfig;
use common::{DeliveryHint, DeliveryInfo, Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::seed::{stream_rng, SeedStream};

#[derive(Debug, Clone, Default)]
pub struct DeliverySynthesizer {
    config: DeliveryConfig,
}

impl DeliverySynthesizer {
    pub fn new(config: DeliveryConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(&self, restaurant_id: &str, hint: &DeliveryHint) -> Result<DeliveryInfo> {
        if restaurant_id.trim().is_empty() {
            return Err(Error::validation("restaurant_id is required"));
        }
        if hint.has_delivery == Some(false) {
            debug!("{}: discovery says no delivery", restaurant_id);
            return Ok(DeliveryInfo::unavailable(restaurant_id));
        }

        let cfg = &self.config;
        if cfg.fee_min_cents < 0 || cfg.fee_min_cents > cfg.fee_max_cents {
            return Err(Error::Config(format!(
                "delivery fee bounds {}..{} are malformed",
                cfg.fee_min_cents, cfg.fee_max_cents
            )));
        }

        let mut rng = stream_rng(restaurant_id, SeedStream::Delivery);

        // Drawn even when the hint decides, so fee/ETA do not depend on
        // whether discovery reported delivery.
        let roll: f64 = rng.gen();
        let available = hint
            .has_delivery
            .unwrap_or(roll < cfg.delivery_probability);
        if !available {
            debug!("{}: synthesized as not delivering", restaurant_id);
            return Ok(DeliveryInfo::unavailable(restaurant_id));
        }

        let fee_cents = rng.gen_range(cfg.fee_min_cents..=cfg.fee_max_cents);
        let eta_minutes = *cfg
            .eta_choices_minutes
            .choose(&mut rng)
            .ok_or_else(|| Error::Config("no delivery ETA choices configured".into()))?;
        if eta_minutes == 0 {
            return Err(Error::Config("delivery ETA choices must be positive".into()));
        }

        Ok(DeliveryInfo {
            restaurant_id: restaurant_id.to_string(),
            fee_cents,
            eta_minutes,
            available: true,
        })
    }
}

/// Synthesize delivery info with the default bounds.
pub fn synthesize_delivery(restaurant_id: &str, hint: &DeliveryHint) -> Result<DeliveryInfo> {
    DeliverySynthesizer::default().synthesize(restaurant_id, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(flag: Option<bool>) -> DeliveryHint {
        DeliveryHint { has_delivery: flag }
    }

    #[test]
    fn test_idempotent() {
        for flag in [None, Some(true), Some(false)] {
            let first = synthesize_delivery("r-100", &hint(flag)).unwrap();
            for _ in 0..100 {
                assert_eq!(synthesize_delivery("r-100", &hint(flag)).unwrap(), first);
            }
        }
    }

    #[test]
    fn test_golden_terms_are_stable() {
        // Pinned values: any change to seeding or sampling shows up here.
        let info = synthesize_delivery("r-200", &hint(Some(true))).unwrap();
        assert!(info.available);
        assert_eq!((info.fee_cents, info.eta_minutes), (543, 45));

        let info = synthesize_delivery("p1", &hint(Some(true))).unwrap();
        assert_eq!((info.fee_cents, info.eta_minutes), (305, 40));

        assert!(!synthesize_delivery("r-100", &hint(None)).unwrap().available);
        let info = synthesize_delivery("r-200", &hint(None)).unwrap();
        assert!(info.available);
        assert_eq!((info.fee_cents, info.eta_minutes), (543, 45));
    }

    #[test]
    fn test_known_unavailable_is_zeroed() {
        let info = synthesize_delivery("r-100", &hint(Some(false))).unwrap();
        assert!(!info.available);
        assert_eq!(info.fee_cents, 0);
        assert_eq!(info.eta_minutes, 0);
        assert_eq!(info.restaurant_id, "r-100");
    }

    #[test]
    fn test_known_available_within_bounds() {
        let cfg = DeliveryConfig::default();
        for i in 0..500 {
            let info = synthesize_delivery(&format!("place-{}", i), &hint(Some(true))).unwrap();
            assert!(info.available);
            assert!((cfg.fee_min_cents..=cfg.fee_max_cents).contains(&info.fee_cents));
            assert!(cfg.eta_choices_minutes.contains(&info.eta_minutes));
            assert!(info.eta_minutes >= 1);
        }
    }

    #[test]
    fn test_hint_does_not_change_fee() {
        // Where the unhinted draw delivers, an explicit "yes" yields the same record.
        for i in 0..200 {
            let id = format!("place-{}", i);
            let unhinted = synthesize_delivery(&id, &hint(None)).unwrap();
            if unhinted.available {
                assert_eq!(synthesize_delivery(&id, &hint(Some(true))).unwrap(), unhinted);
            }
        }
    }

    #[test]
    fn test_unhinted_availability_mixes() {
        let delivering = (0..1000)
            .filter(|i| {
                synthesize_delivery(&format!("mix-{}", i), &hint(None))
                    .unwrap()
                    .available
            })
            .count();
        // 70% nominal; loose bounds.
        assert!((550..=850).contains(&delivering), "delivering={}", delivering);
    }

    #[test]
    fn test_probability_extremes() {
        let always = DeliverySynthesizer::new(DeliveryConfig {
            delivery_probability: 1.0,
            ..DeliveryConfig::default()
        });
        let never = DeliverySynthesizer::new(DeliveryConfig {
            delivery_probability: 0.0,
            ..DeliveryConfig::default()
        });
        for i in 0..50 {
            let id = format!("edge-{}", i);
            assert!(always.synthesize(&id, &hint(None)).unwrap().available);
            assert!(!never.synthesize(&id, &hint(None)).unwrap().available);
        }
    }

    #[test]
    fn test_missing_identity_rejected() {
        assert!(matches!(
            synthesize_delivery("", &hint(None)),
            Err(Error::Validation(_))
        ));
    }
}
