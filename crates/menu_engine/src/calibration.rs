//! Price tier calibrator. Turns a coarse price signal into a concrete
//! tuna roll price interval.
//!
//! 1. Currency range: the interval is a fixed slice of the per-person range.
//! 2. Ordinal tier: the interval comes from the calibration table.
//! 3. Nothing: the table's default tier, marked uncalibrated.

use common::config::CalibrationTable;
use common::{Cents, Error, PriceSignal, PriceTier, Result, MAX_AMOUNT_CENTS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::money::round_half_up;

// ── Public Types ──────────────────────────────────────────────────────

/// Where a calibration record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tier")]
pub enum CalibrationSource {
    Tier(PriceTier),
    Range,
    /// No signal; the default tier was used.
    Fallback(PriceTier),
}

/// Concrete price model for the target category at one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Inclusive lower bound of target-category prices (cents).
    pub low_cents: Cents,
    /// Inclusive upper bound of target-category prices (cents).
    pub high_cents: Cents,
    /// Symmetric relative jitter applied per variant.
    pub jitter: f64,
    pub currency: String,
    pub source: CalibrationSource,
    /// False when the record is a fallback with no real signal behind it.
    pub calibrated: bool,
}

impl CalibrationRecord {
    pub fn contains(&self, price_cents: Cents) -> bool {
        (self.low_cents..=self.high_cents).contains(&price_cents)
    }
}

// ── Calibrator ────────────────────────────────────────────────────────

/// Maps price signals to calibration records using one table.
#[derive(Debug, Clone)]
pub struct PriceCalibrator {
    table: CalibrationTable,
    currency: String,
}

impl Default for PriceCalibrator {
    fn default() -> Self {
        Self::new(CalibrationTable::default(), "USD")
    }
}

impl PriceCalibrator {
    /// `currency` is used for tier and fallback records, which carry none.
    pub fn new(table: CalibrationTable, currency: impl Into<String>) -> Self {
        Self {
            table,
            currency: currency.into(),
        }
    }

    /// Calibrate one restaurant. Missing input never fails; only a
    /// malformed range does.
    pub fn calibrate(&self, signal: Option<&PriceSignal>) -> Result<CalibrationRecord> {
        match signal {
            Some(PriceSignal::Range(range)) => {
                range.validate()?;
                let (low, high) = self.range_interval(range.min, range.max)?;
                Ok(CalibrationRecord {
                    low_cents: low,
                    high_cents: high,
                    jitter: self.table.variant_jitter,
                    currency: range.currency.trim().to_string(),
                    source: CalibrationSource::Range,
                    calibrated: true,
                })
            }
            Some(PriceSignal::Tier(tier)) => {
                Ok(self.tier_record(*tier, CalibrationSource::Tier(*tier)))
            }
            None => {
                let tier = self.table.default_tier;
                debug!("no price signal, falling back to tier {}", tier.as_str());
                let mut record = self.tier_record(tier, CalibrationSource::Fallback(tier));
                record.calibrated = false;
                Ok(record)
            }
        }
    }

    fn tier_record(&self, tier: PriceTier, source: CalibrationSource) -> CalibrationRecord {
        let band = self.table.band(tier);
        CalibrationRecord {
            low_cents: band.low_cents,
            high_cents: band.high_cents,
            jitter: self.table.variant_jitter,
            currency: self.currency.clone(),
            source,
            calibrated: true,
        }
    }

    /// `[min × low_fraction, max × high_fraction]` in cents, floored and
    /// widened to the minimum spread. Intervals reaching past
    /// `MAX_AMOUNT_CENTS` are rejected.
    fn range_interval(&self, min: f64, max: f64) -> Result<(Cents, Cents)> {
        let low_raw = min * 100.0 * self.table.range_low_fraction;
        let high_raw = max * 100.0 * self.table.range_high_fraction;
        let min_high_raw =
            low_raw.max(self.table.floor_cents as f64) * self.table.min_spread_ratio;
        let ceiling = MAX_AMOUNT_CENTS as f64;
        if high_raw > ceiling || min_high_raw > ceiling {
            return Err(Error::validation(format!(
                "price range {}..{} is beyond the {} cent ceiling",
                min, max, MAX_AMOUNT_CENTS
            )));
        }

        let low = round_half_up(low_raw).max(self.table.floor_cents);
        let high = round_half_up(high_raw);
        let min_high = (low as f64 * self.table.min_spread_ratio - 1e-9).ceil() as Cents;
        Ok((low, high.max(min_high)))
    }
}

/// Calibrate against the default table.
pub fn calibrate(signal: Option<&PriceSignal>) -> Result<CalibrationRecord> {
    PriceCalibrator::default().calibrate(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PriceRange;

    fn range(min: f64, max: f64) -> PriceSignal {
        PriceSignal::Range(PriceRange {
            min,
            max,
            currency: "USD".into(),
        })
    }

    #[test]
    fn test_tier_lookup() {
        let low = calibrate(Some(&PriceSignal::Tier(PriceTier::Inexpensive))).unwrap();
        assert_eq!((low.low_cents, low.high_cents), (400, 800));
        assert!(low.calibrated);
        assert_eq!(low.source, CalibrationSource::Tier(PriceTier::Inexpensive));

        let high = calibrate(Some(&PriceSignal::Tier(PriceTier::VeryExpensive))).unwrap();
        assert_eq!((high.low_cents, high.high_cents), (1400, 2400));
    }

    #[test]
    fn test_tiers_are_monotonic() {
        let records: Vec<CalibrationRecord> = PriceTier::ALL
            .iter()
            .map(|t| calibrate(Some(&PriceSignal::Tier(*t))).unwrap())
            .collect();
        for pair in records.windows(2) {
            assert!(pair[1].low_cents > pair[0].low_cents);
            assert!(pair[1].high_cents > pair[0].high_cents);
        }
    }

    #[test]
    fn test_missing_signal_falls_back_uncalibrated() {
        let record = calibrate(None).unwrap();
        assert!(!record.calibrated);
        assert_eq!(record.source, CalibrationSource::Fallback(PriceTier::Moderate));
        assert_eq!((record.low_cents, record.high_cents), (700, 1300));
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn test_range_is_scaled_slice() {
        // $20–$30 per person → tuna roll $6.00–$16.50
        let record = calibrate(Some(&range(20.0, 30.0))).unwrap();
        assert_eq!(record.low_cents, 600);
        assert_eq!(record.high_cents, 1650);
        assert_eq!(record.source, CalibrationSource::Range);
        assert!(record.calibrated);
    }

    #[test]
    fn test_range_floor_and_spread() {
        // Zero-width, zero-priced range still yields a usable interval.
        let record = calibrate(Some(&range(0.0, 0.0))).unwrap();
        assert_eq!(record.low_cents, 100);
        assert_eq!(record.high_cents, 140);
    }

    #[test]
    fn test_huge_range_rejected() {
        assert!(matches!(
            calibrate(Some(&range(1e18, 1e18))),
            Err(Error::Validation(_))
        ));
        // Just under the ceiling still calibrates.
        let record = calibrate(Some(&range(1_000.0, 1_000_000.0))).unwrap();
        assert!(record.high_cents <= MAX_AMOUNT_CENTS);
    }

    #[test]
    fn test_range_keeps_its_currency() {
        let signal = PriceSignal::Range(PriceRange {
            min: 2000.0,
            max: 3000.0,
            currency: "JPY".into(),
        });
        let record = calibrate(Some(&signal)).unwrap();
        assert_eq!(record.currency, "JPY");
    }

    #[test]
    fn test_malformed_range_rejected() {
        assert!(matches!(
            calibrate(Some(&range(30.0, 20.0))),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            calibrate(Some(&range(-5.0, 20.0))),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_custom_table_currency() {
        let calibrator = PriceCalibrator::new(CalibrationTable::default(), "CAD");
        let record = calibrator
            .calibrate(Some(&PriceSignal::Tier(PriceTier::Expensive)))
            .unwrap();
        assert_eq!(record.currency, "CAD");
        assert_eq!((record.low_cents, record.high_cents), (1100, 1900));
    }
}
