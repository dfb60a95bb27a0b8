//! Engine configuration types.
//!
//! Every field has a serde default, so an empty TOML document yields the
//! documented defaults. `ScoutConfig::validate` is the single gate that
//! rejects tables the engine cannot honour.

use serde::{Deserialize, Serialize};

use crate::types::{Cents, PriceTier, MAX_AMOUNT_CENTS};
use crate::{Error, Result};

/// Upper bound on per-variant jitter. Above this, the jittered price bands of
/// adjacent tuna roll variants (multipliers 1.00 / 1.12 / 1.25) can overlap.
pub const MAX_VARIANT_JITTER: f64 = 0.05;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub calibration: CalibrationTable,

    #[serde(default)]
    pub menu: MenuConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub order: OrderConfig,
}

/// Closed price interval for tuna rolls at one tier, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBand {
    pub low_cents: Cents,
    pub high_cents: Cents,
}

/// Tier-to-interval table for the target category.
///
/// | tier           | tuna roll interval |
/// |----------------|--------------------|
/// | inexpensive    | $4.00 – $8.00      |
/// | moderate       | $7.00 – $13.00     |
/// | expensive      | $11.00 – $19.00    |
/// | very_expensive | $14.00 – $24.00    |
///
/// Bands overlap lightly at the boundaries; both ends rise strictly with the
/// tier, which is what keeps mean generated prices monotonic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationTable {
    #[serde(default = "default_inexpensive")]
    pub inexpensive: TierBand,

    #[serde(default = "default_moderate")]
    pub moderate: TierBand,

    #[serde(default = "default_expensive")]
    pub expensive: TierBand,

    #[serde(default = "default_very_expensive")]
    pub very_expensive: TierBand,

    /// Tier used when a restaurant reports no price signal at all.
    #[serde(default = "default_fallback_tier")]
    pub default_tier: PriceTier,

    /// A tuna roll costs roughly this share of the low end of a per-person range.
    #[serde(default = "default_range_low_fraction")]
    pub range_low_fraction: f64,

    /// ...and at most this share of the high end.
    #[serde(default = "default_range_high_fraction")]
    pub range_high_fraction: f64,

    /// No range-derived interval starts below this.
    #[serde(default = "default_floor_cents")]
    pub floor_cents: Cents,

    /// Minimum high/low ratio of any interval.
    #[serde(default = "default_min_spread_ratio")]
    pub min_spread_ratio: f64,

    /// Symmetric per-variant jitter around the menu anchor price.
    #[serde(default = "default_variant_jitter")]
    pub variant_jitter: f64,
}

/// Menu synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_item_count")]
    pub item_count: usize,

    /// Currency used when the price signal carries none.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Delivery synthesis bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_fee_min")]
    pub fee_min_cents: Cents,

    #[serde(default = "default_fee_max")]
    pub fee_max_cents: Cents,

    #[serde(default = "default_eta_choices")]
    pub eta_choices_minutes: Vec<u32>,

    /// Chance a restaurant delivers when discovery says nothing either way.
    #[serde(default = "default_delivery_probability")]
    pub delivery_probability: f64,
}

/// What to do with offers from restaurants that do not deliver, when
/// delivery cost is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailablePolicy {
    /// Drop them from the ranking.
    #[default]
    Exclude,
    /// Keep them, marked `delivery_unavailable`, ranked after every deliverable offer.
    Flag,
}

/// How a batch reacts to a malformed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Skip the entry and report it; rank the rest.
    #[default]
    Partial,
    /// Abort the whole batch with the entry's error.
    Strict,
}

impl std::str::FromStr for UnavailablePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(UnavailablePolicy::Exclude),
            "flag" => Ok(UnavailablePolicy::Flag),
            other => Err(Error::Config(format!("unknown unavailable policy {:?}", other))),
        }
    }
}

impl std::str::FromStr for BatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partial" => Ok(BatchPolicy::Partial),
            "strict" => Ok(BatchPolicy::Strict),
            other => Err(Error::Config(format!("unknown batch policy {:?}", other))),
        }
    }
}

/// Ranking defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_true")]
    pub include_delivery: bool,

    #[serde(default)]
    pub unavailable_policy: UnavailablePolicy,

    #[serde(default)]
    pub batch_policy: BatchPolicy,
}

/// Simulated order parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Sales tax in basis points (875 = 8.75%).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: i64,

    /// ETA quoted when the offer carries none.
    #[serde(default = "default_order_eta")]
    pub default_eta_minutes: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_inexpensive() -> TierBand {
    TierBand { low_cents: 400, high_cents: 800 }
}
fn default_moderate() -> TierBand {
    TierBand { low_cents: 700, high_cents: 1300 }
}
fn default_expensive() -> TierBand {
    TierBand { low_cents: 1100, high_cents: 1900 }
}
fn default_very_expensive() -> TierBand {
    TierBand { low_cents: 1400, high_cents: 2400 }
}
fn default_fallback_tier() -> PriceTier {
    PriceTier::Moderate
}
fn default_range_low_fraction() -> f64 {
    0.30
}
fn default_range_high_fraction() -> f64 {
    0.55
}
fn default_floor_cents() -> Cents {
    100
}
fn default_min_spread_ratio() -> f64 {
    1.4
}
fn default_variant_jitter() -> f64 {
    0.03
}
fn default_item_count() -> usize {
    9
}
fn default_currency() -> String {
    "USD".into()
}
fn default_fee_min() -> Cents {
    199
}
fn default_fee_max() -> Cents {
    599
}
fn default_eta_choices() -> Vec<u32> {
    vec![15, 20, 25, 30, 35, 40, 45]
}
fn default_delivery_probability() -> f64 {
    0.7
}
fn default_category() -> String {
    "tuna_roll".into()
}
fn default_tax_rate_bps() -> i64 {
    875
}
fn default_order_eta() -> u32 {
    30
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self {
            inexpensive: default_inexpensive(),
            moderate: default_moderate(),
            expensive: default_expensive(),
            very_expensive: default_very_expensive(),
            default_tier: default_fallback_tier(),
            range_low_fraction: default_range_low_fraction(),
            range_high_fraction: default_range_high_fraction(),
            floor_cents: default_floor_cents(),
            min_spread_ratio: default_min_spread_ratio(),
            variant_jitter: default_variant_jitter(),
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            item_count: default_item_count(),
            currency: default_currency(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            fee_min_cents: default_fee_min(),
            fee_max_cents: default_fee_max(),
            eta_choices_minutes: default_eta_choices(),
            delivery_probability: default_delivery_probability(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            include_delivery: true,
            unavailable_policy: UnavailablePolicy::default(),
            batch_policy: BatchPolicy::default(),
        }
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: default_tax_rate_bps(),
            default_eta_minutes: default_order_eta(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────

impl CalibrationTable {
    pub fn band(&self, tier: PriceTier) -> TierBand {
        match tier {
            PriceTier::Inexpensive => self.inexpensive,
            PriceTier::Moderate => self.moderate,
            PriceTier::Expensive => self.expensive,
            PriceTier::VeryExpensive => self.very_expensive,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<(PriceTier, TierBand)> = None;
        for tier in PriceTier::ALL {
            let band = self.band(tier);
            if band.low_cents < 0 || band.low_cents >= band.high_cents {
                return Err(Error::Config(format!(
                    "calibration band {} must satisfy 0 <= low < high (got {}..{})",
                    tier.as_str(),
                    band.low_cents,
                    band.high_cents
                )));
            }
            if band.high_cents > MAX_AMOUNT_CENTS {
                return Err(Error::Config(format!(
                    "calibration band {} exceeds {} cents (got {}..{})",
                    tier.as_str(),
                    MAX_AMOUNT_CENTS,
                    band.low_cents,
                    band.high_cents
                )));
            }
            if (band.high_cents as f64) < band.low_cents as f64 * self.min_spread_ratio {
                return Err(Error::Config(format!(
                    "calibration band {} is narrower than min_spread_ratio {}",
                    tier.as_str(),
                    self.min_spread_ratio
                )));
            }
            if let Some((prev_tier, prev)) = previous {
                if band.low_cents <= prev.low_cents || band.high_cents <= prev.high_cents {
                    return Err(Error::Config(format!(
                        "calibration band {} must sit strictly above {}",
                        tier.as_str(),
                        prev_tier.as_str()
                    )));
                }
            }
            previous = Some((tier, band));
        }

        if !(self.range_low_fraction > 0.0 && self.range_low_fraction <= self.range_high_fraction)
        {
            return Err(Error::Config(format!(
                "range fractions must satisfy 0 < low <= high (got {} / {})",
                self.range_low_fraction, self.range_high_fraction
            )));
        }
        if self.floor_cents < 0 {
            return Err(Error::Config("floor_cents must be non-negative".into()));
        }
        if !(self.min_spread_ratio >= 1.4) {
            return Err(Error::Config(format!(
                "min_spread_ratio must be at least 1.4 (got {})",
                self.min_spread_ratio
            )));
        }
        if !(0.0..=MAX_VARIANT_JITTER).contains(&self.variant_jitter) {
            return Err(Error::Config(format!(
                "variant_jitter must be within 0..={} (got {})",
                MAX_VARIANT_JITTER, self.variant_jitter
            )));
        }
        Ok(())
    }
}

impl ScoutConfig {
    /// Parse and validate a TOML document.
    /// Parse without validating, so callers can layer overrides first.
    pub fn parse_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config = Self::parse_toml(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.calibration.validate()?;

        if self.menu.currency.trim().is_empty() {
            return Err(Error::Config("menu.currency must not be empty".into()));
        }

        let d = &self.delivery;
        let fee_bounds = 0..=MAX_AMOUNT_CENTS;
        if !fee_bounds.contains(&d.fee_min_cents)
            || !fee_bounds.contains(&d.fee_max_cents)
            || d.fee_min_cents > d.fee_max_cents
        {
            return Err(Error::Config(format!(
                "delivery fee bounds must satisfy 0 <= min <= max <= {} (got {}..{})",
                MAX_AMOUNT_CENTS, d.fee_min_cents, d.fee_max_cents
            )));
        }
        if d.eta_choices_minutes.is_empty() || d.eta_choices_minutes.contains(&0) {
            return Err(Error::Config(
                "delivery.eta_choices_minutes must be non-empty and positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&d.delivery_probability) {
            return Err(Error::Config(format!(
                "delivery_probability must be within [0, 1] (got {})",
                d.delivery_probability
            )));
        }

        if self.ranking.category.trim().is_empty() {
            return Err(Error::Config("ranking.category must not be empty".into()));
        }
        if self.order.tax_rate_bps < 0 {
            return Err(Error::Config("order.tax_rate_bps must be non-negative".into()));
        }
        if self.order.default_eta_minutes == 0 {
            return Err(Error::Config("order.default_eta_minutes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.calibration.default_tier, PriceTier::Moderate);
        assert_eq!(config.menu.item_count, 9);
        assert_eq!(config.ranking.unavailable_policy, UnavailablePolicy::Exclude);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = ScoutConfig::from_toml_str("").unwrap();
        assert_eq!(config.calibration.inexpensive, default_inexpensive());
        assert_eq!(config.delivery.eta_choices_minutes, default_eta_choices());
        assert!(config.ranking.include_delivery);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [calibration.moderate]
            low_cents = 800
            high_cents = 1400

            [ranking]
            include_delivery = false
            unavailable_policy = "flag"
            batch_policy = "strict"
        "#;
        let config = ScoutConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.calibration.moderate.low_cents, 800);
        assert_eq!(config.calibration.expensive, default_expensive());
        assert!(!config.ranking.include_delivery);
        assert_eq!(config.ranking.unavailable_policy, UnavailablePolicy::Flag);
        assert_eq!(config.ranking.batch_policy, BatchPolicy::Strict);
    }

    #[test]
    fn test_rejects_non_monotonic_table() {
        let mut table = CalibrationTable::default();
        table.expensive = TierBand { low_cents: 600, high_cents: 1900 };
        assert!(matches!(table.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_narrow_band_and_large_jitter() {
        let mut narrow = CalibrationTable::default();
        narrow.inexpensive = TierBand { low_cents: 400, high_cents: 450 };
        assert!(narrow.validate().is_err());

        let mut jittery = CalibrationTable::default();
        jittery.variant_jitter = 0.2;
        assert!(jittery.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_delivery_bounds() {
        let mut config = ScoutConfig::default();
        config.delivery.fee_min_cents = 700;
        assert!(config.validate().is_err());

        let mut config = ScoutConfig::default();
        config.delivery.eta_choices_minutes.clear();
        assert!(config.validate().is_err());

        let mut config = ScoutConfig::default();
        config.delivery.delivery_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = ScoutConfig::default();
        config.delivery.fee_max_cents = i64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_band_above_amount_ceiling() {
        let mut table = CalibrationTable::default();
        table.very_expensive = TierBand { low_cents: 1400, high_cents: MAX_AMOUNT_CENTS + 1 };
        assert!(matches!(table.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_toml_defers_validation() {
        let raw = "[delivery]\ndelivery_probability = 1.5\n";
        let mut config = ScoutConfig::parse_toml(raw).unwrap();
        assert!(matches!(ScoutConfig::from_toml_str(raw), Err(Error::Config(_))));

        // An override applied after parsing can still make it valid.
        config.delivery.delivery_probability = 0.5;
        assert!(config.validate().is_ok());

        assert!(matches!(
            ScoutConfig::parse_toml("[delivery"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("FLAG".parse::<UnavailablePolicy>().unwrap(), UnavailablePolicy::Flag);
        assert_eq!("partial".parse::<BatchPolicy>().unwrap(), BatchPolicy::Partial);
        assert!("maybe".parse::<BatchPolicy>().is_err());
    }
}
