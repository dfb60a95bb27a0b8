//! Domain types shared across the engine and the CLI.
//!
//! All money amounts are integer cents in the restaurant's currency. Prices
//! coming from the discovery collaborator (price ranges) are major units and
//! are converted once, at calibration time.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Money amount in cents.
pub type Cents = i64;

/// Largest single amount the engine accepts ($10M). Sums of a handful of
/// such amounts stay far inside `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000;

/// Convert cents to major units, for logs and display only.
pub fn dollars(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

// ── Price Signal ──────────────────────────────────────────────────────

/// Ordinal price tier, least to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Inexpensive,
    Moderate,
    Expensive,
    VeryExpensive,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::Inexpensive,
        PriceTier::Moderate,
        PriceTier::Expensive,
        PriceTier::VeryExpensive,
    ];

    /// 1-based ordinal level.
    pub fn level(self) -> u8 {
        match self {
            PriceTier::Inexpensive => 1,
            PriceTier::Moderate => 2,
            PriceTier::Expensive => 3,
            PriceTier::VeryExpensive => 4,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(PriceTier::Inexpensive),
            2 => Some(PriceTier::Moderate),
            3 => Some(PriceTier::Expensive),
            4 => Some(PriceTier::VeryExpensive),
            _ => None,
        }
    }

    /// Parse a tier name as the discovery service reports it.
    ///
    /// Accepts `PRICE_LEVEL_*` names and bare names in any case.
    /// `FREE` folds into the lowest tier; `UNSPECIFIED` means no tier.
    pub fn parse_name(raw: &str) -> std::result::Result<Option<Self>, String> {
        let upper = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        let name = upper.strip_prefix("PRICE_LEVEL_").unwrap_or(upper.as_str());
        match name {
            "" | "UNSPECIFIED" => Ok(None),
            "FREE" | "INEXPENSIVE" => Ok(Some(PriceTier::Inexpensive)),
            "MODERATE" => Ok(Some(PriceTier::Moderate)),
            "EXPENSIVE" => Ok(Some(PriceTier::Expensive)),
            "VERY_EXPENSIVE" => Ok(Some(PriceTier::VeryExpensive)),
            other => match other.parse::<i64>() {
                Ok(n) => PriceTier::from_level(n)
                    .map(Some)
                    .ok_or_else(|| format!("price tier {} outside 1..=4", n)),
                Err(_) => Err(format!("unknown price level {:?}", raw)),
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceTier::Inexpensive => "inexpensive",
            PriceTier::Moderate => "moderate",
            PriceTier::Expensive => "expensive",
            PriceTier::VeryExpensive => "very_expensive",
        }
    }
}

/// Currency price range in major units (e.g. dollars per person).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl PriceRange {
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::validation(format!(
                "price range bounds must be finite (min={}, max={})",
                self.min, self.max
            )));
        }
        if self.min < 0.0 || self.max < 0.0 {
            return Err(Error::validation(format!(
                "price range bounds must be non-negative (min={}, max={})",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(Error::validation(format!(
                "price range min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::validation("price range currency is empty"));
        }
        Ok(())
    }
}

/// External price indicator for one restaurant. At most one is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSignal {
    Tier(PriceTier),
    Range(PriceRange),
}

// ── Menu ──────────────────────────────────────────────────────────────

/// Closed set of menu categories. `TunaRoll` is the ranking target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TunaRoll,
    Roll,
    SpecialtyRoll,
    Nigiri,
    Appetizer,
    Soup,
    Dessert,
}

impl Category {
    pub const TARGET: Category = Category::TunaRoll;

    pub fn as_str(self) -> &'static str {
        match self {
            Category::TunaRoll => "tuna_roll",
            Category::Roll => "roll",
            Category::SpecialtyRoll => "specialty_roll",
            Category::Nigiri => "nigiri",
            Category::Appetizer => "appetizer",
            Category::Soup => "soup",
            Category::Dessert => "dessert",
        }
    }

    /// Exact match against a normalized category filter.
    pub fn matches(self, filter: &str) -> bool {
        self.as_str() == normalize_category(filter)
    }
}

/// Lowercase, trim, and fold spaces/hyphens into underscores.
///
/// `"Tuna Roll"`, `"tuna-roll"` and `"TUNA_ROLL"` all normalize to `"tuna_roll"`.
pub fn normalize_category(raw: &str) -> String {
    raw.trim()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Regular,
    Spicy,
    Deluxe,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Regular => "regular",
            Variant::Spicy => "spicy",
            Variant::Deluxe => "deluxe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub category: Category,
    pub variant: Variant,
    pub price_cents: Cents,
    pub currency: String,
    #[serde(default = "default_pieces")]
    pub pieces: u32,
    #[serde(default)]
    pub description: String,
}

fn default_pieces() -> u32 {
    1
}

/// A generated menu. Never mutated after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub restaurant_id: String,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn items_in(&self, category: Category) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(move |i| i.category == category)
    }
}

// ── Delivery ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub restaurant_id: String,
    pub fee_cents: Cents,
    /// Zero only when `available` is false.
    pub eta_minutes: u32,
    pub available: bool,
}

impl DeliveryInfo {
    pub fn unavailable(restaurant_id: &str) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            fee_cents: 0,
            eta_minutes: 0,
            available: false,
        }
    }
}

/// What the discovery service already knows about delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHint {
    #[serde(default)]
    pub has_delivery: Option<bool>,
}

// ── Discovery / Ranking ───────────────────────────────────────────────

/// A restaurant as returned by the discovery collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_price_level")]
    pub price_level: Option<PriceTier>,
    #[serde(default)]
    pub price_range_low: Option<f64>,
    #[serde(default)]
    pub price_range_high: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub delivery: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
}

impl RestaurantRecord {
    /// The authoritative price signal: the range if known, else the tier.
    ///
    /// When only the low end of the range is known it doubles as the high end.
    pub fn price_signal(&self, default_currency: &str) -> Option<PriceSignal> {
        let range = match (self.price_range_low, self.price_range_high) {
            (Some(low), Some(high)) => Some((low, high)),
            (Some(low), None) => Some((low, low)),
            (None, Some(high)) => Some((high, high)),
            (None, None) => None,
        };
        if let Some((min, max)) = range {
            return Some(PriceSignal::Range(PriceRange {
                min,
                max,
                currency: self
                    .currency
                    .clone()
                    .unwrap_or_else(|| default_currency.to_string()),
            }));
        }
        self.price_level.map(PriceSignal::Tier)
    }

    pub fn delivery_hint(&self) -> DeliveryHint {
        DeliveryHint {
            has_delivery: self.delivery,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Restaurant"
        } else {
            &self.name
        }
    }
}

fn de_price_level<'de, D>(deserializer: D) -> std::result::Result<Option<PriceTier>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Level(i64),
        Name(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Level(n)) => PriceTier::from_level(n)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("price tier {} outside 1..=4", n))),
        Some(Raw::Name(s)) => PriceTier::parse_name(&s).map_err(D::Error::custom),
    }
}

/// A restaurant carrying its synthesized menu and delivery info, ready to rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub menu: Menu,
    pub delivery_info: DeliveryInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedOffer {
    /// 1-based, contiguous.
    pub rank: usize,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub item: MenuItem,
    pub item_price_cents: Cents,
    pub delivery_fee_cents: Cents,
    pub total_cost_cents: Cents,
    pub price_per_piece_cents: Cents,
    pub eta_minutes: Option<u32>,
    /// Set only under the flag policy, for restaurants that do not deliver.
    #[serde(default)]
    pub delivery_unavailable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("Tuna Roll"), "tuna_roll");
        assert_eq!(normalize_category("  tuna-roll "), "tuna_roll");
        assert_eq!(normalize_category("TUNA_ROLL"), "tuna_roll");
        assert_eq!(normalize_category("tuna   roll"), "tuna_roll");
        assert!(Category::TunaRoll.matches("Tuna Roll"));
        assert!(!Category::TunaRoll.matches("tuna"));
        assert!(!Category::SpecialtyRoll.matches("roll"));
    }

    #[test]
    fn test_levels_round_trip() {
        for tier in PriceTier::ALL {
            assert_eq!(PriceTier::from_level(i64::from(tier.level())), Some(tier));
        }
        assert_eq!(PriceTier::from_level(0), None);
        assert_eq!(PriceTier::from_level(5), None);
    }

    #[test]
    fn test_parse_google_price_levels() {
        assert_eq!(
            PriceTier::parse_name("PRICE_LEVEL_VERY_EXPENSIVE").unwrap(),
            Some(PriceTier::VeryExpensive)
        );
        assert_eq!(
            PriceTier::parse_name("PRICE_LEVEL_FREE").unwrap(),
            Some(PriceTier::Inexpensive)
        );
        assert_eq!(PriceTier::parse_name("PRICE_LEVEL_UNSPECIFIED").unwrap(), None);
        assert_eq!(PriceTier::parse_name("moderate").unwrap(), Some(PriceTier::Moderate));
        assert_eq!(PriceTier::parse_name("3").unwrap(), Some(PriceTier::Expensive));
        assert!(PriceTier::parse_name("PRICE_LEVEL_LUDICROUS").is_err());
        assert!(PriceTier::parse_name("7").is_err());
    }

    #[test]
    fn test_record_price_level_accepts_names_and_integers() {
        let by_name: RestaurantRecord =
            serde_json::from_str(r#"{"id":"a","price_level":"PRICE_LEVEL_MODERATE"}"#).unwrap();
        assert_eq!(by_name.price_level, Some(PriceTier::Moderate));

        let by_level: RestaurantRecord =
            serde_json::from_str(r#"{"id":"a","price_level":4}"#).unwrap();
        assert_eq!(by_level.price_level, Some(PriceTier::VeryExpensive));

        let null: RestaurantRecord =
            serde_json::from_str(r#"{"id":"a","price_level":null}"#).unwrap();
        assert_eq!(null.price_level, None);

        let bad = serde_json::from_str::<RestaurantRecord>(r#"{"id":"a","price_level":9}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_price_signal_prefers_range() {
        let record = RestaurantRecord {
            id: "r".into(),
            price_level: Some(PriceTier::Expensive),
            price_range_low: Some(20.0),
            ..Default::default()
        };
        match record.price_signal("USD") {
            Some(PriceSignal::Range(r)) => {
                assert_eq!(r.min, 20.0);
                assert_eq!(r.max, 20.0);
                assert_eq!(r.currency, "USD");
            }
            other => panic!("expected range signal, got {:?}", other),
        }

        let tier_only = RestaurantRecord {
            id: "r".into(),
            price_level: Some(PriceTier::Expensive),
            ..Default::default()
        };
        assert_eq!(
            tier_only.price_signal("USD"),
            Some(PriceSignal::Tier(PriceTier::Expensive))
        );
        assert_eq!(RestaurantRecord::default().price_signal("USD"), None);
    }

    #[test]
    fn test_price_range_validation() {
        let ok = PriceRange { min: 10.0, max: 20.0, currency: "USD".into() };
        assert!(ok.validate().is_ok());

        let inverted = PriceRange { min: 30.0, max: 20.0, currency: "USD".into() };
        assert!(matches!(inverted.validate(), Err(Error::Validation(_))));

        let negative = PriceRange { min: -1.0, max: 20.0, currency: "USD".into() };
        assert!(matches!(negative.validate(), Err(Error::Validation(_))));

        let nan = PriceRange { min: f64::NAN, max: 20.0, currency: "USD".into() };
        assert!(matches!(nan.validate(), Err(Error::Validation(_))));
    }
}
