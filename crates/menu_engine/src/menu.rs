//! Deterministic menu synthesizer.
//!
//! Given a restaurant identity and its calibration record, builds a full menu
//! from the restaurant's menu stream:
//!
//! 1. One anchor price drawn from the calibrated interval.
//! 2. The three tuna roll variants, each the anchor with its own bounded
//!    jitter, scaled by the variant multiplier (regular < spicy < deluxe).
//! 3. Filler items from the other categories, priced off the same anchor.
//!
//! Items are returned in generation order.

use common::config::MAX_VARIANT_JITTER;
use common::{Category, Error, Menu, MenuItem, Result, Variant};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::calibration::CalibrationRecord;
use crate::money::round_half_up;
use crate::seed::{stream_rng, SeedStream};

pub const DEFAULT_ITEM_COUNT: usize = 9;

/// Every menu carries at least the three canonical tuna roll variants.
pub const MIN_ITEM_COUNT: usize = TUNA_VARIANTS.len();

/// Largest menu the filler catalog can fill without repeats.
pub const MAX_ITEM_COUNT: usize = TUNA_VARIANTS.len() + FILLERS.len();

struct TunaVariant {
    variant: Variant,
    name: &'static str,
    description: &'static str,
    pieces: u32,
    multiplier: f64,
}

const TUNA_VARIANTS: [TunaVariant; 3] = [
    TunaVariant {
        variant: Variant::Regular,
        name: "Tuna Roll",
        description: "Classic tuna roll with sushi rice and nori",
        pieces: 6,
        multiplier: 1.00,
    },
    TunaVariant {
        variant: Variant::Spicy,
        name: "Spicy Tuna Roll",
        description: "Tuna with spicy mayo, cucumber, and sesame seeds",
        pieces: 8,
        multiplier: 1.12,
    },
    TunaVariant {
        variant: Variant::Deluxe,
        name: "Tuna Avocado Roll",
        description: "Fresh tuna with avocado and sushi rice",
        pieces: 8,
        multiplier: 1.25,
    },
];

const DELUXE_MULTIPLIER: f64 = 1.25;

struct Filler {
    name: &'static str,
    category: Category,
    description: &'static str,
    pieces: u32,
    /// Price relative to the anchor, drawn uniformly from this range.
    factor: (f64, f64),
}

const FILLERS: [Filler; 11] = [
    Filler {
        name: "California Roll",
        category: Category::Roll,
        description: "Crab, avocado, and cucumber",
        pieces: 8,
        factor: (0.8, 1.1),
    },
    Filler {
        name: "Salmon Roll",
        category: Category::Roll,
        description: "Fresh salmon with sushi rice and nori",
        pieces: 6,
        factor: (0.9, 1.2),
    },
    Filler {
        name: "Yellowtail Roll",
        category: Category::Roll,
        description: "Yellowtail with scallion",
        pieces: 6,
        factor: (0.9, 1.3),
    },
    Filler {
        name: "Rainbow Roll",
        category: Category::SpecialtyRoll,
        description: "California roll topped with assorted sashimi",
        pieces: 8,
        factor: (1.4, 1.9),
    },
    Filler {
        name: "Dragon Roll",
        category: Category::SpecialtyRoll,
        description: "Eel and cucumber topped with avocado",
        pieces: 8,
        factor: (1.4, 2.0),
    },
    Filler {
        name: "Salmon Nigiri",
        category: Category::Nigiri,
        description: "Two pieces of salmon over rice",
        pieces: 2,
        factor: (0.7, 1.0),
    },
    Filler {
        name: "Edamame",
        category: Category::Appetizer,
        description: "Steamed soybeans with sea salt",
        pieces: 1,
        factor: (0.5, 0.7),
    },
    Filler {
        name: "Gyoza",
        category: Category::Appetizer,
        description: "Pan-fried pork dumplings",
        pieces: 5,
        factor: (0.6, 0.9),
    },
    Filler {
        name: "Seaweed Salad",
        category: Category::Appetizer,
        description: "Wakame with sesame dressing",
        pieces: 1,
        factor: (0.5, 0.8),
    },
    Filler {
        name: "Miso Soup",
        category: Category::Soup,
        description: "Tofu, wakame, and scallion",
        pieces: 1,
        factor: (0.3, 0.5),
    },
    Filler {
        name: "Green Tea Ice Cream",
        category: Category::Dessert,
        description: "Two scoops of matcha ice cream",
        pieces: 1,
        factor: (0.5, 0.7),
    },
];

/// Synthesize the menu for one restaurant.
///
/// Same `(restaurant_id, calibration, item_count)` always yields the same
/// menu, in any process.
pub fn synthesize_menu(
    restaurant_id: &str,
    calibration: &CalibrationRecord,
    item_count: usize,
) -> Result<Menu> {
    if restaurant_id.trim().is_empty() {
        return Err(Error::validation("restaurant_id is required"));
    }
    if item_count < MIN_ITEM_COUNT {
        return Err(Error::validation(format!(
            "item_count {} is below the {} required tuna roll variants",
            item_count, MIN_ITEM_COUNT
        )));
    }
    if item_count > MAX_ITEM_COUNT {
        return Err(Error::validation(format!(
            "item_count {} exceeds the {} distinct items available",
            item_count, MAX_ITEM_COUNT
        )));
    }
    if calibration.low_cents < 0 || calibration.low_cents > calibration.high_cents {
        return Err(Error::validation(format!(
            "calibration interval {}..{} is malformed",
            calibration.low_cents, calibration.high_cents
        )));
    }
    if !(0.0..=MAX_VARIANT_JITTER).contains(&calibration.jitter) {
        return Err(Error::validation(format!(
            "calibration jitter {} outside 0..={}",
            calibration.jitter, MAX_VARIANT_JITTER
        )));
    }

    let mut rng = stream_rng(restaurant_id, SeedStream::Menu);
    let jitter = calibration.jitter;
    let low = calibration.low_cents as f64;
    let high = calibration.high_cents as f64;

    // Keep every jittered, multiplied variant inside [low, high].
    let anchor_low = low / (1.0 - jitter);
    let anchor_high = high / (DELUXE_MULTIPLIER * (1.0 + jitter));
    if anchor_high < anchor_low {
        return Err(Error::validation(format!(
            "calibration interval {}..{} is too narrow for the tuna roll variant spread",
            calibration.low_cents, calibration.high_cents
        )));
    }
    let anchor = rng.gen_range(anchor_low..=anchor_high);

    let mut items = Vec::with_capacity(item_count);

    for variant_def in &TUNA_VARIANTS {
        let wobble: f64 = rng.gen_range(-jitter..=jitter);
        let raw = anchor * (1.0 + wobble) * variant_def.multiplier;
        let price = round_half_up(raw).clamp(calibration.low_cents, calibration.high_cents);
        items.push(MenuItem {
            name: variant_def.name.to_string(),
            category: Category::TARGET,
            variant: variant_def.variant,
            price_cents: price,
            currency: calibration.currency.clone(),
            pieces: variant_def.pieces,
            description: variant_def.description.to_string(),
        });
    }

    if items.windows(2).any(|w| w[0].price_cents >= w[1].price_cents) {
        return Err(Error::validation(format!(
            "calibration interval {}..{} cannot price distinct tuna roll variants",
            calibration.low_cents, calibration.high_cents
        )));
    }

    let filler_count = item_count - TUNA_VARIANTS.len();
    let catalog: &[Filler] = &FILLERS;
    let chosen: Vec<&Filler> = catalog.choose_multiple(&mut rng, filler_count).collect();
    for filler in chosen {
        let factor = rng.gen_range(filler.factor.0..=filler.factor.1);
        items.push(MenuItem {
            name: filler.name.to_string(),
            category: filler.category,
            variant: Variant::Regular,
            price_cents: round_half_up(anchor * factor).max(0),
            currency: calibration.currency.clone(),
            pieces: filler.pieces,
            description: filler.description.to_string(),
        });
    }

    debug!(
        "{}: menu with {} items, anchor {:.0}¢",
        restaurant_id,
        items.len(),
        anchor
    );

    Ok(Menu {
        restaurant_id: restaurant_id.to_string(),
        items,
    })
}
