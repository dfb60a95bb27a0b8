//! Cross-restaurant ranker.
//!
//! Filters every candidate's menu to one category, prices each match at
//! landed cost, and assigns contiguous 1-based ranks.
//!
//! Sort key, ascending:
//! 1. deliverable before flagged (flag policy only)
//! 2. `total_cost`
//! 3. restaurant name, case-insensitive
//! 4. variant name
//! 5. restaurant id, then item name, so the order is total

use std::cmp::Ordering;

use common::config::{RankingConfig, UnavailablePolicy};
use common::{dollars, Candidate, Category, Error, RankedOffer, Result, MAX_AMOUNT_CENTS};
use tracing::debug;

use crate::money::{checked_sum, round_half_up};

/// Knobs for one ranking call.
#[derive(Debug, Clone)]
pub struct RankOptions {
    pub category: String,
    pub include_delivery: bool,
    pub unavailable_policy: UnavailablePolicy,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            category: Category::TARGET.as_str().to_string(),
            include_delivery: true,
            unavailable_policy: UnavailablePolicy::Exclude,
        }
    }
}

impl From<&RankingConfig> for RankOptions {
    fn from(cfg: &RankingConfig) -> Self {
        Self {
            category: cfg.category.clone(),
            include_delivery: cfg.include_delivery,
            unavailable_policy: cfg.unavailable_policy,
        }
    }
}

/// Reject a candidate that cannot be priced.
pub fn validate_candidate(candidate: &Candidate) -> Result<()> {
    let id = candidate.restaurant_id.trim();
    if id.is_empty() {
        return Err(Error::validation("candidate is missing restaurant_id"));
    }
    if candidate.menu.restaurant_id != candidate.restaurant_id {
        return Err(Error::validation(format!(
            "{}: menu belongs to {:?}",
            id, candidate.menu.restaurant_id
        )));
    }
    let delivery = &candidate.delivery_info;
    if delivery.restaurant_id != candidate.restaurant_id {
        return Err(Error::validation(format!(
            "{}: delivery info belongs to {:?}",
            id, delivery.restaurant_id
        )));
    }
    if delivery.fee_cents < 0 {
        return Err(Error::validation(format!(
            "{}: negative delivery fee {}",
            id, delivery.fee_cents
        )));
    }
    if delivery.fee_cents > MAX_AMOUNT_CENTS {
        return Err(Error::validation(format!(
            "{}: delivery fee {} exceeds {}",
            id, delivery.fee_cents, MAX_AMOUNT_CENTS
        )));
    }
    if delivery.available && delivery.eta_minutes == 0 {
        return Err(Error::validation(format!(
            "{}: delivering restaurant has zero ETA",
            id
        )));
    }
    if let Some(item) = candidate.menu.items.iter().find(|i| i.price_cents < 0) {
        return Err(Error::validation(format!(
            "{}: negative price {} for {:?}",
            id, item.price_cents, item.name
        )));
    }
    if let Some(item) = candidate
        .menu
        .items
        .iter()
        .find(|i| i.price_cents > MAX_AMOUNT_CENTS)
    {
        return Err(Error::validation(format!(
            "{}: price {} for {:?} exceeds {}",
            id, item.price_cents, item.name, MAX_AMOUNT_CENTS
        )));
    }
    Ok(())
}

/// Rank with the exclude policy: restaurants that do not deliver are dropped
/// when delivery is included.
pub fn rank_cheapest(
    candidates: &[Candidate],
    category_filter: &str,
    include_delivery: bool,
) -> Result<Vec<RankedOffer>> {
    rank_with(
        candidates,
        &RankOptions {
            category: category_filter.to_string(),
            include_delivery,
            unavailable_policy: UnavailablePolicy::Exclude,
        },
    )
}

struct Scored {
    name_key: String,
    offer: RankedOffer,
}

fn compare(a: &Scored, b: &Scored) -> Ordering {
    a.offer
        .delivery_unavailable
        .cmp(&b.offer.delivery_unavailable)
        .then(a.offer.total_cost_cents.cmp(&b.offer.total_cost_cents))
        .then_with(|| a.name_key.cmp(&b.name_key))
        .then_with(|| a.offer.item.variant.as_str().cmp(b.offer.item.variant.as_str()))
        .then_with(|| a.offer.restaurant_id.cmp(&b.offer.restaurant_id))
        .then_with(|| a.offer.item.name.cmp(&b.offer.item.name))
}

/// Rank every matching item across all candidates.
///
/// Any malformed candidate fails the whole call; batch callers wanting
/// skip-and-report semantics validate entries first (see `batch`).
pub fn rank_with(candidates: &[Candidate], options: &RankOptions) -> Result<Vec<RankedOffer>> {
    for candidate in candidates {
        validate_candidate(candidate)?;
    }

    let mut scored = Vec::new();

    for candidate in candidates {
        let delivery = &candidate.delivery_info;
        let flagged = options.include_delivery && !delivery.available;
        if flagged && options.unavailable_policy == UnavailablePolicy::Exclude {
            debug!("{}: no delivery, excluded", candidate.restaurant_id);
            continue;
        }
        let fee = if options.include_delivery && delivery.available {
            delivery.fee_cents
        } else {
            0
        };

        for item in candidate.menu.items.iter() {
            if !item.category.matches(&options.category) {
                continue;
            }
            let pieces = item.pieces.max(1) as f64;
            let total_cost_cents = checked_sum(&[item.price_cents, fee])?;
            scored.push(Scored {
                name_key: candidate.restaurant_name.to_lowercase(),
                offer: RankedOffer {
                    rank: 0,
                    restaurant_id: candidate.restaurant_id.clone(),
                    restaurant_name: candidate.restaurant_name.clone(),
                    item: item.clone(),
                    item_price_cents: item.price_cents,
                    delivery_fee_cents: fee,
                    total_cost_cents,
                    price_per_piece_cents: round_half_up(item.price_cents as f64 / pieces),
                    eta_minutes: delivery.available.then_some(delivery.eta_minutes),
                    delivery_unavailable: flagged,
                },
            });
        }
    }

    scored.sort_by(compare);

    let offers: Vec<RankedOffer> = scored
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedOffer { rank: i + 1, ..s.offer })
        .collect();

    match offers.first() {
        Some(best) => debug!(
            "ranked {} offers across {} candidates; best {} at {} (${:.2})",
            offers.len(),
            candidates.len(),
            best.item.name,
            best.restaurant_name,
            dollars(best.total_cost_cents)
        ),
        None => debug!(
            "no {:?} offers across {} candidates",
            options.category,
            candidates.len()
        ),
    }

    Ok(offers)
}
