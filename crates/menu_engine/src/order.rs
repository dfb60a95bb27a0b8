//! Simulated order quotes for a ranked offer.
//!
//! Nothing is placed or paid for. The quote gives a cost breakdown with tax
//! and an order id that is stable within one wall-clock minute for the same
//! restaurant and item, so a retried request gets the same id.

use chrono::{DateTime, Utc};
use common::config::OrderConfig;
use common::{Cents, Error, RankedOffer, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::money::{apply_bps, checked_sum};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub subtotal_cents: Cents,
    pub delivery_fee_cents: Cents,
    pub tax_cents: Cents,
    pub total_cents: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub status: String,
    pub order_id: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub item_name: String,
    pub currency: String,
    pub delivery_address: String,
    pub special_instructions: Option<String>,
    pub eta_minutes: u32,
    pub cost: CostBreakdown,
    pub placed_at: DateTime<Utc>,
    /// Always true: no real order exists.
    pub simulated: bool,
}

/// `SS-` plus the first 8 hex digits (uppercase) of
/// SHA-256(`{restaurant_id}:{item_name}:{unix minute}`).
pub fn order_id(restaurant_id: &str, item_name: &str, now: DateTime<Utc>) -> String {
    let minute = now.timestamp().div_euclid(60);
    let digest = Sha256::digest(format!("{}:{}:{}", restaurant_id, item_name, minute).as_bytes());
    let short: String = digest[..4].iter().map(|b| format!("{:02X}", b)).collect();
    format!("SS-{}", short)
}

/// Quote delivery of `offer` to `delivery_address`.
pub fn quote_order(
    offer: &RankedOffer,
    delivery_address: &str,
    special_instructions: &str,
    now: DateTime<Utc>,
    config: &OrderConfig,
) -> Result<OrderQuote> {
    let address = delivery_address.trim();
    if address.is_empty() {
        return Err(Error::validation("delivery address is required"));
    }
    if offer.delivery_unavailable {
        return Err(Error::validation(format!(
            "{} does not deliver",
            offer.restaurant_name
        )));
    }
    if offer.item_price_cents < 0 || offer.delivery_fee_cents < 0 {
        return Err(Error::validation("offer carries a negative amount"));
    }
    if config.tax_rate_bps < 0 {
        return Err(Error::Config("tax rate must be non-negative".into()));
    }

    let tax_cents = apply_bps(offer.item_price_cents, config.tax_rate_bps)?;
    let total_cents =
        checked_sum(&[offer.item_price_cents, offer.delivery_fee_cents, tax_cents])?;
    let instructions = special_instructions.trim();

    Ok(OrderQuote {
        status: "confirmed".into(),
        order_id: order_id(&offer.restaurant_id, &offer.item.name, now),
        restaurant_id: offer.restaurant_id.clone(),
        restaurant_name: offer.restaurant_name.clone(),
        item_name: offer.item.name.clone(),
        currency: offer.item.currency.clone(),
        delivery_address: address.to_string(),
        special_instructions: (!instructions.is_empty()).then(|| instructions.to_string()),
        eta_minutes: offer.eta_minutes.unwrap_or(config.default_eta_minutes),
        cost: CostBreakdown {
            subtotal_cents: offer.item_price_cents,
            delivery_fee_cents: offer.delivery_fee_cents,
            tax_cents,
            total_cents,
        },
        placed_at: now,
        simulated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{Category, MenuItem, Variant};

    fn make_offer(price: i64, fee: i64) -> RankedOffer {
        RankedOffer {
            rank: 1,
            restaurant_id: "r-100".into(),
            restaurant_name: "Acme Sushi".into(),
            item: MenuItem {
                name: "Tuna Roll".into(),
                category: Category::TunaRoll,
                variant: Variant::Regular,
                price_cents: price,
                currency: "USD".into(),
                pieces: 6,
                description: String::new(),
            },
            item_price_cents: price,
            delivery_fee_cents: fee,
            total_cost_cents: price.saturating_add(fee),
            price_per_piece_cents: price / 6,
            eta_minutes: Some(25),
            delivery_unavailable: false,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_order_id_is_pinned() {
        // Minute 29_000_000 == 1_740_000_000s.
        assert_eq!(order_id("r-100", "Tuna Roll", at(1_740_000_000)), "SS-842819FF");
        // Same minute, same id.
        assert_eq!(order_id("r-100", "Tuna Roll", at(1_740_000_059)), "SS-842819FF");
        // Next minute, new id.
        assert_eq!(order_id("r-100", "Tuna Roll", at(1_740_000_060)), "SS-E8CC26D2");
    }

    #[test]
    fn test_cost_breakdown() {
        let quote = quote_order(
            &make_offer(750, 299),
            " 1 Market St ",
            "",
            at(1_740_000_000),
            &OrderConfig::default(),
        )
        .unwrap();
        assert_eq!(quote.status, "confirmed");
        assert!(quote.simulated);
        assert_eq!(quote.delivery_address, "1 Market St");
        assert_eq!(quote.special_instructions, None);
        assert_eq!(quote.eta_minutes, 25);
        assert_eq!(
            quote.cost,
            CostBreakdown {
                subtotal_cents: 750,
                delivery_fee_cents: 299,
                tax_cents: 66,
                total_cents: 1115,
            }
        );
    }

    #[test]
    fn test_default_eta_when_offer_has_none() {
        let mut offer = make_offer(800, 0);
        offer.eta_minutes = None;
        let quote = quote_order(&offer, "home", "extra ginger", at(0), &OrderConfig::default())
            .unwrap();
        assert_eq!(quote.eta_minutes, 30);
        assert_eq!(quote.special_instructions.as_deref(), Some("extra ginger"));
    }

    #[test]
    fn test_rejects_bad_requests() {
        let cfg = OrderConfig::default();
        assert!(matches!(
            quote_order(&make_offer(750, 0), "   ", "", at(0), &cfg),
            Err(Error::Validation(_))
        ));

        assert!(matches!(
            quote_order(&make_offer(i64::MAX, 0), "home", "", at(0), &cfg),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            quote_order(&make_offer(10_000, i64::MAX), "home", "", at(0), &cfg),
            Err(Error::Validation(_))
        ));

        let mut pickup_only = make_offer(750, 0);
        pickup_only.delivery_unavailable = true;
        assert!(matches!(
            quote_order(&pickup_only, "home", "", at(0), &cfg),
            Err(Error::Validation(_))
        ));
    }
}
