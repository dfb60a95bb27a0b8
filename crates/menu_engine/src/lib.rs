//! Menu engine for sushi-scout.
//!
//! Calibrates restaurant price signals, synthesizes deterministic menus and
//! delivery terms, and ranks tuna roll offers by landed cost.

pub mod batch;
pub mod calibration;
pub mod delivery;
pub mod menu;
pub mod money;
pub mod order;
pub mod rank;
pub mod scout;
pub mod seed;

pub use batch::{parse_candidates, parse_restaurants, BatchParse, RejectedEntry};
pub use calibration::{calibrate, CalibrationRecord, CalibrationSource, PriceCalibrator};
pub use delivery::{synthesize_delivery, DeliverySynthesizer};
pub use menu::synthesize_menu;
pub use order::{quote_order, CostBreakdown, OrderQuote};
pub use rank::{rank_cheapest, rank_with, validate_candidate, RankOptions};
pub use scout::{scout_cheapest, Scout, ScoutReport, Synthesized};
