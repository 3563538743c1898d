//! Domain types: fills, trades, market position, and the multiplier table.

pub mod fill;
pub mod multiplier;
pub mod trade;

pub use fill::{Fill, MarketPosition};
pub use multiplier::MultiplierTable;
pub use trade::Trade;

/// Round to two decimal places, the precision used for all P&L values.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
