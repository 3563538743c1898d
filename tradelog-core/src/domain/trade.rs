//! Trade — an aggregated position from entry to flat, built from fills
//! sharing one (entry time, entry price, instrument) key.

use super::round2;
use super::{Fill, MarketPosition};
use crate::exits::ExitKind;

/// A reconstructed logical trade: one entry, one or more exit legs.
///
/// Entry fields come from the first fill seen for the key; totals are summed
/// over legs. A trade always has at least one leg, and leg order is the order
/// fills were first encountered (merges never reorder).
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub account: String,
    pub position: MarketPosition,
    pub entry_price: f64,
    pub entry_time: String,
    pub instrument: String,
    pub qty: u32,
    pub total_commission: f64,
    /// Latest exit time across legs.
    pub exit_time: String,
    legs: Vec<Fill>,
}

impl Trade {
    /// Build a trade from its final leg sequence. Returns `None` for an
    /// empty sequence, which the aggregator never produces.
    pub fn from_legs(legs: Vec<Fill>) -> Option<Self> {
        let first = legs.first()?;
        let exit_time = legs
            .iter()
            .map(|leg| leg.exit_time.as_str())
            .max()
            .unwrap_or_default()
            .to_string();
        Some(Trade {
            account: first.account.clone(),
            position: first.position,
            entry_price: first.entry_price,
            entry_time: first.entry_time.clone(),
            instrument: first.instrument.clone(),
            qty: legs.iter().map(|leg| leg.qty).sum(),
            total_commission: legs.iter().map(|leg| leg.commission).sum(),
            exit_time,
            legs,
        })
    }

    /// Exit legs in first-seen order. Never empty.
    pub fn legs(&self) -> &[Fill] {
        &self.legs
    }

    pub fn has_stop_loss(&self) -> bool {
        self.legs
            .iter()
            .any(|leg| ExitKind::classify(leg.pnl_points()) == ExitKind::StopLoss)
    }

    /// Aggregate realized P&L in points. Take-profit legs add to a running
    /// total; a stop-loss leg replaces it with the negated magnitude of its
    /// own loss, and any stop forces the final total negative.
    pub fn realized_points(&self) -> f64 {
        self.realized(Fill::pnl_points)
    }

    /// Aggregate realized P&L in currency, with the same accumulation rule.
    pub fn realized_dollars(&self) -> f64 {
        self.realized(Fill::pnl_dollars)
    }

    fn realized(&self, pnl: impl Fn(&Fill) -> f64) -> f64 {
        let mut total = 0.0;
        let mut sl_triggered = false;
        for leg in &self.legs {
            if ExitKind::classify(leg.pnl_points()) == ExitKind::StopLoss {
                total = -pnl(leg).abs();
                sl_triggered = true;
            } else {
                total += pnl(leg);
            }
        }
        if sl_triggered {
            round2(-total.abs())
        } else {
            round2(total)
        }
    }
}
