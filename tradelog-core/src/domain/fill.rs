//! Fill — one matched entry/exit execution leg from the platform export.

use super::round2;

/// Direction of the position a fill belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPosition {
    Long,
    Short,
}

impl MarketPosition {
    /// Parse the export's `Market pos.` value. Anything that is not `Long`
    /// (case-insensitive) is treated as Short, matching the export's
    /// two-valued column.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("long") {
            MarketPosition::Long
        } else {
            MarketPosition::Short
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketPosition::Long => "Long",
            MarketPosition::Short => "Short",
        }
    }
}

/// One execution leg: a matched entry and exit with quantity and costs.
///
/// Constructed by [`crate::ingest::FillParser`] from a raw export row.
/// Immutable afterward except for quantity and commission, which the
/// aggregator increments when merging partial fills at the same exit price.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub account: String,
    pub position: MarketPosition,
    pub entry_price: f64,
    pub exit_price: f64,
    pub qty: u32,
    /// Timestamps stay opaque strings until the reporting stage needs a date.
    pub entry_time: String,
    pub exit_time: String,
    pub instrument: String,
    /// Profit as reported by the platform (display value, not used for P&L).
    pub profit: f64,
    pub commission: f64,
    /// Contract multiplier looked up from the instrument table (default 1).
    pub multiplier: f64,
    /// Fields that failed lenient parsing and were degraded to zero.
    pub issues: Vec<crate::ingest::FieldError>,
}

impl Fill {
    /// Signed price-points P&L: (exit − entry) × qty, flipped for shorts.
    pub fn pnl_points(&self) -> f64 {
        let raw = (self.exit_price - self.entry_price) * f64::from(self.qty);
        match self.position {
            MarketPosition::Long => round2(raw),
            MarketPosition::Short => round2(-raw),
        }
    }

    /// Currency P&L: points × instrument multiplier.
    pub fn pnl_dollars(&self) -> f64 {
        round2(self.pnl_points() * self.multiplier)
    }

    /// Merge a partial fill at the same exit price into this leg.
    ///
    /// Only quantity and commission accumulate; P&L is derived and follows.
    pub fn absorb(&mut self, other: &Fill) {
        self.qty += other.qty;
        self.commission += other.commission;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fill() -> Fill {
        Fill {
            account: "Sim101".into(),
            position: MarketPosition::Long,
            entry_price: 100.0,
            exit_price: 105.0,
            qty: 1,
            entry_time: "2024-03-15 09:30:00".into(),
            exit_time: "2024-03-15 09:45:00".into(),
            instrument: "MNQ JUN24".into(),
            profit: 10.0,
            commission: 0.62,
            multiplier: 2.0,
            issues: vec![],
        }
    }

    #[test]
    fn long_pnl_points() {
        let fill = sample_fill();
        assert_eq!(fill.pnl_points(), 5.0);
    }

    #[test]
    fn short_pnl_points_is_sign_flipped() {
        let mut fill = sample_fill();
        fill.position = MarketPosition::Short;
        assert_eq!(fill.pnl_points(), -5.0);
    }

    #[test]
    fn short_profit_when_exit_below_entry() {
        let mut fill = sample_fill();
        fill.position = MarketPosition::Short;
        fill.exit_price = 95.0;
        assert_eq!(fill.pnl_points(), 5.0);
    }

    #[test]
    fn dollars_apply_multiplier() {
        let fill = sample_fill();
        assert_eq!(fill.pnl_dollars(), 10.0);
    }

    #[test]
    fn pnl_scales_with_quantity() {
        let mut fill = sample_fill();
        fill.qty = 3;
        assert_eq!(fill.pnl_points(), 15.0);
        assert_eq!(fill.pnl_dollars(), 30.0);
    }

    #[test]
    fn pnl_rounds_to_two_decimals() {
        let mut fill = sample_fill();
        fill.entry_price = 100.0;
        fill.exit_price = 100.333_333;
        fill.multiplier = 1.0;
        assert_eq!(fill.pnl_points(), 0.33);
        assert_eq!(fill.pnl_dollars(), 0.33);
    }

    #[test]
    fn absorb_accumulates_qty_and_commission() {
        let mut leg = sample_fill();
        let partial = sample_fill();
        leg.absorb(&partial);
        assert_eq!(leg.qty, 2);
        assert_eq!(leg.commission, 1.24);
        // Derived P&L follows the merged quantity.
        assert_eq!(leg.pnl_points(), 10.0);
        assert_eq!(leg.pnl_dollars(), 20.0);
    }

    #[test]
    fn market_position_parse() {
        assert_eq!(MarketPosition::parse("Long"), MarketPosition::Long);
        assert_eq!(MarketPosition::parse(" long "), MarketPosition::Long);
        assert_eq!(MarketPosition::parse("Short"), MarketPosition::Short);
        assert_eq!(MarketPosition::parse(""), MarketPosition::Short);
    }
}
