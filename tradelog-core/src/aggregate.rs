//! Grouping fills into trades by their entry key.
//!
//! The key is (entry time, entry price, instrument) under exact value
//! equality — no tolerance. Within a key, fills sharing the same exit price
//! are partial executions of one take-profit/stop level and merge into a
//! single leg; a different exit price starts a new leg. Leg order is
//! first-seen order and merges never reorder it.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::domain::{Fill, Trade};

/// Aggregation key. Entry price participates by exact bit pattern, matching
/// the exact-equality contract for the grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TradeKey {
    entry_time: String,
    entry_price_bits: u64,
    instrument: String,
}

impl TradeKey {
    fn of(fill: &Fill) -> Self {
        TradeKey {
            entry_time: fill.entry_time.clone(),
            entry_price_bits: fill.entry_price.to_bits(),
            instrument: fill.instrument.clone(),
        }
    }
}

/// Group an ordered batch of fills into trades, one per unique entry key,
/// in first-seen key order.
pub fn aggregate(fills: Vec<Fill>) -> Vec<Trade> {
    let mut groups: IndexMap<TradeKey, Vec<Fill>> = IndexMap::new();

    for fill in fills {
        match groups.entry(TradeKey::of(&fill)) {
            Entry::Vacant(slot) => {
                slot.insert(vec![fill]);
            }
            Entry::Occupied(mut slot) => {
                let legs = slot.get_mut();
                // Exact exit-price match means the same logical TP/SL level
                // filled in multiple partial executions.
                #[allow(clippy::float_cmp)]
                match legs.iter_mut().find(|leg| leg.exit_price == fill.exit_price) {
                    Some(leg) => leg.absorb(&fill),
                    None => legs.push(fill),
                }
            }
        }
    }

    groups.into_values().filter_map(Trade::from_legs).collect()
}
