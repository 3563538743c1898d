//! Flattening staged trade rows into journal rows.
//!
//! The import stage re-parses each staged row's encoded `Exits` value and
//! materializes up to three take-profit legs and one stop-loss leg as flat
//! columns, plus the realized outcome (RoE) in points and dollars. The
//! three-slot cap is a reporting limitation: extra take-profit legs are
//! dropped from the flattened view, loudly.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::{round2, Trade};
use crate::exits::{self, ExitKind};

/// Take-profit columns materialized in the flattened view.
pub const TP_SLOTS: usize = 3;

/// Header of the journal sheet, in column order.
pub const JOURNAL_COLUMNS: [&str; 22] = [
    "Account",
    "Date",
    "Instrument",
    "Entry Time",
    "Entry Price",
    "Market Position",
    "Qty",
    "Commission",
    "Stop Loss",
    "TP 1",
    "TP 1 Qty",
    "TP 1 Exit Time",
    "TP 2",
    "TP 2 Qty",
    "TP 2 Exit Time",
    "TP 3",
    "TP 3 Qty",
    "TP 3 Exit Time",
    "SL Execution",
    "SL Exit Time",
    "RoE Pts",
    "RoE $",
];

/// Entry-time formats the platform is known to export, tried in order.
const ENTRY_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("unable to parse entry time {raw:?} with any known format")]
    UnparseableDate { raw: String },
}

/// One row of the staged trades CSV — the wire schema between the
/// generation stage and the import stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Market_pos")]
    pub market_position: String,
    #[serde(rename = "Entry_price")]
    pub entry_price: f64,
    #[serde(rename = "Qty")]
    pub qty: u32,
    #[serde(rename = "Entry_time")]
    pub entry_time: String,
    #[serde(rename = "Exit_time")]
    pub exit_time: String,
    #[serde(rename = "Instrument")]
    pub instrument: String,
    #[serde(rename = "Total_commission")]
    pub total_commission: f64,
    #[serde(rename = "Exits")]
    pub exits: String,
}

impl TradeRow {
    pub fn from_trade(trade: &Trade) -> Self {
        TradeRow {
            account: trade.account.clone(),
            market_position: trade.position.as_str().to_string(),
            entry_price: trade.entry_price,
            qty: trade.qty,
            entry_time: trade.entry_time.clone(),
            exit_time: trade.exit_time.clone(),
            instrument: trade.instrument.clone(),
            total_commission: trade.total_commission,
            exits: exits::encode_exits_column(trade),
        }
    }
}

/// One materialized take-profit slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TpSlot {
    pub price: f64,
    pub qty: u32,
    pub exit_time: String,
}

/// One flattened journal row, matching [`JOURNAL_COLUMNS`].
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRow {
    pub account: String,
    pub date: NaiveDate,
    pub instrument: String,
    pub entry_time: String,
    pub entry_price: f64,
    pub market_position: String,
    pub qty: u32,
    pub commission: f64,
    pub take_profits: [Option<TpSlot>; TP_SLOTS],
    pub stop_loss: Option<f64>,
    pub sl_execution: Option<f64>,
    pub sl_exit_time: Option<String>,
    pub roe_points: f64,
    pub roe_dollars: f64,
}

/// Result of flattening one staged row.
#[derive(Debug)]
pub struct Flattened {
    pub row: JournalRow,
    /// Take-profit legs beyond the third slot, dropped from the flat view.
    pub tp_overflow: usize,
}

/// Parse an entry timestamp into a calendar date, trying each known format.
pub fn parse_entry_date(raw: &str) -> Result<NaiveDate, FlattenError> {
    let trimmed = raw.trim();
    for format in ENTRY_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.date());
        }
    }
    Err(FlattenError::UnparseableDate {
        raw: raw.to_string(),
    })
}

/// Flatten one staged row into a journal row.
///
/// The encoded exits are decoded here; a malformed exits value is logged and
/// treated as an empty leg list (the row itself still lands in the journal).
/// Only an unparseable entry date skips the row.
pub fn flatten_row(row: &TradeRow) -> Result<Flattened, FlattenError> {
    let date = parse_entry_date(&row.entry_time)?;

    let records = match exits::decode_exits(&row.exits) {
        Ok(records) => records,
        Err(err) => {
            error!("failed to decode exits for trade at {}: {err}", row.entry_time);
            Vec::new()
        }
    };

    let mut take_profits: [Option<TpSlot>; TP_SLOTS] = [None, None, None];
    let mut stop_loss = None;
    let mut sl_execution = None;
    let mut sl_exit_time = None;
    let mut tp_overflow = 0usize;
    let mut points = 0.0;
    let mut dollars = 0.0;
    let mut sl_triggered = false;

    for record in &records {
        match record.kind {
            ExitKind::TakeProfit => {
                points += record.pnl_points;
                dollars += record.pnl_dollars;
                match take_profits.iter_mut().find(|slot| slot.is_none()) {
                    Some(slot) => {
                        *slot = Some(TpSlot {
                            price: record.price,
                            qty: record.qty,
                            exit_time: record.exit_time.clone(),
                        });
                    }
                    None => tp_overflow += 1,
                }
            }
            ExitKind::StopLoss => {
                // The stop's own loss replaces whatever the take-profits
                // had accumulated.
                points = -record.pnl_points.abs();
                dollars = -record.pnl_dollars.abs();
                stop_loss = Some(record.price);
                sl_execution = Some(record.price);
                sl_exit_time = Some(record.exit_time.clone());
                sl_triggered = true;
            }
        }
    }

    if tp_overflow > 0 {
        warn!(
            "trade at {} has {} take-profit leg(s) beyond the {TP_SLOTS}-slot cap; dropped from the flattened view",
            row.entry_time, tp_overflow
        );
    }

    // A stop-loss exit dominates the sign of the realized outcome.
    let (roe_points, roe_dollars) = if sl_triggered {
        (round2(-points.abs()), round2(-dollars.abs()))
    } else {
        (round2(points), round2(dollars))
    };

    Ok(Flattened {
        row: JournalRow {
            account: row.account.clone(),
            date,
            instrument: row.instrument.clone(),
            entry_time: row.entry_time.clone(),
            entry_price: row.entry_price,
            market_position: row.market_position.clone(),
            qty: row.qty,
            commission: row.total_commission,
            take_profits,
            stop_loss,
            sl_execution,
            sl_exit_time,
            roe_points,
            roe_dollars,
        },
        tp_overflow,
    })
}

impl JournalRow {
    /// Render as a sheet row matching [`JOURNAL_COLUMNS`]. Absent legs
    /// become empty cells.
    pub fn to_record(&self) -> Vec<String> {
        let opt_num = |v: Option<f64>| v.map(format_number).unwrap_or_default();
        let mut record = vec![
            self.account.clone(),
            self.date.to_string(),
            self.instrument.clone(),
            self.entry_time.clone(),
            format_number(self.entry_price),
            self.market_position.clone(),
            self.qty.to_string(),
            format!("{:.2}", self.commission),
            opt_num(self.stop_loss),
        ];
        for slot in &self.take_profits {
            match slot {
                Some(tp) => {
                    record.push(format_number(tp.price));
                    record.push(tp.qty.to_string());
                    record.push(tp.exit_time.clone());
                }
                None => record.extend([String::new(), String::new(), String::new()]),
            }
        }
        record.push(opt_num(self.sl_execution));
        record.push(self.sl_exit_time.clone().unwrap_or_default());
        record.push(format!("{:.2}", self.roe_points));
        record.push(format!("{:.2}", self.roe_dollars));
        debug_assert_eq!(record.len(), JOURNAL_COLUMNS.len());
        record
    }
}

/// Shortest lossless rendering for price-like values (105.0 → "105",
/// 105.25 → "105.25").
fn format_number(value: f64) -> String {
    format!("{value}")
}
