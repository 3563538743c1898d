//! Exit classification and the exit-leg wire encoding.
//!
//! Each exit leg of a trade is rendered as a string of the form
//! `"<TP|SL><index>: <json object>"` — the 1-based index is omitted when the
//! trade has exactly one leg. The full `Exits` column value is the JSON
//! rendering of the string sequence. This is the stable wire format between
//! the generation stage and the import stage, and encode → decode must be a
//! true round trip.
//!
//! The JSON leg body is a defined, versioned object (`"v": 1`); legs with a
//! newer version than this build understands are rejected rather than
//! misread.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::domain::{Fill, Trade};

/// Version of the per-leg JSON body. Bump when the body's fields change.
pub const EXIT_ENCODING_VERSION: u32 = 1;

/// Errors decoding an encoded exits value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("exits value is not a JSON string array: {0}")]
    NotAnArray(#[source] serde_json::Error),

    #[error("exit leg {leg:?} has no \": \" separator")]
    MissingSeparator { leg: String },

    #[error("exit leg has unknown type prefix {prefix:?}")]
    UnknownPrefix { prefix: String },

    #[error("exit leg body is not valid JSON: {0}")]
    BadBody(#[source] serde_json::Error),

    #[error("exit leg encoding version {found} is newer than supported {max}")]
    UnsupportedVersion { found: u32, max: u32 },
}

/// Classification of one exit leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    TakeProfit,
    StopLoss,
}

impl ExitKind {
    /// Positive points are a take-profit; zero or negative is a stop-loss.
    /// Ties go to the loss side.
    pub fn classify(pnl_points: f64) -> Self {
        if pnl_points > 0.0 {
            ExitKind::TakeProfit
        } else {
            ExitKind::StopLoss
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExitKind::TakeProfit => "TP",
            ExitKind::StopLoss => "SL",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "TP" => Some(ExitKind::TakeProfit),
            "SL" => Some(ExitKind::StopLoss),
            _ => None,
        }
    }
}

/// One decoded exit leg: the structured form of a wire string.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRecord {
    pub kind: ExitKind,
    pub price: f64,
    pub qty: u32,
    pub pnl_points: f64,
    pub pnl_dollars: f64,
    pub exit_time: String,
}

impl ExitRecord {
    pub fn from_fill(fill: &Fill) -> Self {
        ExitRecord {
            kind: ExitKind::classify(fill.pnl_points()),
            price: fill.exit_price,
            qty: fill.qty,
            pnl_points: fill.pnl_points(),
            pnl_dollars: fill.pnl_dollars(),
            exit_time: fill.exit_time.clone(),
        }
    }
}

/// The JSON body of one encoded leg. The kind lives in the string prefix,
/// not the body.
#[derive(Debug, Serialize, Deserialize)]
struct WireExit {
    v: u32,
    price: f64,
    qty: u32,
    pnl_points: f64,
    pnl_dollars: f64,
    exit_time: String,
}

/// Render a trade's legs as wire strings, one per leg in first-seen order.
/// A single-leg trade omits the index (`"TP: ..."`); multi-leg trades number
/// legs from 1 (`"TP1: ..."`, `"SL2: ..."`).
pub fn encode_exits(trade: &Trade) -> Vec<String> {
    let legs = trade.legs();
    legs.iter()
        .enumerate()
        .map(|(i, leg)| {
            let record = ExitRecord::from_fill(leg);
            let body = WireExit {
                v: EXIT_ENCODING_VERSION,
                price: record.price,
                qty: record.qty,
                pnl_points: record.pnl_points,
                pnl_dollars: record.pnl_dollars,
                exit_time: record.exit_time,
            };
            let json = serde_json::to_string(&body).expect("exit leg serialization failed");
            if legs.len() == 1 {
                format!("{}: {}", record.kind.code(), json)
            } else {
                format!("{}{}: {}", record.kind.code(), i + 1, json)
            }
        })
        .collect()
}

/// The full `Exits` column value: the JSON rendering of the leg strings.
pub fn encode_exits_column(trade: &Trade) -> String {
    serde_json::to_string(&encode_exits(trade)).expect("exits column serialization failed")
}

/// Decode one wire string back into a structured record.
pub fn decode_leg(leg: &str) -> Result<ExitRecord, DecodeError> {
    let (token, body) = leg
        .split_once(": ")
        .ok_or_else(|| DecodeError::MissingSeparator {
            leg: leg.to_string(),
        })?;
    // Strip the 1-based leg index; only the alphabetic prefix carries type.
    let prefix = token.trim_end_matches(|c: char| c.is_ascii_digit());
    let kind = ExitKind::from_code(prefix).ok_or_else(|| DecodeError::UnknownPrefix {
        prefix: token.to_string(),
    })?;
    let wire: WireExit = serde_json::from_str(body).map_err(DecodeError::BadBody)?;
    if wire.v > EXIT_ENCODING_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found: wire.v,
            max: EXIT_ENCODING_VERSION,
        });
    }
    Ok(ExitRecord {
        kind,
        price: wire.price,
        qty: wire.qty,
        pnl_points: wire.pnl_points,
        pnl_dollars: wire.pnl_dollars,
        exit_time: wire.exit_time,
    })
}

/// Decode an `Exits` column value back into structured records.
///
/// The outer array failing to parse is an error; a malformed individual leg
/// is logged and dropped so one bad leg never loses its siblings.
pub fn decode_exits(raw: &str) -> Result<Vec<ExitRecord>, DecodeError> {
    let legs: Vec<String> = serde_json::from_str(raw).map_err(DecodeError::NotAnArray)?;
    let mut records = Vec::with_capacity(legs.len());
    for leg in &legs {
        match decode_leg(leg) {
            Ok(record) => records.push(record),
            Err(err) => error!("dropping exit leg: {err}"),
        }
    }
    Ok(records)
}
