//! Lenient parsing of raw execution rows into [`Fill`]s.
//!
//! The platform export is loosely typed: prices arrive as plain numbers,
//! currency columns carry symbols and parenthesis negatives (`($12.50)`),
//! and occasional rows are malformed. The policy here mirrors the journal's
//! leniency contract: a field that fails to parse degrades to zero, is
//! logged, and is recorded on the fill so callers can inspect degradation.
//! Row construction itself never fails.

use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::domain::{Fill, MarketPosition, MultiplierTable};

/// A field that failed lenient parsing and was degraded to zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse {field}: {raw:?}")]
pub struct FieldError {
    pub field: &'static str,
    pub raw: String,
}

/// One raw row of the execution export, column names as the platform writes
/// them. Everything is a string at this stage.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFillRow {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Market pos.")]
    pub market_position: String,
    #[serde(rename = "Entry price")]
    pub entry_price: String,
    #[serde(rename = "Exit price")]
    pub exit_price: String,
    #[serde(rename = "Qty")]
    pub qty: String,
    #[serde(rename = "Entry time")]
    pub entry_time: String,
    #[serde(rename = "Exit time")]
    pub exit_time: String,
    #[serde(rename = "Instrument")]
    pub instrument: String,
    #[serde(rename = "Profit")]
    pub profit: String,
    #[serde(rename = "Commission")]
    pub commission: String,
}

/// Parse a plain decimal field.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, FieldError> {
    raw.trim().parse::<f64>().map_err(|_| FieldError {
        field,
        raw: raw.to_string(),
    })
}

/// Parse a quantity. Accepts an integer or an integral float rendering
/// (`"3"` or `"3.0"`), which exports produce interchangeably.
pub fn parse_quantity(field: &'static str, raw: &str) -> Result<u32, FieldError> {
    let trimmed = raw.trim();
    if let Ok(qty) = trimmed.parse::<u32>() {
        return Ok(qty);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) => {
            Ok(value as u32)
        }
        _ => Err(FieldError {
            field,
            raw: raw.to_string(),
        }),
    }
}

/// Parse a currency field: strips `$` and thousands separators, and maps
/// parenthesis-wrapped or leading-dash values to a negative magnitude.
/// `($12.50)` → -12.50, `$12.50` → 12.50, `-12.50` → -12.50.
pub fn parse_currency(field: &'static str, raw: &str) -> Result<f64, FieldError> {
    let trimmed = raw.trim();
    let paren_negative = trimmed.starts_with('(') && trimmed.ends_with(')');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | '(' | ')' | ','))
        .collect();
    let value = cleaned.trim().parse::<f64>().map_err(|_| FieldError {
        field,
        raw: raw.to_string(),
    })?;
    if paren_negative {
        Ok(-value.abs())
    } else {
        Ok(value)
    }
}

/// Converts raw export rows into fills using an explicit multiplier table.
#[derive(Debug, Clone)]
pub struct FillParser {
    multipliers: MultiplierTable,
}

impl FillParser {
    pub fn new(multipliers: MultiplierTable) -> Self {
        Self { multipliers }
    }

    /// Parse one raw row. Never fails: numeric fields that cannot be parsed
    /// degrade to zero and are recorded in `Fill::issues`.
    pub fn parse_row(&self, row: &RawFillRow) -> Fill {
        let mut issues = Vec::new();
        let mut lenient_f64 = |result: Result<f64, FieldError>| match result {
            Ok(value) => value,
            Err(err) => {
                error!("{err}; defaulting to zero");
                issues.push(err);
                0.0
            }
        };

        let entry_price = lenient_f64(parse_decimal("Entry price", &row.entry_price));
        let exit_price = lenient_f64(parse_decimal("Exit price", &row.exit_price));
        let profit = lenient_f64(parse_currency("Profit", &row.profit));
        let commission = lenient_f64(parse_currency("Commission", &row.commission));
        let qty = match parse_quantity("Qty", &row.qty) {
            Ok(qty) => qty,
            Err(err) => {
                error!("{err}; defaulting to zero");
                issues.push(err);
                0
            }
        };

        let instrument = row.instrument.trim().to_string();
        Fill {
            account: row.account.trim().to_string(),
            position: MarketPosition::parse(&row.market_position),
            entry_price,
            exit_price,
            qty,
            entry_time: row.entry_time.trim().to_string(),
            exit_time: row.exit_time.trim().to_string(),
            multiplier: self.multipliers.get(&instrument),
            instrument,
            profit,
            commission,
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> RawFillRow {
        RawFillRow {
            account: "Sim101".into(),
            market_position: "Long".into(),
            entry_price: "100.25".into(),
            exit_price: "105.5".into(),
            qty: "2".into(),
            entry_time: "2024-03-15 09:30:00".into(),
            exit_time: "2024-03-15 09:45:00".into(),
            instrument: "MNQ JUN24".into(),
            profit: "$10.50".into(),
            commission: "$1.24".into(),
        }
    }

    fn parser() -> FillParser {
        FillParser::new(MultiplierTable::from_map(
            [("MNQ JUN24".to_string(), 2.0)].into_iter().collect(),
        ))
    }

    #[test]
    fn currency_parenthesis_negative() {
        assert_eq!(parse_currency("Profit", "($12.50)").unwrap(), -12.50);
    }

    #[test]
    fn currency_plain_dollar() {
        assert_eq!(parse_currency("Profit", "$12.50").unwrap(), 12.50);
    }

    #[test]
    fn currency_leading_dash() {
        assert_eq!(parse_currency("Profit", "-12.50").unwrap(), -12.50);
    }

    #[test]
    fn currency_thousands_separator() {
        assert_eq!(parse_currency("Profit", "$1,250.00").unwrap(), 1250.0);
    }

    #[test]
    fn currency_garbage_is_error() {
        assert!(parse_currency("Profit", "n/a").is_err());
    }

    #[test]
    fn quantity_accepts_integral_float() {
        assert_eq!(parse_quantity("Qty", "3").unwrap(), 3);
        assert_eq!(parse_quantity("Qty", "3.0").unwrap(), 3);
        assert!(parse_quantity("Qty", "3.5").is_err());
        assert!(parse_quantity("Qty", "-1").is_err());
    }

    #[test]
    fn well_formed_row_parses_cleanly() {
        let fill = parser().parse_row(&raw_row());

        assert_eq!(fill.account, "Sim101");
        assert_eq!(fill.position, MarketPosition::Long);
        assert_eq!(fill.entry_price, 100.25);
        assert_eq!(fill.exit_price, 105.5);
        assert_eq!(fill.qty, 2);
        assert_eq!(fill.instrument, "MNQ JUN24");
        assert_eq!(fill.profit, 10.50);
        assert_eq!(fill.commission, 1.24);
        assert_eq!(fill.multiplier, 2.0);
        assert!(fill.issues.is_empty());
    }

    #[test]
    fn malformed_fields_degrade_to_zero() {
        let mut row = raw_row();
        row.entry_price = "oops".into();
        row.qty = "many".into();

        let fill = parser().parse_row(&row);

        assert_eq!(fill.entry_price, 0.0);
        assert_eq!(fill.qty, 0);
        assert_eq!(fill.issues.len(), 2);
        assert_eq!(fill.issues[0].field, "Entry price");
        assert_eq!(fill.issues[1].field, "Qty");
        // The rest of the row still parsed.
        assert_eq!(fill.exit_price, 105.5);
    }

    #[test]
    fn unknown_instrument_gets_unit_multiplier() {
        let mut row = raw_row();
        row.instrument = "CL AUG24".into();
        let fill = parser().parse_row(&row);
        assert_eq!(fill.multiplier, 1.0);
    }
}
