//! Option-chain rows as they arrive from a market-data provider, and their
//! conversion into [`OptionQuote`]s.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::surface::types::{OptionQuote, OptionType};

/// Calendar days per year used for expiry conversion
pub const DAYS_PER_YEAR: f64 = 365.25;

/// One contract of an option chain.
///
/// Empty CSV cells for the price and volume columns load as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub option_type: OptionType,
    pub strike: f64,
    /// Time to expiration in years
    pub years_to_exp: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub bid: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ask: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub volume: Option<f64>,
}

impl ChainRow {
    /// Last trade if there was one, otherwise the bid/ask midpoint.
    pub fn quote_price(&self) -> Option<f64> {
        match (self.last_price, self.bid, self.ask) {
            (Some(last), _, _) if last > 0.0 => Some(last),
            (_, Some(bid), Some(ask)) if bid > 0.0 && ask > 0.0 => Some(0.5 * (bid + ask)),
            _ => None,
        }
    }

    /// Rows that reported zero volume did not trade and are skipped.
    pub fn traded(&self) -> bool {
        self.volume.map_or(true, |v| v > 0.0)
    }

    pub fn to_quote(&self) -> Option<OptionQuote> {
        if !self.traded() {
            return None;
        }
        let price = self.quote_price()?;
        Some(OptionQuote::new(
            self.option_type,
            self.strike,
            self.years_to_exp,
            price,
        ))
    }
}

/// Convert calendar days to expiry into a year fraction.
pub fn years_from_days(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}

/// Quotes for every row with a usable price and non-zero volume.
pub fn quotes_from_chain(rows: &[ChainRow]) -> Vec<OptionQuote> {
    let quotes: Vec<OptionQuote> = rows.iter().filter_map(ChainRow::to_quote).collect();
    debug!(
        rows = rows.len(),
        quotes = quotes.len(),
        "converted option chain rows to quotes"
    );
    quotes
}

/// Read chain rows from CSV with a header row.
///
/// Expected columns: `option_type,strike,years_to_exp,last_price,bid,ask,volume`.
pub fn read_chain_csv<R: Read>(reader: R) -> Result<Vec<ChainRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize().enumerate() {
        let row: ChainRow =
            result.with_context(|| format!("Failed to parse chain row {}", line + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_chain_csv(path: impl AsRef<Path>) -> Result<Vec<ChainRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open chain file {}", path.display()))?;
    read_chain_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(last: Option<f64>, bid: Option<f64>, ask: Option<f64>, volume: Option<f64>) -> ChainRow {
        ChainRow {
            option_type: OptionType::Call,
            strike: 100.0,
            years_to_exp: 0.5,
            last_price: last,
            bid,
            ask,
            volume,
        }
    }

    #[test]
    fn test_price_selection() {
        assert_eq!(row(Some(5.0), Some(4.0), Some(4.4), Some(10.0)).quote_price(), Some(5.0));
        let mid = row(Some(0.0), Some(4.0), Some(4.4), Some(10.0)).quote_price().unwrap();
        assert!((mid - 4.2).abs() < 1e-12);
        assert_eq!(row(None, Some(0.0), Some(4.4), None).quote_price(), None);
        assert_eq!(row(None, None, None, None).quote_price(), None);
    }

    #[test]
    fn test_zero_volume_skipped() {
        assert!(row(Some(5.0), None, None, Some(0.0)).to_quote().is_none());
        assert!(row(Some(5.0), None, None, None).to_quote().is_some());
    }

    #[test]
    fn test_years_from_days() {
        assert!((years_from_days(365.25) - 1.0).abs() < 1e-15);
        assert!((years_from_days(3.6525) - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_read_csv_with_empty_cells() {
        let text = "option_type,strike,years_to_exp,last_price,bid,ask,volume\n\
                    call,100,0.5,6.1,6.0,6.2,120\n\
                    put,95,0.5,,2.0,2.2,\n\
                    put,90,0.25,1.0,,,0\n";
        let rows = read_chain_csv(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].option_type, OptionType::Put);
        assert_eq!(rows[1].last_price, None);

        let quotes = quotes_from_chain(&rows);
        assert_eq!(quotes.len(), 2);
        assert!((quotes[1].market_price - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_read_csv_reports_bad_row() {
        let text = "option_type,strike,years_to_exp,last_price,bid,ask,volume\n\
                    straddle,100,0.5,6.1,6.0,6.2,120\n";
        assert!(read_chain_csv(text.as_bytes()).is_err());
    }
}
