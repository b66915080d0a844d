//! Quote screening ahead of the solver.
//!
//! Rules run in a fixed order and the first one that fires decides the drop
//! reason: price floor, then time floor, then the moneyness band.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::surface::config::FilterConfig;
use crate::surface::types::{OptionQuote, OptionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Price below the floor (or not a number)
    Price,
    /// Expiry sooner than the floor (or not a number)
    Time,
    /// Too deep in-the-money for a reliable vol
    Moneyness,
}

/// Counts of what the filter kept and why it dropped the rest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub input: usize,
    pub retained: usize,
    pub dropped_price: usize,
    pub dropped_time: usize,
    pub dropped_moneyness: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.dropped_price + self.dropped_time + self.dropped_moneyness
    }

    fn record(&mut self, verdict: Option<DropReason>) {
        self.input += 1;
        match verdict {
            None => self.retained += 1,
            Some(DropReason::Price) => self.dropped_price += 1,
            Some(DropReason::Time) => self.dropped_time += 1,
            Some(DropReason::Moneyness) => self.dropped_moneyness += 1,
        }
    }
}

/// Returns the reason `quote` should be dropped, or `None` to keep it.
pub fn screen_quote(quote: &OptionQuote, spot: f64, config: &FilterConfig) -> Option<DropReason> {
    // Negated comparisons so NaN is dropped too
    if !(quote.market_price >= config.price_floor) {
        return Some(DropReason::Price);
    }
    if !(quote.years_to_exp >= config.time_floor) {
        return Some(DropReason::Time);
    }

    let moneyness = quote.moneyness(spot);
    let too_deep = match quote.option_type {
        OptionType::Call => !(moneyness <= config.call_max_moneyness),
        OptionType::Put => !(moneyness >= config.put_min_moneyness),
    };
    if too_deep {
        return Some(DropReason::Moneyness);
    }
    None
}

/// Screen `quotes`, preserving the order of the survivors.
pub fn filter_quotes(
    quotes: &[OptionQuote],
    spot: f64,
    config: &FilterConfig,
) -> (Vec<OptionQuote>, FilterStats) {
    let mut stats = FilterStats::default();
    let retained: Vec<OptionQuote> = quotes
        .iter()
        .filter(|quote| {
            let verdict = screen_quote(quote, spot, config);
            stats.record(verdict);
            verdict.is_none()
        })
        .copied()
        .collect();

    debug!(
        input = stats.input,
        retained = stats.retained,
        dropped_price = stats.dropped_price,
        dropped_time = stats.dropped_time,
        dropped_moneyness = stats.dropped_moneyness,
        "filtered quotes"
    );
    (retained, stats)
}
