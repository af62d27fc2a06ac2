//! Trade-ledger summary statistics.

use super::position::{Outcome, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// wins / total_trades, 0 for an empty ledger.
    pub win_ratio: f64,
    /// Mean of per-trade `return_pct`, 0 for an empty ledger.
    pub average_return: f64,
    /// Trades force-closed at the end of the window rather than by the exit rule.
    pub forced_exits: usize,
    pub best_return: f64,
    pub worst_return: f64,
    pub avg_bars_held: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub summary: Summary,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            wins: 0,
            losses: 0,
            win_ratio: 0.0,
            average_return: 0.0,
            forced_exits: 0,
            best_return: 0.0,
            worst_return: 0.0,
            avg_bars_held: 0.0,
        }
    }

    pub fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::empty();
        }

        let mut wins = 0usize;
        let mut forced_exits = 0usize;
        let mut total_return = 0.0_f64;
        let mut best_return = f64::NEG_INFINITY;
        let mut worst_return = f64::INFINITY;
        let mut total_bars_held = 0usize;

        for trade in trades {
            if trade.outcome == Outcome::Win {
                wins += 1;
            }
            if trade.exit_reason.is_forced() {
                forced_exits += 1;
            }
            total_return += trade.return_pct;
            best_return = best_return.max(trade.return_pct);
            worst_return = worst_return.min(trade.return_pct);
            total_bars_held += trade.bars_held;
        }

        let total_trades = trades.len();
        let n = total_trades as f64;

        Self {
            total_trades,
            wins,
            losses: total_trades - wins,
            win_ratio: wins as f64 / n,
            average_return: total_return / n,
            forced_exits,
            best_return,
            worst_return,
            avg_bars_held: total_bars_held as f64 / n,
        }
    }

    /// Natural (non-forced) exits only.
    pub fn natural_exits(&self) -> usize {
        self.total_trades - self.forced_exits
    }
}

impl SymbolSummary {
    /// One summary per symbol in `symbols` order. Symbols without trades get
    /// an empty summary; trades of unlisted symbols are ignored.
    pub fn compute_per_symbol<'a>(
        symbols: impl IntoIterator<Item = &'a str>,
        trades: &[Trade],
    ) -> Vec<SymbolSummary> {
        symbols
            .into_iter()
            .map(|symbol| {
                let own: Vec<Trade> = trades
                    .iter()
                    .filter(|t| t.symbol == symbol)
                    .cloned()
                    .collect();
                SymbolSummary {
                    symbol: symbol.to_string(),
                    summary: Summary::compute(&own),
                }
            })
            .collect()
    }
}
