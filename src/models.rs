//! Common domain types: ledger rows, date filters and derived aggregates.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction categories found in bookmaker ledger exports.
///
/// The set is open: exports routinely grow new row types, so anything we do
/// not recognize is carried through as `Other` with the original label and
/// simply contributes nothing to profit/loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxKind {
    BetStake,
    Win,
    CashedOut,
    Void,
    Deposit,
    Withdrawal,
    BetWithMates,
    Other(String),
}

impl TxKind {
    /// Map a ledger `Type` label onto a kind. Unknown labels are preserved.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Bet Stake" => TxKind::BetStake,
            "Win" => TxKind::Win,
            "Cashed Out" => TxKind::CashedOut,
            "Void" => TxKind::Void,
            "Deposit" => TxKind::Deposit,
            "Withdrawal" => TxKind::Withdrawal,
            "Bet with Mates" => TxKind::BetWithMates,
            other => TxKind::Other(other.to_string()),
        }
    }

    /// The ledger label for this kind (inverse of [`TxKind::from_label`]).
    pub fn label(&self) -> &str {
        match self {
            TxKind::BetStake => "Bet Stake",
            TxKind::Win => "Win",
            TxKind::CashedOut => "Cashed Out",
            TxKind::Void => "Void",
            TxKind::Deposit => "Deposit",
            TxKind::Withdrawal => "Withdrawal",
            TxKind::BetWithMates => "Bet with Mates",
            TxKind::Other(label) => label,
        }
    }

    /// True for row types that place money on a wager.
    pub fn is_stake(&self) -> bool {
        matches!(self, TxKind::BetStake | TxKind::BetWithMates)
    }

    /// True for row types that resolve a previously staked wager
    /// (win, early cash-out, or a voided bet returning the stake).
    pub fn is_settlement(&self) -> bool {
        matches!(self, TxKind::Win | TxKind::CashedOut | TxKind::Void)
    }
}

impl From<String> for TxKind {
    fn from(label: String) -> Self {
        TxKind::from_label(&label)
    }
}

impl From<TxKind> for String {
    fn from(kind: TxKind) -> Self {
        kind.label().to_string()
    }
}

/// A single accepted ledger row.
///
/// Every field is fully typed at ingestion time; rows that cannot satisfy
/// this shape never make it into a collection of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Normalized transaction time.
    pub timestamp: NaiveDateTime,
    /// Row category (`Bet Stake`, `Win`, …).
    pub kind: TxKind,
    /// Free-text event label, e.g. `"Team A vs Team B"`.
    pub description: String,
    /// Unique row identifier (non-empty, unique within an accepted set).
    pub transaction_id: String,
    /// Correlates the stake/settlement rows of one logical wager.
    pub bet_id: Option<String>,
    /// Signed amount as supplied by the export. The sign convention differs
    /// between sources, so aggregation normalizes via `kind`, never the sign.
    pub amount: Decimal,
    /// Running account balance after the row. Informational only.
    pub balance: Option<Decimal>,
}

/// Inclusive date window supplied by the caller before each aggregation.
///
/// `None` on either side means unbounded. Bounds are whole days: a timestamp
/// anywhere on the `start` or `end` day is in range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Unbounded range (the "no filter" sentinel).
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Inclusive day-granularity containment check.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let day = ts.date();
        if let Some(start) = self.start {
            if day < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if day > end {
                return false;
            }
        }
        true
    }
}

/// One chart-ready data point. Plain label/value pairs so the rendering
/// layer can bind them without depending on any charting library's types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: Decimal) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Accumulated stake and profit for one wagering event.
///
/// Rebuilt from scratch on every aggregation pass; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAggregate {
    /// Grouping key: the bet id when present, else the event description.
    pub key: String,
    /// Event description as first seen for this key.
    pub description: String,
    /// Total amount staked on the event (always non-negative).
    pub stake: Decimal,
    /// Net signed profit contribution of every row in the group.
    pub profit: Decimal,
    /// Number of stake rows in the group.
    pub bet_count: usize,
}

/// Scalar summary plus time-bucketed series for the current filtered row
/// set. Recomputed in full on every filter change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Count of stake rows.
    pub total_bets: usize,
    /// Sum of absolute stake amounts.
    pub total_stake: Decimal,
    /// Sum of absolute `Win` amounts.
    pub total_winnings: Decimal,
    /// Net profit/loss over the whole set.
    pub net_profit: Decimal,
    /// `total_stake / total_bets`, zero when no stakes.
    pub avg_stake: Decimal,
    /// `net_profit / total_stake` as a percentage, zero when no stakes.
    pub roi_pct: Decimal,
    /// `wins / (wins + losses)` as a percentage, zero when neither.
    pub win_rate_pct: Decimal,
    /// Count of `Win` rows.
    pub wins: usize,
    /// Stake rows whose bet id never settles within the set.
    pub losses: usize,
    /// Running net profit, one point per row in chronological order.
    pub cumulative: Vec<ChartPoint>,
    /// Independent net profit per calendar month, ascending.
    pub monthly: Vec<ChartPoint>,
    /// Net profit per weekday; exactly 7 entries, Sunday first.
    pub by_weekday: Vec<ChartPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_label_round_trip() {
        for label in [
            "Bet Stake",
            "Win",
            "Cashed Out",
            "Void",
            "Deposit",
            "Withdrawal",
            "Bet with Mates",
        ] {
            assert_eq!(TxKind::from_label(label).label(), label);
        }
    }

    #[test]
    fn unknown_label_is_tolerated() {
        let kind = TxKind::from_label("Free Bet Credit");
        assert_eq!(kind, TxKind::Other("Free Bet Credit".into()));
        assert_eq!(kind.label(), "Free Bet Credit");
        assert!(!kind.is_stake());
        assert!(!kind.is_settlement());
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 5),
            NaiveDate::from_ymd_opt(2023, 1, 10),
        );
        let at = |d: u32, h: u32| {
            NaiveDate::from_ymd_opt(2023, 1, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        assert!(range.contains(at(5, 0)));
        assert!(range.contains(at(10, 23)));
        assert!(!range.contains(at(4, 23)));
        assert!(!range.contains(at(11, 0)));
    }

    #[test]
    fn unbounded_range_contains_everything() {
        let ts = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(DateRange::all().contains(ts));
    }
}
