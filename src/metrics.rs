//! Aggregation & metrics: reduce an accepted row set (optionally narrowed
//! by a date window) into scalar summaries and chart-ready series.
//!
//! Everything here is a pure function of `(rows, filter)`: no retained
//! state, no caching, identical output for identical input. Amount signs
//! are normalized through the row kind — a stake always reduces profit by
//! its absolute value and a settlement always adds its absolute value back,
//! regardless of how the export chose to sign the raw numbers. Deposits,
//! withdrawals and unrecognized row types never touch profit/loss.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    ChartPoint, DateRange, EventAggregate, MetricsSnapshot, TransactionRecord, TxKind,
};

/// How many events the top-profitable / top-loss rankings keep.
pub const TOP_EVENTS: usize = 10;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Signed profit/loss contribution of one row.
fn contribution(tx: &TransactionRecord) -> Decimal {
    if tx.kind.is_stake() {
        -tx.amount.abs()
    } else if tx.kind.is_settlement() {
        tx.amount.abs()
    } else {
        Decimal::ZERO
    }
}

/// Narrow a row set to an inclusive date window. Rows outside the window
/// are dropped; original relative order is preserved.
pub fn filter_by_date_range(
    rows: &[TransactionRecord],
    range: &DateRange,
) -> Vec<TransactionRecord> {
    rows.iter()
        .filter(|tx| range.contains(tx.timestamp))
        .cloned()
        .collect()
}

/// Compute the full [`MetricsSnapshot`] for a filtered row set.
///
/// Win/loss correlation is indexed: one pass collects the bet ids that were
/// settled (won, cashed out or voided), then each stake row is a single
/// lookup. A stake with no bet id can never be matched to a settlement and
/// counts as a loss.
pub fn compute_metrics(rows: &[TransactionRecord]) -> MetricsSnapshot {
    let mut ordered: Vec<&TransactionRecord> = rows.iter().collect();
    ordered.sort_by_key(|tx| tx.timestamp);

    let settled: HashSet<&str> = rows
        .iter()
        .filter(|tx| tx.kind.is_settlement())
        .filter_map(|tx| tx.bet_id.as_deref())
        .collect();

    let mut total_bets = 0usize;
    let mut total_stake = Decimal::ZERO;
    let mut total_winnings = Decimal::ZERO;
    let mut net_profit = Decimal::ZERO;
    let mut wins = 0usize;
    let mut losses = 0usize;

    let mut cumulative = Vec::with_capacity(ordered.len());
    let mut monthly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    let mut by_weekday = [Decimal::ZERO; 7];

    for tx in &ordered {
        let delta = contribution(tx);
        net_profit += delta;

        if tx.kind.is_stake() {
            total_bets += 1;
            total_stake += tx.amount.abs();
            let is_won = tx
                .bet_id
                .as_deref()
                .is_some_and(|id| settled.contains(id));
            if !is_won {
                losses += 1;
            }
        } else if tx.kind == TxKind::Win {
            wins += 1;
            total_winnings += tx.amount.abs();
        }

        cumulative.push(ChartPoint::new(
            tx.timestamp.date().format("%Y-%m-%d").to_string(),
            net_profit,
        ));

        let day = tx.timestamp.date();
        *monthly.entry((day.year(), day.month())).or_default() += delta;
        by_weekday[day.weekday().num_days_from_sunday() as usize] += delta;
    }

    let avg_stake = if total_bets > 0 {
        total_stake / Decimal::from(total_bets as u64)
    } else {
        Decimal::ZERO
    };
    let roi_pct = if total_stake > Decimal::ZERO {
        net_profit / total_stake * dec!(100)
    } else {
        Decimal::ZERO
    };
    let win_rate_pct = if wins + losses > 0 {
        Decimal::from(wins as u64) / Decimal::from((wins + losses) as u64) * dec!(100)
    } else {
        Decimal::ZERO
    };

    MetricsSnapshot {
        total_bets,
        total_stake,
        total_winnings,
        net_profit,
        avg_stake,
        roi_pct,
        win_rate_pct,
        wins,
        losses,
        cumulative,
        monthly: monthly
            .into_iter()
            .map(|((year, month), profit)| {
                ChartPoint::new(format!("{year:04}-{month:02}"), profit)
            })
            .collect(),
        by_weekday: WEEKDAYS
            .iter()
            .zip(by_weekday)
            .map(|(day, profit)| ChartPoint::new(*day, profit))
            .collect(),
    }
}

/// Group rows into per-event stake/profit aggregates.
///
/// Grouping key is the bet id when present, otherwise the event
/// description. Only wager-related rows (stakes and settlements)
/// participate; deposits and withdrawals neither create nor join groups.
/// Group order follows first appearance in the input.
pub fn compute_event_aggregates(rows: &[TransactionRecord]) -> Vec<EventAggregate> {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut events: Vec<EventAggregate> = Vec::new();

    for tx in rows {
        if !tx.kind.is_stake() && !tx.kind.is_settlement() {
            continue;
        }
        let key = tx
            .bet_id
            .clone()
            .unwrap_or_else(|| tx.description.clone());

        let idx = *by_key.entry(key.clone()).or_insert_with(|| {
            events.push(EventAggregate {
                key,
                description: tx.description.clone(),
                stake: Decimal::ZERO,
                profit: Decimal::ZERO,
                bet_count: 0,
            });
            events.len() - 1
        });

        let event = &mut events[idx];
        event.profit += contribution(tx);
        if tx.kind.is_stake() {
            event.stake += tx.amount.abs();
            event.bet_count += 1;
        }
    }

    events
}

/// First [`TOP_EVENTS`] events by descending profit. Ties keep input order.
pub fn top_profitable(events: &[EventAggregate]) -> Vec<EventAggregate> {
    let mut ranked = events.to_vec();
    ranked.sort_by(|a, b| b.profit.cmp(&a.profit));
    ranked.truncate(TOP_EVENTS);
    ranked
}

/// First [`TOP_EVENTS`] events by ascending profit (worst losses first).
/// Ties keep input order.
pub fn top_losses(events: &[EventAggregate]) -> Vec<EventAggregate> {
    let mut ranked = events.to_vec();
    ranked.sort_by(|a, b| a.profit.cmp(&b.profit));
    ranked.truncate(TOP_EVENTS);
    ranked
}
