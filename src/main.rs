//! CLI wrapper: ingest a bookmaker ledger CSV and print a metrics report.
//!
//!   cargo run -- statement.csv
//!   cargo run -- statement.csv --date-format dmy --from 2023-01-01 --to 2023-06-30

use anyhow::{Context, Result};
use betting_analytics::{
    DateFormat, DateRange, compute_event_aggregates, compute_metrics, filter_by_date_range,
    parse_transactions, top_losses, top_profitable,
};
use chrono::NaiveDate;
use clap::{Arg, Command};
use rust_decimal::Decimal;
use std::{fs, io, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // ---------------------------------------------------------------- logging
    // send all tracing output to STDERR, keeping STDOUT clean for the report
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // ---------------------------------------------------------------- flags
    let matches = Command::new("betting-analytics")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .required(true)
                .help("Input ledger CSV"),
        )
        .arg(
            Arg::new("date-format")
                .long("date-format")
                .value_name("FMT")
                .default_value("iso")
                .help("Layout of the Time column: dmy, mdy or iso"),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .value_name("DATE")
                .help("Inclusive start date (YYYY-MM-DD)"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .value_name("DATE")
                .help("Inclusive end date (YYYY-MM-DD)"),
        )
        .get_matches();

    let in_path = PathBuf::from(matches.get_one::<String>("input").expect("required arg"));
    let format: DateFormat = matches
        .get_one::<String>("date-format")
        .expect("has default")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let range = DateRange::new(
        parse_bound(matches.get_one::<String>("from"))?,
        parse_bound(matches.get_one::<String>("to"))?,
    );

    // extension is only a fast pre-check; content validation decides
    if in_path.extension().and_then(|e| e.to_str()) != Some("csv") {
        warn!(path = %in_path.display(), "input does not have a .csv extension");
    }

    // ---------------------------------------------------------------- ingest
    let contents = fs::read_to_string(&in_path)
        .with_context(|| format!("reading {}", in_path.display()))?;
    let ingest = parse_transactions(&contents, format)?;

    if ingest.rejected_count() > 0 {
        warn!(
            "{} of {} rows accepted",
            ingest.accepted(),
            ingest.total_rows()
        );
        for err in &ingest.rejected {
            info!(%err, "dropped row");
        }
    } else {
        info!("ingested {} rows", ingest.accepted());
    }

    // ---------------------------------------------------------------- reduce
    let rows = if range == DateRange::all() {
        ingest.rows
    } else {
        filter_by_date_range(&ingest.rows, &range)
    };
    let snap = compute_metrics(&rows);
    let events = compute_event_aggregates(&rows);

    // ---------------------------------------------------------------- report
    println!("Total bets        {}", snap.total_bets);
    println!("Total stake       {}", money(snap.total_stake));
    println!("Total winnings    {}", money(snap.total_winnings));
    println!("Net profit/loss   {}", money(snap.net_profit));
    println!("Avg stake/bet     {}", money(snap.avg_stake));
    println!("ROI               {}%", money(snap.roi_pct));
    println!(
        "Win rate          {}% ({} wins / {} losses)",
        money(snap.win_rate_pct),
        snap.wins,
        snap.losses
    );

    if !snap.monthly.is_empty() {
        println!("\nProfit by month");
        for point in &snap.monthly {
            println!("  {}  {}", point.label, money(point.value));
        }
    }

    let top = top_profitable(&events);
    if !top.is_empty() {
        println!("\nTop profitable events");
        for event in &top {
            println!("  {}  {}", money(event.profit), event.description);
        }
        println!("\nTop loss-making events");
        for event in &top_losses(&events) {
            println!("  {}  {}", money(event.profit), event.description);
        }
    }

    Ok(())
}

fn parse_bound(value: Option<&String>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("invalid date `{v}` (expected YYYY-MM-DD)"))
        })
        .transpose()
}

fn money(d: Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}
