//! Ingestion & validation: turn an uploaded delimited-text ledger into a
//! collection of typed [`TransactionRecord`]s.
//!
//! The header contract is the one bit-exact compatibility surface of the
//! whole system: `Time`, `Type`, `Summary`, `Transaction Id`, `Amount`,
//! `Balance` must all be present (compared case-sensitively after trimming
//! whitespace and surrounding quotes); `Bet Id` is read when present.
//!
//! Validation is two-phase. Header problems are fatal and reject the whole
//! file; row problems drop the offending row and keep going. The caller
//! declares the date format up front — there is no day-first/month-first
//! guessing, so `03/04/2023` can never be silently misread.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;

use crate::errors::{IngestError, Result, RowError, RowErrorKind};
use crate::models::{TransactionRecord, TxKind};

/// Required column headers, in contract order.
pub const REQUIRED_HEADERS: [&str; 6] = [
    "Time",
    "Type",
    "Summary",
    "Transaction Id",
    "Amount",
    "Balance",
];

/// Optional column correlating the rows of one wager.
pub const BET_ID_HEADER: &str = "Bet Id";

/// Caller-declared timestamp layout for the `Time` column.
///
/// Each variant tries only format strings of its own family, so a value
/// that would parse differently under another family is never guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `dd/mm/yyyy`-style, with optional `HH:MM[:SS]`.
    DayFirst,
    /// `mm/dd/yyyy`-style, with optional `HH:MM[:SS]`.
    MonthFirst,
    /// `yyyy-mm-dd`-style, with optional `HH:MM[:SS]`.
    Iso,
}

impl DateFormat {
    fn datetime_formats(self) -> &'static [&'static str] {
        match self {
            DateFormat::DayFirst => &[
                "%d/%m/%Y %H:%M:%S",
                "%d/%m/%Y %H:%M",
                "%d-%m-%Y %H:%M:%S",
                "%d-%m-%Y %H:%M",
            ],
            DateFormat::MonthFirst => &[
                "%m/%d/%Y %H:%M:%S",
                "%m/%d/%Y %H:%M",
                "%m-%d-%Y %H:%M:%S",
                "%m-%d-%Y %H:%M",
            ],
            DateFormat::Iso => &[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y/%m/%d %H:%M:%S",
                "%Y/%m/%d %H:%M",
            ],
        }
    }

    fn date_formats(self) -> &'static [&'static str] {
        match self {
            DateFormat::DayFirst => &["%d/%m/%Y", "%d-%m-%Y"],
            DateFormat::MonthFirst => &["%m/%d/%Y", "%m-%d-%Y"],
            DateFormat::Iso => &["%Y-%m-%d", "%Y/%m/%d"],
        }
    }

    /// Parse a timestamp under this family only. Date-only values are
    /// normalized to midnight.
    pub fn parse(self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        for fmt in self.datetime_formats() {
            if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(ts);
            }
        }
        for fmt in self.date_formats() {
            if let Ok(day) = NaiveDate::parse_from_str(value, fmt) {
                return day.and_hms_opt(0, 0, 0);
            }
        }
        None
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dmy" | "day-first" => Ok(DateFormat::DayFirst),
            "mdy" | "month-first" => Ok(DateFormat::MonthFirst),
            "iso" => Ok(DateFormat::Iso),
            other => Err(format!(
                "unknown date format `{other}` (expected dmy, mdy or iso)"
            )),
        }
    }
}

/// Outcome of one successful ingestion pass: the accepted rows in original
/// file order, plus every dropped row with its reason.
#[derive(Debug, Default)]
pub struct Ingest {
    pub rows: Vec<TransactionRecord>,
    pub rejected: Vec<RowError>,
}

impl Ingest {
    /// Number of rows accepted.
    pub fn accepted(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows dropped.
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Total data rows seen in the file (accepted + rejected).
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.rejected.len()
    }
}

/// Strip surrounding quotes and whitespace from a header cell before
/// comparison, without touching interior characters.
fn normalize_header(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Strip currency formatting (symbols, thousands separators, spaces) and
/// parse what remains as a decimal. `"-£1,234.56"` → `-1234.56`.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let scrubbed: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if scrubbed.is_empty() {
        return None;
    }
    Decimal::from_str(&scrubbed).ok()
}

/// Column offsets of the required headers within the actual header row,
/// in [`REQUIRED_HEADERS`] order, plus the optional `Bet Id` offset.
struct ColumnMap {
    required: [usize; REQUIRED_HEADERS.len()],
    bet_id: Option<usize>,
}

fn map_columns(headers: &StringRecord) -> Result<ColumnMap> {
    let names: Vec<&str> = headers.iter().map(normalize_header).collect();

    let mut required = [0usize; REQUIRED_HEADERS.len()];
    let mut missing = Vec::new();
    for (slot, wanted) in required.iter_mut().zip(REQUIRED_HEADERS) {
        match names.iter().position(|n| *n == wanted) {
            Some(idx) => *slot = idx,
            None => missing.push(wanted.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    Ok(ColumnMap {
        required,
        bet_id: names.iter().position(|n| *n == BET_ID_HEADER),
    })
}

/// Parse and validate an uploaded ledger.
///
/// Fatal outcomes (`Err`): unreadable CSV, missing required headers, or a
/// file with no data rows. Everything else degrades per row: the returned
/// [`Ingest`] holds the accepted rows in file order and one [`RowError`]
/// for each dropped row, so `accepted + rejected` always equals the number
/// of data rows in the file.
pub fn parse_transactions(input: &str, format: DateFormat) -> Result<Ingest> {
    if input.trim().is_empty() {
        return Err(IngestError::EmptyFile);
    }

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());

    let columns = map_columns(&rdr.headers()?.clone())?;

    let mut out = Ingest::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record?; // malformed delimited text is fatal
        let row = idx + 1;
        match validate_row(&record, &columns, format, &mut seen_ids) {
            Ok(tx) => out.rows.push(tx),
            Err(kind) => out.rejected.push(RowError { row, kind }),
        }
    }

    if out.total_rows() == 0 {
        return Err(IngestError::EmptyFile);
    }
    Ok(out)
}

fn validate_row(
    record: &StringRecord,
    columns: &ColumnMap,
    format: DateFormat,
    seen_ids: &mut HashSet<String>,
) -> std::result::Result<TransactionRecord, RowErrorKind> {
    // Required fields first: a short or blank cell rejects the row
    // before any parsing is attempted.
    let mut fields = [""; REQUIRED_HEADERS.len()];
    for (slot, (header, idx)) in fields
        .iter_mut()
        .zip(REQUIRED_HEADERS.iter().zip(columns.required))
    {
        match record.get(idx) {
            Some(value) if !value.is_empty() => *slot = value,
            _ => return Err(RowErrorKind::MissingField(header.to_string())),
        }
    }
    let [time, kind, summary, transaction_id, amount, balance] = fields;

    let timestamp = format
        .parse(time)
        .ok_or_else(|| RowErrorKind::UnparseableTime(time.to_string()))?;

    let amount = parse_amount(amount)
        .ok_or_else(|| RowErrorKind::UnparseableAmount(amount.to_string()))?;

    if !seen_ids.insert(transaction_id.to_string()) {
        return Err(RowErrorKind::DuplicateTransactionId(
            transaction_id.to_string(),
        ));
    }

    let bet_id = columns
        .bet_id
        .and_then(|idx| record.get(idx))
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(TransactionRecord {
        timestamp,
        kind: TxKind::from_label(kind),
        description: summary.to_string(),
        transaction_id: transaction_id.to_string(),
        bet_id,
        amount,
        // Informational only, so a non-numeric balance is not a reason
        // to drop the row.
        balance: parse_amount(balance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Time,Type,Summary,Transaction Id,Bet Id,Amount,Balance";

    fn ledger(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn accepts_well_formed_rows_in_order() {
        let input = ledger(&[
            "2023-01-05 10:00:00,Bet Stake,Team A vs Team B,t1,b1,-10,90",
            "2023-01-06 10:00:00,Win,Team A vs Team B,t2,b1,25,115",
        ]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 2);
        assert_eq!(ingest.rejected_count(), 0);
        assert_eq!(ingest.rows[0].transaction_id, "t1");
        assert_eq!(ingest.rows[0].kind, TxKind::BetStake);
        assert_eq!(ingest.rows[0].amount, dec!(-10));
        assert_eq!(ingest.rows[0].balance, Some(dec!(90)));
        assert_eq!(ingest.rows[1].bet_id.as_deref(), Some("b1"));
    }

    #[test]
    fn missing_columns_names_exactly_the_absent_headers() {
        let input = "Time,Type,Amount\n2023-01-05,Win,10";
        let err = parse_transactions(input, DateFormat::Iso).unwrap_err();
        match err {
            IngestError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["Summary", "Transaction Id", "Balance"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn quoted_headers_are_normalized() {
        let input =
            "\"Time\",\"Type\",\"Summary\",\"Transaction Id\",\"Amount\",\"Balance\"\n2023-01-05,Win,X,t1,10,100";
        let ingest = parse_transactions(input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 1);
        assert_eq!(ingest.rows[0].bet_id, None);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            parse_transactions("", DateFormat::Iso),
            Err(IngestError::EmptyFile)
        ));
        assert!(matches!(
            parse_transactions("   \n", DateFormat::Iso),
            Err(IngestError::EmptyFile)
        ));
    }

    #[test]
    fn header_only_file_is_rejected() {
        assert!(matches!(
            parse_transactions(HEADER, DateFormat::Iso),
            Err(IngestError::EmptyFile)
        ));
    }

    #[test]
    fn accepted_plus_rejected_equals_total() {
        let input = ledger(&[
            "2023-01-05,Bet Stake,Match 1,t1,b1,-10,90",
            "not-a-date,Win,Match 1,t2,b1,25,115",
            "2023-01-07,Win,Match 2,t3,,abc,120",
            "2023-01-08,Deposit,Top up,,,50,170",
        ]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 1);
        assert_eq!(ingest.rejected_count(), 3);
        assert_eq!(ingest.total_rows(), 4);
        assert_eq!(
            ingest.rejected[0].kind,
            RowErrorKind::UnparseableTime("not-a-date".into())
        );
        assert_eq!(
            ingest.rejected[1].kind,
            RowErrorKind::UnparseableAmount("abc".into())
        );
        assert_eq!(
            ingest.rejected[2].kind,
            RowErrorKind::MissingField("Transaction Id".into())
        );
    }

    #[test]
    fn duplicate_transaction_id_is_rejected() {
        let input = ledger(&[
            "2023-01-05,Bet Stake,Match 1,t1,b1,-10,90",
            "2023-01-06,Win,Match 1,t1,b1,25,115",
        ]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 1);
        assert_eq!(
            ingest.rejected[0].kind,
            RowErrorKind::DuplicateTransactionId("t1".into())
        );
    }

    #[test]
    fn currency_formatting_is_stripped_from_amounts() {
        let input = ledger(&["2023-01-05,Win,Match 1,t1,b1,\"$1,234.56\",\"$2,000.00\""]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.rows[0].amount, dec!(1234.56));
        assert_eq!(ingest.rows[0].balance, Some(dec!(2000.00)));
    }

    #[test]
    fn declared_format_decides_ambiguous_dates() {
        let input = ledger(&["03/04/2023 10:00:00,Win,Match 1,t1,b1,10,100"]);

        let dmy = parse_transactions(&input, DateFormat::DayFirst).unwrap();
        assert_eq!(dmy.rows[0].timestamp.date().to_string(), "2023-04-03");

        let mdy = parse_transactions(&input, DateFormat::MonthFirst).unwrap();
        assert_eq!(mdy.rows[0].timestamp.date().to_string(), "2023-03-04");
    }

    #[test]
    fn iso_format_rejects_slashed_day_first_dates() {
        let input = ledger(&["03/04/2023,Win,Match 1,t1,b1,10,100"]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 0);
        assert_eq!(
            ingest.rejected[0].kind,
            RowErrorKind::UnparseableTime("03/04/2023".into())
        );
    }

    #[test]
    fn date_only_values_normalize_to_midnight() {
        let input = ledger(&["2023-01-05,Win,Match 1,t1,b1,10,100"]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(
            ingest.rows[0].timestamp.to_string(),
            "2023-01-05 00:00:00"
        );
    }

    #[test]
    fn unknown_type_labels_are_tolerated() {
        let input = ledger(&["2023-01-05,Free Bet Credit,Match 1,t1,,5,105"]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.rows[0].kind, TxKind::Other("Free Bet Credit".into()));
    }

    #[test]
    fn bet_id_column_is_optional() {
        let input = "Time,Type,Summary,Transaction Id,Amount,Balance\n2023-01-05,Win,X,t1,10,100";
        let ingest = parse_transactions(input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.rows[0].bet_id, None);
    }

    #[test]
    fn short_rows_are_dropped_not_fatal() {
        let input = ledger(&[
            "2023-01-05,Win,Match 1,t1,b1,10,100",
            "2023-01-06,Win",
        ]);
        let ingest = parse_transactions(&input, DateFormat::Iso).unwrap();
        assert_eq!(ingest.accepted(), 1);
        assert_eq!(ingest.rejected_count(), 1);
        assert!(matches!(
            ingest.rejected[0].kind,
            RowErrorKind::MissingField(_)
        ));
    }
}
