use std::io::Write;

use crate::core::{ProjectionResult, ProjectionSummary, YearRecord};

pub const CSV_HEADER: [&str; 6] = [
    "year",
    "opening_balance",
    "interest_earned_this_year",
    "cumulative_contributions",
    "cumulative_interest",
    "closing_balance",
];

/// Formats an amount as `$1,234,567.89`, with a leading `-` for negatives.
/// Overflowed amounts render as `$∞` / `-$∞` and NaN as `n/a`.
pub fn format_currency(value: f64) -> String {
    if value.is_nan() {
        return "n/a".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "$∞" } else { "-$∞" }.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Rounds to zero: avoid printing "-$0.00".
    let negative = value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

pub fn render_summary(summary: &ProjectionSummary) -> String {
    let rows = [
        ("Initial deposit", summary.initial_deposit),
        ("Cumulative contributions", summary.total_contributions),
        ("Cumulative interest", summary.total_interest),
        ("Final balance", summary.final_balance),
    ];
    let mut out = format!("Summary after {} years\n", summary.years);
    for (label, value) in rows {
        out.push_str(&format!("  {label:<26}{:>20}\n", format_currency(value)));
    }
    out
}

pub fn render_table(records: &[YearRecord]) -> String {
    let mut out = format!(
        "{:>5} {:>18} {:>18} {:>18} {:>18} {:>18}\n",
        "Year", "Opening", "Interest (year)", "Contributions", "Interest (total)", "Closing"
    );
    out.push_str(&"-".repeat(5 + 5 * 19));
    out.push('\n');
    for r in records {
        out.push_str(&format!(
            "{:>5} {:>18} {:>18} {:>18} {:>18} {:>18}\n",
            r.year,
            format_currency(r.opening_balance),
            format_currency(r.interest_earned_this_year),
            format_currency(r.cumulative_contributions),
            format_currency(r.cumulative_interest),
            format_currency(r.closing_balance),
        ));
    }
    out
}

/// Writes the ledger as CSV with amounts rounded to cents.
pub fn write_csv<W: Write>(writer: W, records: &[YearRecord]) -> ProjectionResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for r in records {
        csv_writer.write_record([
            r.year.to_string(),
            format!("{:.2}", r.opening_balance),
            format!("{:.2}", r.interest_earned_this_year),
            format!("{:.2}", r.cumulative_contributions),
            format!("{:.2}", r.cumulative_interest),
            format!("{:.2}", r.closing_balance),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
