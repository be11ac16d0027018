use log::trace;

use super::types::{ProjectionParams, ProjectionSummary, YearRecord};

/// Projects the balance ledger for years `1..=total_years`.
///
/// Inputs are expected to have passed [`super::validate_params`]; the function does not check
/// them again. Contributions are annualised (monthly amounts are multiplied by 12) and added at
/// the start of each contribution year, so they earn the full year's return.
pub fn project(params: &ProjectionParams) -> Vec<YearRecord> {
    let growth = 1.0 + params.annual_return_pct / 100.0;

    let mut balance = params.initial_deposit;
    let mut cumulative_contributions = 0.0;
    let mut records = Vec::with_capacity(params.total_years as usize);

    for year in 1..=params.total_years {
        let opening_balance = balance;

        if year <= params.contribution_years {
            let contribution = contribution_for_year(params, year);
            balance += contribution;
            cumulative_contributions += contribution;
        }

        balance *= growth;

        // Derived by subtraction each year so rounding noise does not accumulate; with a 0%
        // return this may come out as a tiny negative value.
        let cumulative_interest = balance - params.initial_deposit - cumulative_contributions;

        records.push(YearRecord {
            year,
            opening_balance,
            interest_earned_this_year: balance - opening_balance,
            cumulative_contributions,
            cumulative_interest,
            closing_balance: balance,
        });
    }

    trace!(
        "projected {} years, final balance {:.2}",
        records.len(),
        balance
    );
    records
}

/// Contribution added at the start of `year` (1-based); zero outside the contribution window.
pub fn contribution_for_year(params: &ProjectionParams, year: u32) -> f64 {
    if year == 0 || year > params.contribution_years {
        return 0.0;
    }
    let growth = 1.0 + params.contribution_growth_pct / 100.0;
    let exponent = i32::try_from(year - 1).unwrap_or(i32::MAX);
    params.annual_contribution_base() * growth.powi(exponent)
}

pub fn summarize(params: &ProjectionParams, records: &[YearRecord]) -> ProjectionSummary {
    match records.last() {
        Some(last) => ProjectionSummary {
            years: last.year,
            initial_deposit: params.initial_deposit,
            total_contributions: last.cumulative_contributions,
            total_interest: last.cumulative_interest,
            final_balance: last.closing_balance,
        },
        None => ProjectionSummary {
            years: 0,
            initial_deposit: params.initial_deposit,
            total_contributions: 0.0,
            total_interest: 0.0,
            final_balance: params.initial_deposit,
        },
    }
}
