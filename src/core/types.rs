use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionFrequency {
    Annual,
    Monthly,
}

impl ContributionFrequency {
    /// Multiplier turning a per-period contribution into an annual amount.
    pub fn factor(self) -> f64 {
        match self {
            ContributionFrequency::Annual => 1.0,
            ContributionFrequency::Monthly => 12.0,
        }
    }
}

/// Inputs for one projection. Percentages are stored as entered (7.0 means 7%).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionParams {
    pub initial_deposit: f64,
    pub contribution_amount: f64,
    pub contribution_growth_pct: f64,
    pub contribution_years: u32,
    pub total_years: u32,
    pub annual_return_pct: f64,
    pub frequency: ContributionFrequency,
}

impl ProjectionParams {
    pub fn annual_contribution_base(&self) -> f64 {
        self.contribution_amount * self.frequency.factor()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: u32,
    pub opening_balance: f64,
    /// Closing minus opening balance, so it includes the year's contribution.
    pub interest_earned_this_year: f64,
    pub cumulative_contributions: f64,
    pub cumulative_interest: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub years: u32,
    pub initial_deposit: f64,
    pub total_contributions: f64,
    pub total_interest: f64,
    pub final_balance: f64,
}
