use super::error::{ProjectionError, ProjectionResult};
use super::types::ProjectionParams;

/// Deployment limit on the projection horizon. Not a property of the model: the engine itself
/// handles any horizon, this only keeps a single request from producing an unbounded ledger.
pub const MAX_TOTAL_YEARS: u32 = 1_000;

pub fn validate_params(params: &ProjectionParams) -> ProjectionResult<()> {
    for (field, value) in [
        ("initial_deposit", params.initial_deposit),
        ("contribution_amount", params.contribution_amount),
        ("contribution_growth_pct", params.contribution_growth_pct),
        ("annual_return_pct", params.annual_return_pct),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::invalid_range(field, "must be a finite number"));
        }
        if value < 0.0 {
            return Err(ProjectionError::invalid_range(
                field,
                format!("must be >= 0, got {value}"),
            ));
        }
    }

    if params.total_years == 0 {
        return Err(ProjectionError::invalid_range("total_years", "must be > 0"));
    }

    if params.total_years > MAX_TOTAL_YEARS {
        return Err(ProjectionError::invalid_range(
            "total_years",
            format!(
                "{} exceeds this tool's horizon limit of {MAX_TOTAL_YEARS} years",
                params.total_years
            ),
        ));
    }

    if params.contribution_years > params.total_years {
        return Err(ProjectionError::invalid_range(
            "contribution_years",
            format!(
                "must be <= total_years ({}), got {}",
                params.total_years, params.contribution_years
            ),
        ));
    }

    Ok(())
}

impl ProjectionParams {
    pub fn validated(self) -> ProjectionResult<Self> {
        validate_params(&self)?;
        Ok(self)
    }
}
