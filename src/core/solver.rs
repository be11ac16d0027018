use log::debug;

use super::engine::project;
use super::error::{ProjectionError, ProjectionResult};
use super::types::ProjectionParams;
use super::validate::validate_params;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GoalType {
    /// Smallest per-period contribution reaching the target.
    RequiredContribution,
    /// Smallest annual return (in percent) reaching the target.
    RequiredReturn,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_final_balance: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub final_balance: f64,
}

#[derive(Debug, Clone)]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_final_balance: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub achieved_final_balance: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Bisects on one parameter until the projected final balance reaches the target.
///
/// The final balance is non-decreasing in both the contribution amount and the return rate,
/// so the search keeps the upper bound feasible and returns it.
pub fn solve_goal(
    params: &ProjectionParams,
    config: GoalSolveConfig,
) -> ProjectionResult<GoalSolveResult> {
    validate_params(params)?;
    validate_config(params, config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_balance = evaluate_candidate(params, config.goal_type, config.search_min);
    let high_balance = evaluate_candidate(params, config.goal_type, config.search_max);

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if reaches(low_balance, config.target_final_balance) {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at the lower search bound.".to_string();
    } else if !reaches(high_balance, config.target_final_balance) {
        feasible = false;
        message = match config.goal_type {
            GoalType::RequiredContribution => {
                "No feasible contribution found within the search bounds.".to_string()
            }
            GoalType::RequiredReturn => {
                "No feasible return rate found within the search bounds.".to_string()
            }
        };
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let final_balance = evaluate_candidate(params, config.goal_type, mid);
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                final_balance,
            });

            if reaches(final_balance, config.target_final_balance) {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            match config.goal_type {
                GoalType::RequiredContribution => "Solved required contribution.".to_string(),
                GoalType::RequiredReturn => "Solved required annual return.".to_string(),
            }
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let achieved_final_balance =
        solved_value.map(|value| evaluate_candidate(params, config.goal_type, value));

    debug!(
        "goal solve {:?}: feasible={feasible} converged={converged} value={solved_value:?} after {} iterations",
        config.goal_type,
        iterations.len()
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_final_balance: config.target_final_balance,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_final_balance,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn reaches(final_balance: f64, target: f64) -> bool {
    final_balance + 1e-9 >= target
}

fn evaluate_candidate(base: &ProjectionParams, goal_type: GoalType, candidate_value: f64) -> f64 {
    let mut params = base.clone();
    match goal_type {
        GoalType::RequiredContribution => params.contribution_amount = candidate_value.max(0.0),
        GoalType::RequiredReturn => params.annual_return_pct = candidate_value.max(0.0),
    }
    project(&params)
        .last()
        .map(|r| r.closing_balance)
        .unwrap_or(params.initial_deposit)
}

fn validate_config(params: &ProjectionParams, config: GoalSolveConfig) -> ProjectionResult<()> {
    let invalid =
        |msg: &str| -> ProjectionResult<()> { Err(ProjectionError::InvalidConfig(msg.to_string())) };

    if config.goal_type == GoalType::RequiredContribution && params.contribution_years == 0 {
        return invalid("contribution_years must be > 0 to solve for a contribution");
    }
    if !config.target_final_balance.is_finite() || config.target_final_balance < 0.0 {
        return invalid("target_final_balance must be >= 0");
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return invalid("search bounds must be finite");
    }
    if config.search_min < 0.0 {
        return invalid("search_min must be >= 0");
    }
    if config.search_max <= config.search_min {
        return invalid("search_max must be greater than search_min");
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return invalid("tolerance must be > 0");
    }
    if config.max_iterations == 0 {
        return invalid("max_iterations must be > 0");
    }
    Ok(())
}
