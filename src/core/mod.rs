mod engine;
mod error;
mod solver;
mod types;
mod validate;

pub use engine::{contribution_for_year, project, summarize};
pub use error::{ProjectionError, ProjectionResult};
pub use solver::{GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, solve_goal};
pub use types::{ContributionFrequency, ProjectionParams, ProjectionSummary, YearRecord};
pub use validate::{MAX_TOTAL_YEARS, validate_params};
