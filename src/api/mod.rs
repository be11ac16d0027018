pub mod format;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ContributionFrequency, GoalSolveConfig, GoalSolveResult, GoalType, ProjectionParams,
    ProjectionResult, ProjectionSummary, YearRecord, project, solve_goal, summarize,
};
use format::{format_currency, render_summary, render_table, write_csv};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFrequency {
    Annual,
    Monthly,
}

impl From<CliFrequency> for ContributionFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Annual => ContributionFrequency::Annual,
            CliFrequency::Monthly => ContributionFrequency::Monthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliGoalType {
    RequiredContribution,
    RequiredReturn,
}

impl From<CliGoalType> for GoalType {
    fn from(value: CliGoalType) -> Self {
        match value {
            CliGoalType::RequiredContribution => GoalType::RequiredContribution,
            CliGoalType::RequiredReturn => GoalType::RequiredReturn,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "yearly", alias = "annually", alias = "Annual")]
    Annual,
    #[serde(alias = "Monthly")]
    Monthly,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Annual => CliFrequency::Annual,
            ApiFrequency::Monthly => CliFrequency::Monthly,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_deposit: Option<f64>,
    contribution: Option<f64>,
    contribution_growth: Option<f64>,
    contribution_years: Option<u32>,
    total_years: Option<u32>,
    annual_return: Option<f64>,
    frequency: Option<ApiFrequency>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound interest projector (initial deposit + growing recurring contributions)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the year-by-year ledger.
    Project {
        #[command(flatten)]
        params: ParamArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Search for the contribution or return needed to reach a final balance.
    Solve {
        #[command(flatten)]
        params: ParamArgs,
        #[command(flatten)]
        goal: GoalArgs,
    },
    /// Serve the browser calculator and JSON/CSV API.
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ParamArgs {
    #[arg(long, default_value_t = 600_000.0, help = "Initial deposit")]
    pub initial_deposit: f64,
    #[arg(
        long,
        default_value_t = 65_000.0,
        help = "Contribution per period (per year or per month, see --frequency)"
    )]
    pub contribution: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual growth of the contribution in percent"
    )]
    pub contribution_growth: f64,
    #[arg(long, default_value_t = 15, help = "Number of years with contributions")]
    pub contribution_years: u32,
    #[arg(
        long,
        default_value_t = 40,
        help = "Total number of years to project (this tool caps the horizon at 1000 years)"
    )]
    pub total_years: u32,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected average annual return in percent"
    )]
    pub annual_return: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Annual)]
    pub frequency: CliFrequency,
}

impl Default for ParamArgs {
    fn default() -> Self {
        Self {
            initial_deposit: 600_000.0,
            contribution: 65_000.0,
            contribution_growth: 0.0,
            contribution_years: 15,
            total_years: 40,
            annual_return: 7.0,
            frequency: CliFrequency::Annual,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GoalArgs {
    #[arg(long, value_enum)]
    pub goal: CliGoalType,
    #[arg(long, help = "Final balance to reach")]
    pub target_balance: f64,
    #[arg(long, default_value_t = 0.0)]
    pub search_min: f64,
    #[arg(
        long,
        default_value_t = 1_000_000.0,
        help = "Upper search bound (contribution amount or return in percent)"
    )]
    pub search_max: f64,
    #[arg(long, default_value_t = 0.01)]
    pub tolerance: f64,
    #[arg(long, default_value_t = 200)]
    pub max_iterations: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    params: ProjectionParams,
    summary: ProjectionSummary,
    years: Vec<YearRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_params(args: ParamArgs) -> ProjectionResult<ProjectionParams> {
    ProjectionParams {
        initial_deposit: args.initial_deposit,
        contribution_amount: args.contribution,
        contribution_growth_pct: args.contribution_growth,
        contribution_years: args.contribution_years,
        total_years: args.total_years,
        annual_return_pct: args.annual_return,
        frequency: args.frequency.into(),
    }
    .validated()
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Project { params, format } => {
            let params = build_params(params).map_err(|e| e.to_string())?;
            let stdout = io::stdout();
            write_projection(stdout.lock(), &params, format).map_err(|e| e.to_string())
        }
        Command::Solve { params, goal } => {
            let params = build_params(params).map_err(|e| e.to_string())?;
            let result = solve_goal(&params, goal_config(&goal)).map_err(|e| e.to_string())?;
            info!("{}", result.message);
            print!("{}", render_goal_result(&result));
            Ok(())
        }
    }
}

fn write_projection<W: Write>(
    mut out: W,
    params: &ProjectionParams,
    format: OutputFormat,
) -> ProjectionResult<()> {
    let years = project(params);
    match format {
        OutputFormat::Table => {
            let summary = summarize(params, &years);
            write!(out, "{}\n{}", render_summary(&summary), render_table(&years))?;
        }
        OutputFormat::Csv => write_csv(out, &years)?,
        OutputFormat::Json => {
            let response = build_project_response(params.clone(), years);
            serde_json::to_writer_pretty(&mut out, &response).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn goal_config(goal: &GoalArgs) -> GoalSolveConfig {
    GoalSolveConfig {
        goal_type: goal.goal.into(),
        target_final_balance: goal.target_balance,
        search_min: goal.search_min,
        search_max: goal.search_max,
        tolerance: goal.tolerance,
        max_iterations: goal.max_iterations,
    }
}

fn render_goal_result(result: &GoalSolveResult) -> String {
    let mut out = format!(
        "{}\nTarget final balance: {}\nIterations: {}\n",
        result.message,
        format_currency(result.target_final_balance),
        result.iterations.len()
    );
    if let Some(value) = result.solved_value {
        let solved = match result.goal_type {
            GoalType::RequiredContribution => format!("Contribution: {}", format_currency(value)),
            GoalType::RequiredReturn => format!("Annual return: {value:.4}%"),
        };
        out.push_str(&solved);
        out.push('\n');
    }
    if let Some(balance) = result.achieved_final_balance {
        out.push_str(&format!("Achieved final balance: {}\n", format_currency(balance)));
    }
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/project.csv",
            get(project_csv_get_handler).post(project_csv_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("compound interest API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(payload: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn project_csv_get_handler(
    payload: Result<Query<ProjectPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => project_csv_handler_impl(payload),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn project_csv_post_handler(
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => project_csv_handler_impl(payload),
        Err(rejection) => rejection_response(rejection),
    }
}

/// Undecodable query strings or bodies (negative or fractional year counts, bad JSON) get the
/// same JSON error shape as range failures.
fn rejection_response(rejection: impl std::fmt::Display) -> Response {
    let msg = format!("Invalid request parameters: {rejection}");
    warn!("rejected projection request: {msg}");
    error_response(StatusCode::BAD_REQUEST, &msg)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let years = project(&params);
    json_response(StatusCode::OK, build_project_response(params, years))
}

fn project_csv_handler_impl(payload: ProjectPayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let years = project(&params);
    let mut body = Vec::new();
    if let Err(e) = write_csv(&mut body, &years) {
        warn!("csv export failed: {e}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }
    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"projection.csv\"",
            ),
        ],
        body,
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<ProjectionParams, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: ProjectPayload) -> Result<ProjectionParams, String> {
    let mut args = ParamArgs::default();

    if let Some(v) = payload.initial_deposit {
        args.initial_deposit = v;
    }
    if let Some(v) = payload.contribution {
        args.contribution = v;
    }
    if let Some(v) = payload.contribution_growth {
        args.contribution_growth = v;
    }
    if let Some(v) = payload.contribution_years {
        args.contribution_years = v;
    }
    if let Some(v) = payload.total_years {
        args.total_years = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.frequency {
        args.frequency = v.into();
    }

    build_params(args).map_err(|e| {
        warn!("rejected projection request: {e}");
        e.to_string()
    })
}

fn build_project_response(params: ProjectionParams, years: Vec<YearRecord>) -> ProjectResponse {
    ProjectResponse {
        summary: summarize(&params, &years),
        params,
        years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        let cli = Cli::try_parse_from(["compound", "project"]).expect("parse");
        match cli.command {
            Command::Project { params, format } => {
                assert_eq!(params, ParamArgs::default());
                assert_eq!(format, OutputFormat::Table);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_projection_flags() {
        let cli = Cli::try_parse_from([
            "compound",
            "project",
            "--initial-deposit",
            "1000",
            "--contribution",
            "250",
            "--contribution-growth",
            "2.5",
            "--contribution-years",
            "5",
            "--total-years",
            "10",
            "--annual-return",
            "6",
            "--frequency",
            "monthly",
            "--format",
            "csv",
        ])
        .expect("parse");
        let Command::Project { params, format } = cli.command else {
            panic!("expected project command");
        };
        assert_eq!(format, OutputFormat::Csv);

        let params = build_params(params).expect("valid params");
        assert_approx(params.initial_deposit, 1_000.0);
        assert_approx(params.annual_contribution_base(), 3_000.0);
        assert_approx(params.contribution_growth_pct, 2.5);
        assert_eq!(params.contribution_years, 5);
        assert_eq!(params.total_years, 10);
        assert_eq!(params.frequency, ContributionFrequency::Monthly);
    }

    #[test]
    fn cli_parses_solve_and_serve() {
        let cli = Cli::try_parse_from([
            "compound",
            "solve",
            "--goal",
            "required-contribution",
            "--target-balance",
            "5000000",
        ])
        .expect("parse");
        let Command::Solve { goal, .. } = cli.command else {
            panic!("expected solve command");
        };
        let config = goal_config(&goal);
        assert_eq!(config.goal_type, GoalType::RequiredContribution);
        assert_approx(config.target_final_balance, 5_000_000.0);

        let cli = Cli::try_parse_from(["compound", "serve"]).expect("parse");
        assert!(matches!(cli.command, Command::Serve { port: 8080 }));
    }

    #[test]
    fn build_params_rejects_contribution_years_beyond_horizon() {
        let args = ParamArgs {
            contribution_years: 50,
            ..ParamArgs::default()
        };
        let err = build_params(args).expect_err("must reject");
        assert!(err.to_string().contains("contribution_years"));
    }

    #[test]
    fn params_from_json_parses_web_keys() {
        let json = r#"{
          "initialDeposit": 1000,
          "contribution": 100,
          "contributionGrowth": 3,
          "contributionYears": 4,
          "totalYears": 12,
          "annualReturn": 5.5,
          "frequency": "monthly"
        }"#;
        let params = params_from_json(json).expect("json should parse");

        assert_approx(params.initial_deposit, 1_000.0);
        assert_approx(params.contribution_amount, 100.0);
        assert_approx(params.contribution_growth_pct, 3.0);
        assert_eq!(params.contribution_years, 4);
        assert_eq!(params.total_years, 12);
        assert_approx(params.annual_return_pct, 5.5);
        assert_eq!(params.frequency, ContributionFrequency::Monthly);
    }

    #[test]
    fn params_from_json_falls_back_to_defaults() {
        let params = params_from_json("{}").expect("json should parse");
        assert_approx(params.initial_deposit, 600_000.0);
        assert_approx(params.contribution_amount, 65_000.0);
        assert_eq!(params.contribution_years, 15);
        assert_eq!(params.total_years, 40);
        assert_approx(params.annual_return_pct, 7.0);
        assert_eq!(params.frequency, ContributionFrequency::Annual);
    }

    #[test]
    fn params_from_json_rejects_negative_deposit() {
        let err = params_from_json(r#"{"initialDeposit": -5}"#).expect_err("must reject");
        assert!(err.contains("initial_deposit"));
    }

    #[test]
    fn params_from_json_rejects_unknown_frequency() {
        let err = params_from_json(r#"{"frequency": "weekly"}"#).expect_err("must reject");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let params = params_from_json(r#"{"totalYears": 3, "contributionYears": 2}"#)
            .expect("valid params");
        let years = project(&params);
        let response = build_project_response(params, years);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"params\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"years\""));
        assert!(json.contains("\"openingBalance\""));
        assert!(json.contains("\"interestEarnedThisYear\""));
        assert!(json.contains("\"cumulativeContributions\""));
        assert!(json.contains("\"cumulativeInterest\""));
        assert!(json.contains("\"closingBalance\""));
        assert!(json.contains("\"finalBalance\""));
        assert!(json.contains("\"frequency\":\"annual\""));
    }

    #[test]
    fn write_projection_renders_each_format() {
        let params = build_params(ParamArgs {
            total_years: 2,
            contribution_years: 1,
            ..ParamArgs::default()
        })
        .expect("valid params");

        let mut table = Vec::new();
        write_projection(&mut table, &params, OutputFormat::Table).expect("table");
        let table = String::from_utf8(table).expect("utf8");
        assert!(table.contains("Summary after 2 years"));
        assert!(table.contains("$711,550.00"));

        let mut csv = Vec::new();
        write_projection(&mut csv, &params, OutputFormat::Csv).expect("csv");
        assert_eq!(String::from_utf8(csv).expect("utf8").lines().count(), 3);

        let mut json = Vec::new();
        write_projection(&mut json, &params, OutputFormat::Json).expect("json");
        let value: serde_json::Value = serde_json::from_slice(&json).expect("valid json");
        assert_eq!(value["years"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn goal_result_rendering_names_solved_value() {
        let params = build_params(ParamArgs {
            initial_deposit: 0.0,
            contribution: 0.0,
            contribution_years: 10,
            total_years: 10,
            annual_return: 0.0,
            ..ParamArgs::default()
        })
        .expect("valid params");
        let goal = GoalArgs {
            goal: CliGoalType::RequiredContribution,
            target_balance: 10_000.0,
            search_min: 0.0,
            search_max: 5_000.0,
            tolerance: 0.001,
            max_iterations: 64,
        };
        let result = solve_goal(&params, goal_config(&goal)).expect("solve");
        let text = render_goal_result(&result);

        assert!(text.contains("Solved required contribution."));
        assert!(text.contains("Contribution: $1,000.00"));
        assert!(text.contains("Target final balance: $10,000.00"));
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn undecodable_query_returns_json_error() {
        let uri: axum::http::Uri = "/api/project?totalYears=-5".parse().expect("uri");
        let rejection = Query::<ProjectPayload>::try_from_uri(&uri).expect_err("must reject");
        let response = project_get_handler(Err(rejection)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        let body = response_json(response).await;
        let error = body["error"].as_str().expect("error message");
        assert!(error.starts_with("Invalid request parameters"));
    }

    #[tokio::test]
    async fn undecodable_csv_query_returns_json_error() {
        let uri: axum::http::Uri = "/api/project.csv?contributionYears=2.5".parse().expect("uri");
        let rejection = Query::<ProjectPayload>::try_from_uri(&uri).expect_err("must reject");
        let response = project_csv_get_handler(Err(rejection)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn undecodable_json_body_returns_json_error() {
        let rejection = Json::<ProjectPayload>::from_bytes(br#"{"contributionYears": 2.5}"#)
            .expect_err("must reject");
        let response = project_post_handler(Err(rejection)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        let body = response_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn decodable_query_still_projects() {
        let uri: axum::http::Uri = "/api/project?totalYears=3&contributionYears=1"
            .parse()
            .expect("uri");
        let query = Query::<ProjectPayload>::try_from_uri(&uri).expect("decodes");
        let response = project_get_handler(Ok(query)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["years"].as_array().map(Vec::len), Some(3));
    }
}
