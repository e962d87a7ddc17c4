mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

use crate::input::{InputError, load_input};
use crate::model::policy::{PolicyError, WeightPolicy};
use crate::pipeline::PipelineError;
use crate::pipeline::stage1_profiles::run_stage1;
use crate::pipeline::stage2_weights::run_stage2;
use crate::pipeline::stage3_aggregate::run_stage3;
use crate::pipeline::stage4_rank::run_stage4;
use crate::report::json::{RunSummary, write_summary_json};
use crate::report::{build_rater_table, build_result_rows};

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Bias-corrected score aggregation and ranking for multi-rater bicker evaluations"
)]
struct Cli {
    /// Score records CSV (rater_id,candidate_id,score,candidate_group).
    #[arg(long)]
    scores: PathBuf,

    /// Rater roster CSV (rater_id,display_name).
    #[arg(long)]
    raters: PathBuf,

    /// Candidate roster CSV (candidate_id,display_name,candidate_group).
    #[arg(long)]
    candidates: PathBuf,

    /// Output directory for results.csv, rater_weights.csv, summary.json.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Credibility-weighting policy.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Fixed)]
    policy: PolicyChoice,

    /// JSON file overriding the built-in cutoff table; its "mode" tag wins
    /// over --policy.
    #[arg(long)]
    policy_file: Option<PathBuf>,

    /// Pool all candidate groups into one baseline instead of partitioning
    /// the deviation computation per group.
    #[arg(long)]
    no_group_split: bool,

    /// Seed for the extremal-rater tie-break; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    /// Deviation cutoffs calibrated offline (2023 table).
    Fixed,
    /// Cutoffs realized from this run's deviation percentiles.
    Percentile,
    /// Every rater weighted 1.0.
    Uniform,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("invalid weighting policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("cannot read policy file {path}: {message}")]
    PolicyFile { path: String, message: String },
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let policy = resolve_policy(cli)?;
    policy.validate()?;
    let group_split = !cli.no_group_split;
    info!(
        "policy: {policy:?}, group partitioning: {}",
        if group_split { "on" } else { "off" }
    );

    let bundle = load_input(&cli.scores, &cli.raters, &cli.candidates)?;

    let stage1 = run_stage1(&bundle.records, group_split);
    let weights = run_stage2(&stage1, &policy);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let aggregates = run_stage3(&bundle.records, &weights, &bundle.candidates, &mut rng)?;
    let ranked = run_stage4(&aggregates, &bundle.candidates)?;

    let result_rows = build_result_rows(&ranked, &bundle.candidates, &bundle.raters);
    let rater_table = build_rater_table(&bundle.records, &weights);

    std::fs::create_dir_all(&cli.out)?;
    let results_path = cli.out.join("results.csv");
    let weights_path = cli.out.join("rater_weights.csv");
    let summary_path = cli.out.join("summary.json");

    report::csv::write_results_csv(&results_path, &result_rows)?;
    report::csv::write_rater_weights_csv(&weights_path, &rater_table)?;
    write_summary_json(
        &summary_path,
        &RunSummary {
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            policy,
            group_split,
            seed: cli.seed,
            n_raw_score_rows: bundle.n_raw_rows,
            n_score_records: bundle.records.len(),
            n_raters: bundle.raters.len(),
            n_candidates: bundle.candidates.len(),
            n_ranked: ranked.len(),
            outputs: vec![
                results_path.display().to_string(),
                weights_path.display().to_string(),
            ],
        },
    )?;

    info!("results written to {}", results_path.display());
    info!("rater weights written to {}", weights_path.display());
    Ok(())
}

fn resolve_policy(cli: &Cli) -> Result<WeightPolicy, RunError> {
    if let Some(path) = &cli.policy_file {
        let body = std::fs::read_to_string(path).map_err(|e| RunError::PolicyFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        return serde_json::from_str(&body).map_err(|e| RunError::PolicyFile {
            path: path.display().to_string(),
            message: e.to_string(),
        });
    }
    Ok(match cli.policy {
        PolicyChoice::Fixed => WeightPolicy::fixed_v1(),
        PolicyChoice::Percentile => WeightPolicy::percentile_v1(),
        PolicyChoice::Uniform => WeightPolicy::Uniform,
    })
}
