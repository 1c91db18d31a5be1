use anyhow::Result;
use clap::Parser;
use tracing::info;

use modelarena::{
    aggregate::RunAggregates,
    config::ArenaConfig,
    gateway::Gateway,
    questions, run,
    run::RunSummary,
    storage::Storage,
};

#[derive(Parser)]
#[command(
    name = "modelarena",
    about = "Blind pairwise evaluation of two language models",
    version
)]
struct Args {
    /// Path to config.toml (optional — every setting has a default)
    #[arg(long, env = "MODELARENA_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Data directory for the SQLite run database
    #[arg(long, env = "MODELARENA_DATA_DIR", default_value = ".")]
    data_dir: std::path::PathBuf,

    /// JSON questions file (overrides config)
    #[arg(long, env = "MODELARENA_QUESTIONS")]
    questions: Option<std::path::PathBuf>,

    /// Number of questions to evaluate (overrides config)
    #[arg(long)]
    count: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MODELARENA_LOG", default_value = "info")]
    log: String,

    /// Emit structured JSON logs instead of the compact human format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log, args.json_logs);

    let mut config = ArenaConfig::load(args.config.as_deref())?;
    if let Some(path) = args.questions {
        config.run.questions_file = path;
    }
    if let Some(count) = args.count {
        config.run.question_count = count;
    }

    let storage = Storage::new(
        &args.data_dir,
        &config.openai.display_name,
        &config.anthropic.display_name,
    )
    .await?;
    let gateway = Gateway::new(&config)?;

    let questions =
        questions::load_questions(&config.run.questions_file, config.run.question_count).await?;
    info!(
        questions = questions.len(),
        model_one = %config.openai.display_name,
        model_two = %config.anthropic.display_name,
        "starting evaluation run"
    );

    let mut aggregates = RunAggregates::new();
    let summary = run::run(&gateway, &storage, &questions, &mut aggregates).await?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "Run complete: {} questions, {} comparisons",
        summary.questions, summary.comparisons
    );
    for model in &summary.models {
        let average = model
            .average_score
            .map(|avg| format!("{avg:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {}: average score {average} ({} judged, {} failed)",
            model.model, model.judged, model.failed
        );
    }
}

/// Initialize the tracing subscriber.  `--json-logs` switches to structured
/// JSON output for log aggregators; the default is the compact human format.
fn setup_logging(log_level: &str, json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}
