// Pythagorean exponent fit entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Load game logs
// 4. Run the pipeline (ingest, aggregate, fit, predict, one-run breakdown)
// 5. Export tables and print the headline numbers

use std::path::Path;

use anyhow::{bail, Context};
use pythag::pipeline::FitStatus;
use pythag::{config, export, game_logs, pipeline};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("pythag starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} game log file(s), team {}, max game {}",
        config.data.game_logs.len(),
        config.analysis.team,
        config.fit.max_game_number
    );

    let base_dir = std::env::current_dir()?;
    let entries = game_logs::load_all(&base_dir, &config.data.game_logs)
        .context("failed to load game logs")?;

    let report = pipeline::run(&entries, &config);

    let out_dir = base_dir.join(&config.output.dir);
    export::write_report(&out_dir, &report).context("failed to export results")?;

    println!(
        "games: {} accepted, {} rejected, {} filtered; {} team-seasons",
        report.ingest.accepted,
        report.ingest.rejected,
        report.ingest.filtered,
        report.summaries.len()
    );

    for row in &report.one_run {
        println!("{} {} one-run record: {}", row.team, row.season, row.record);
    }

    match &report.fit {
        FitStatus::Fitted { model, predictions } => {
            println!(
                "fitted exponent k = {:.3} over {} team-seasons (R^2 {:.3})",
                model.exponent, model.diagnostics.rows_used, model.diagnostics.r_squared
            );
            println!(
                "mean absolute error: {:.2} wins (k = 2: {:.2})",
                model.mean_abs_error, model.diagnostics.classic_mean_abs_error
            );
            for p in report.team_predictions() {
                println!(
                    "{} {}: estimated {} ({:.3}), actual {}, residual {:+}",
                    p.team, p.season, p.estimated_wins, p.estimated_win_pct, p.actual_wins, p.residual
                );
            }
            if !predictions.failures.is_empty() {
                println!("{} team-season(s) could not be predicted", predictions.failures.len());
            }
        }
        FitStatus::Failed { reason } => {
            println!("fit failed: {reason}");
            bail!("exponent fit failed: {reason}");
        }
    }

    info!("results written to {}", out_dir.display());
    Ok(())
}

/// Initialize tracing to log to `logs/pythag.log`; stdout carries the results.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = Path::new("logs");
    std::fs::create_dir_all(log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pythag.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pythag=info,pythag_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
