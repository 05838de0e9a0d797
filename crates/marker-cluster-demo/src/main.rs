mod cli;
mod logging;
mod run;

use cli::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::from_cli();
    logging::setup_logging();

    match run::run(&settings) {
        Ok(summaries) => {
            println!(
                "{:>4}  {:>8}  {:>8}  {:>8}",
                "zoom", "markers", "clusters", "largest"
            );
            for summary in summaries {
                println!(
                    "{:>4}  {:>8}  {:>8}  {:>8}",
                    summary.zoom, summary.outputs, summary.rendered_clusters, summary.largest
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
