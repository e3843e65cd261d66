mod cli;
mod progress;

use anyhow::Context;
use clap::Parser;
use contacts_engine::{run_harvest, LogProgressSink};
use engine_logging::{engine_error, engine_info};

use crate::cli::Cli;
use crate::progress::SpinnerProgressSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.verbose);

    let request = cli.harvest_request();
    let result = if cli.no_progress {
        run_harvest(&request, &LogProgressSink).await
    } else {
        let sink = SpinnerProgressSink::new(&format!("target {}", request.index));
        let result = run_harvest(&request, &sink).await;
        sink.finish(result.is_ok());
        result
    };
    let summary = result
        .inspect_err(|err| engine_error!("{}", err))
        .with_context(|| {
            format!(
                "harvesting target {} from {} failed",
                request.index,
                request.config_path.display()
            )
        })?;

    engine_info!(
        "{}: {} records from {} pages saved to {} ({:?})",
        summary.target,
        summary.records_written,
        summary.progress.pages_fetched,
        summary.output_path.display(),
        summary.stop
    );
    Ok(())
}
