use color_eyre::{Report, Result};

use ibot::cli::output::error_report;
use ibot::cli::{parse_args, run_cli_command, USAGE};
use ibot::config::ClientConfig;
use ibot::logging::init_logging;

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error_report(&Report::from(e)));
            std::process::exit(1);
        }
    };
    tracing::debug!(base_url = %config.base_url, top_k = config.top_k, "configuration loaded");

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(e) = runtime.block_on(run_cli_command(command, &config)) {
        eprintln!("{}", error_report(&e));
        std::process::exit(1);
    }
    Ok(())
}
