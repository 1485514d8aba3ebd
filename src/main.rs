use std::process::ExitCode;

use github_mda::config::MdaConfig;
use github_mda::error::MdaError;
use github_mda::logging;
use github_mda::pipeline::Pipeline;

fn main() -> ExitCode {
    let config = match MdaConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let e = MdaError::from(e);
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    // Dropping the guard at the end of main flushes the log file.
    let _log_guard = match logging::init(&config.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to open log {}: {e:#}", config.log_file.display());
            return ExitCode::from(74);
        }
    };

    let pipeline = Pipeline::from_config(&config);
    if let Err(e) = pipeline.bootstrap() {
        tracing::error!(error = %e, "Failed to create holding directories");
        return ExitCode::from(e.exit_code());
    }

    match pipeline.run(std::io::stdin().lock()) {
        Ok(delivery) => {
            tracing::debug!(filename = %delivery.filename, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Delivery failed");
            ExitCode::from(e.exit_code())
        }
    }
}
