type Result<T> = color_eyre::eyre::Result<T>;

mod sample;

use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize error handling and logging
    color_eyre::install()?;

    // Verdict lines own stdout, so logs go to stderr. An isolated child's
    // stderr is the test's output sink and stays free of runner logs.
    if !testfw::child::is_isolated_child() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    debug!("testfw starting");

    let symbols = sample::symbols();
    let code = testfw::cli::main(&symbols).await?;

    debug!("testfw exiting with status {}", code);
    Ok(ExitCode::from(code))
}
