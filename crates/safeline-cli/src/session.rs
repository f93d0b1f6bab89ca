//! Interactive session wiring.

use std::io::Write;

use safeline_app::{LocationProvider, MessagingTransport, Runtime};
use safeline_store::Storage;
use tracing::info;

use crate::{CliError, FixedLocation, LogTransport, SessionArgs, SystemEnv, TerminalDriver};

/// Run an interactive session on stdin and stdout until `quit` or end of
/// input.
///
/// # Errors
///
/// Returns an error if the terminal fails or the coordinates are invalid.
pub async fn run_session(storage: impl Storage, args: &SessionArgs) -> Result<(), CliError> {
    let location = FixedLocation::new(args.location.coordinates()?);
    let transport = if args.offline { LogTransport::offline() } else { LogTransport::new() };
    let driver = TerminalDriver::new(transport, location, std::io::stdout());

    info!(offline = args.offline, "starting session");
    run_with_driver(driver, storage, args).await
}

/// Run a session on an already-built driver.
///
/// # Errors
///
/// Returns an error if the driver fails or a session flag is out of range.
pub async fn run_with_driver<T, L, W>(
    driver: TerminalDriver<T, L, W>,
    storage: impl Storage,
    args: &SessionArgs,
) -> Result<(), CliError>
where
    T: MessagingTransport,
    L: LocationProvider,
    W: Write + Send,
{
    let config = args.session_config()?;
    Runtime::new(driver, SystemEnv::new(), storage, config).run().await
}
