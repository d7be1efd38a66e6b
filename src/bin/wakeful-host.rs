//! Native messaging host for Wakeful
//!
//! Runs as a standalone process launched by the editor extension and talks to
//! it over stdin/stdout using length-prefixed JSON frames.

use log::{error, info};
use std::io;
use std::process::ExitCode;
use std::time::Instant;
use wakeful_lib::{
    logging,
    native_host::{write_message, NativeHost, OutgoingMessage, Outbox},
    platform, JsonFileSettings, WakefulError,
};

fn main() -> ExitCode {
    if logging::init(false).is_err() {
        return ExitCode::FAILURE;
    }

    let settings = match JsonFileSettings::default_location() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Initialization error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("settings at {}", settings.path().display());

    let outbox = Outbox::default();
    let mut stdout = io::stdout().lock();

    let host = match NativeHost::start(
        platform::native_provider(),
        Box::new(settings),
        &outbox,
        Instant::now(),
    ) {
        Ok(host) => host,
        Err(e) => {
            error!("Failed to start: {e}");
            let mut messages = outbox.drain();
            if !matches!(e, WakefulError::Unsupported) {
                messages.push(OutgoingMessage::Error { message: e.into() });
            }
            for message in &messages {
                if write_message(&mut stdout, message).is_err() {
                    break;
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Runs until the editor closes the connection.
    if let Err(e) = host.run(io::stdin(), &mut stdout) {
        error!("Native host error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
