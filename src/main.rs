//! Binary entry point: reads the header and offline hints from stdin,
//! then drives the dispatcher one step at a time until the workload
//! (including its `STALE_WINDOW`-long drain tail) is exhausted.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tagfleet::config::Config;
use tagfleet::dispatcher::Dispatcher;
use tagfleet::protocol::{self, ProtocolError};
use tagfleet::EngineError;

fn run() -> Result<(), EngineError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let (header, hints) = protocol::read_header(&mut input)?;
    protocol::write_ack(&mut output)?;
    tracing::info!(t = header.t, m = header.m, n = header.n, v = header.v, "header parsed");

    let config = Config::from_header(header);
    let mut dispatcher = Dispatcher::new(config, &hints)?;

    for step in 1..=dispatcher.total_steps() {
        let step_input = protocol::read_step_input(&mut input, step)?;
        protocol::write_timestamp_ack(&mut output, step)?;
        let step_output = dispatcher.step(step_input)?;
        protocol::write_step_output(&mut output, &step_output)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(EngineError::Protocol(ProtocolError::Desync { expected, got })) => {
            tracing::error!(expected, got, "protocol desync, aborting");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!(error = %err, "engine error, aborting");
            let _ = writeln!(io::stderr(), "tagfleet: {err}");
            ExitCode::FAILURE
        }
    }
}
