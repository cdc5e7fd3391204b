//! Stdin/stdout adapter for the cloud-function handler: reads one gateway
//! event as JSON from stdin, writes the response as JSON to stdout.

use platen_function::{FunctionEvent, handle};
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let mut input = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("failed to read event from stdin: {err}");
        return ExitCode::FAILURE;
    }
    let event: FunctionEvent = match serde_json::from_str(&input) {
        Ok(event) => event,
        Err(err) => {
            eprintln!("malformed event: {err}");
            return ExitCode::FAILURE;
        }
    };

    let response = handle(event).await;
    match serde_json::to_string(&response) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to serialize response: {err}");
            ExitCode::FAILURE
        }
    }
}
