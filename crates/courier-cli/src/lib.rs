//! Command-line client for Courier servers.
//!
//! The runtime splits leading configuration flags from the request, resolves
//! the server endpoint through `courier-config`, sends one request built from
//! `type:value` arguments, and prints the outcome. Successful values go to
//! stdout as JSON; failure markers go to stderr with a distinct exit status.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use courier_config::Config;
use courier_wire::{Client, Request, Response};

mod argument;
mod cli;
mod config;
mod errors;

use argument::parse_argument;
use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

/// Exit status used when the server answered with a failure marker.
pub const REMOTE_FAILURE_EXIT: u8 = 2;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = invoke(&args, loader)
        .and_then(|(cli, response)| render(&cli, &response, stdout, stderr));
    match result {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "courier: {error}");
            ExitCode::FAILURE
        }
    }
}

fn invoke(args: &[OsString], loader: &dyn ConfigLoader) -> Result<(Cli, Response), AppError> {
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    let request = build_request(&cli)?;
    let response = call(&config, &request, Duration::from_secs(cli.timeout))?;
    Ok((cli, response))
}

fn build_request(cli: &Cli) -> Result<Request, AppError> {
    cli.arguments
        .iter()
        .try_fold(Request::new(cli.method.as_str()), |request, argument| {
            let (value_type, value) = parse_argument(argument)?;
            Ok(request.arg(value_type, value))
        })
}

fn call(config: &Config, request: &Request, timeout: Duration) -> Result<Response, AppError> {
    let endpoint = config.listen_endpoint();
    let mut client = Client::connect_with_timeout((endpoint.host(), endpoint.port()), timeout)
        .map_err(|source| AppError::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
    client.call(request).map_err(AppError::Call)
}

fn render<W: Write, E: Write>(
    cli: &Cli,
    response: &Response,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError> {
    if cli.raw {
        let line = serde_json::to_string(response).map_err(AppError::SerialiseResponse)?;
        writeln!(stdout, "{line}").map_err(AppError::WriteOutput)?;
        return Ok(exit_code_for(response));
    }
    match response {
        Response::Success { value } => {
            let line = serde_json::to_string(value).map_err(AppError::SerialiseResponse)?;
            writeln!(stdout, "{line}").map_err(AppError::WriteOutput)?;
        }
        Response::Failure { failure } => {
            writeln!(stderr, "courier: {}: {failure}", cli.method)
                .map_err(AppError::WriteOutput)?;
        }
    }
    Ok(exit_code_for(response))
}

fn exit_code_for(response: &Response) -> ExitCode {
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(REMOTE_FAILURE_EXIT)
    }
}
