//! CLI entrypoint for invoking methods on a Courier server.
//!
//! The binary delegates to [`courier_cli::run`], which loads configuration,
//! parses the method and its typed arguments, and prints the server's answer.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    courier_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
