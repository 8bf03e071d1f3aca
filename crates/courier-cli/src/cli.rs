//! CLI argument definitions for the `courier` client.

use clap::Parser;

/// Command-line interface for issuing one request to a Courier server.
#[derive(Parser, Debug)]
#[command(name = "courier", about = "Invoke a method on a Courier server")]
pub(crate) struct Cli {
    /// Seconds to wait for the connection and for the response.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) timeout: u64,
    /// Prints the full response envelope instead of the bare value.
    #[arg(long)]
    pub(crate) raw: bool,
    /// Name of the method to invoke.
    #[arg(value_name = "METHOD")]
    pub(crate) method: String,
    /// Arguments written as `type:value`, for example `int:42` or
    /// `string:hello`.
    #[arg(
        value_name = "TYPE:VALUE",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub(crate) arguments: Vec<String>,
}
