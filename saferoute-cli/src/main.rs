//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use saferoute_cli::CliError;

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr"
)]
fn main() {
    pretty_env_logger::init();
    match saferoute_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("saferoute: {err}");
            std::process::exit(1);
        }
    }
}
