mod cmd;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    let Err(err) = cmd::App::parse().run().await else {
        return ExitCode::SUCCESS;
    };
    // The logger may not be installed yet.
    error!("rolegate exited: {err:#}");
    _ = writeln!(io::stderr(), "rolegate: {err:#}");
    ExitCode::FAILURE
}
