use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

mod check;
mod serve;

/// Role based request gate for web applications.
#[derive(Parser)]
#[command(author, version, about)]
pub struct App {
    #[command(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(serve::ServeArgs),
    Check(check::CheckArgs),
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.commands {
            Commands::Serve(args) => args.run().await,
            Commands::Check(args) => args.run().await,
        }
    }
}

/// Prints a value as indented JSON on stdout.
pub fn display_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("encode json output")?;
    println!("{json}");
    Ok(())
}
