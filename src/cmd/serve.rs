use anyhow::{Context, Result};
use clap::Args;
use log::info;
use rolegate::config::ConfigArgs;
use rolegate::server::config::ServerConfig;

use super::display_json;

/// Start the HTTP server with the request gate in front of every route.
#[derive(Args)]
pub struct ServeArgs {
    /// Print server configuration data (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ServeArgs {
    pub async fn run(&self) -> Result<()> {
        let cfg: ServerConfig = self.config.load("server")?;

        if self.print_config {
            return display_json(&cfg);
        }

        cfg.logs.init()?;

        let ctx = cfg.build_ctx()?;
        let gate = cfg.build_gate()?;
        info!(
            "Gate ready with {} rules, unauthorized page '{}'",
            gate.rules().len(),
            cfg.gate.unauthorized_path
        );

        let srv = cfg.build_restful_server(ctx, gate)?;
        srv.run().await.context("run restful server")
    }
}
