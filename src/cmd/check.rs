use anyhow::Result;
use clap::Args;
use rolegate::config::ConfigArgs;
use rolegate::gate::GateDecision;
use rolegate::roles::Role;
use rolegate::server::config::ServerConfig;
use rolegate::session::Session;
use serde::Serialize;

use super::display_json;

/// Show what the gate decides for a path, without starting the server.
#[derive(Args)]
pub struct CheckArgs {
    /// The request path, may carry a query string.
    pub path: String,

    /// Role of the caller, anonymous if omitted.
    #[arg(short, long)]
    pub role: Option<Role>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Serialize)]
struct CheckResult {
    path: String,
    role: Option<Role>,
    decision: String,
    location: Option<String>,
}

impl CheckArgs {
    pub async fn run(&self) -> Result<()> {
        let cfg: ServerConfig = self.config.load("server")?;
        let gate = cfg.build_gate()?;

        let (path, query) = self.path.split_once('?').unwrap_or((self.path.as_str(), ""));
        let session = self.role.map(|role| Session {
            user_id: String::from("check"),
            email: String::from("check@localhost"),
            role,
        });

        let decision = gate.evaluate(path, query, session.as_ref());
        let location = gate.location(&decision);
        let decision = match decision {
            GateDecision::Continue => "continue",
            GateDecision::RedirectToSignIn { .. } => "redirect_to_sign_in",
            GateDecision::RedirectToUnauthorized { .. } => "redirect_to_unauthorized",
            GateDecision::RedirectToHome { .. } => "redirect_to_home",
        };

        display_json(&CheckResult {
            path: self.path.clone(),
            role: self.role,
            decision: decision.to_string(),
            location,
        })
    }
}
