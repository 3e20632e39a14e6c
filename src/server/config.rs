use std::sync::Arc;

use anyhow::{bail, Context, Result};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use serde::{Deserialize, Serialize};

use crate::authz::config::AuthzConfig;
use crate::config::{expandenv, CommonConfig, PathSet};
use crate::gate::config::GateConfig;
use crate::gate::Gate;
use crate::logs::LogsConfig;
use crate::session::config::SessionConfig;
use crate::session::factory::SessionFactory;

use super::context::ServerContext;
use super::restful::RestfulServer;

/// `server.toml`: listener settings plus every section the gate is built from.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,

    /// 0 keeps the actix default.
    pub keep_alive_secs: u64,

    /// 0 starts one worker per physical CPU.
    pub workers: u64,

    pub tls: TlsConfig,
    pub logs: LogsConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
    pub authz: AuthzConfig,
}

/// HTTPS listener. Off by default, the gate is usually deployed behind a proxy
/// that terminates TLS.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub enable: bool,

    /// PEM certificate chain. Default: {config_path}/server.crt
    pub cert_path: String,

    /// PEM private key. Default: {config_path}/server.key
    pub key_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:7881"),
            keep_alive_secs: 0,
            workers: 0,
            tls: TlsConfig::default(),
            logs: LogsConfig::default(),
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            authz: AuthzConfig::default(),
        }
    }
}

impl CommonConfig for ServerConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind address is empty");
        }

        self.tls.complete(ps).context("tls")?;
        self.logs.complete(ps).context("logs")?;
        self.session.complete(ps).context("session")?;
        self.gate.complete(ps).context("gate")?;
        self.authz.complete(ps).context("authz")?;

        let rules = self.authz.build_rules().context("authz")?;
        self.gate.check_rules(&rules).context("gate")?;
        Ok(())
    }
}

impl CommonConfig for TlsConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if !self.enable {
            return Ok(());
        }
        self.cert_path = pem_path(ps, "cert_path", &self.cert_path, "server.crt")?;
        self.key_path = pem_path(ps, "key_path", &self.key_path, "server.key")?;
        Ok(())
    }
}

fn pem_path(ps: &PathSet, name: &str, value: &str, default_file: &str) -> Result<String> {
    let path = expandenv(name, value)?;
    if path.is_empty() {
        return Ok(ps.config_path.join(default_file).display().to_string());
    }
    Ok(path)
}

impl TlsConfig {
    fn build_acceptor(&self) -> Result<Option<SslAcceptorBuilder>> {
        if !self.enable {
            return Ok(None);
        }

        let mut acceptor =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("create tls acceptor")?;
        acceptor
            .set_private_key_file(&self.key_path, SslFiletype::PEM)
            .with_context(|| format!("load tls key '{}'", self.key_path))?;
        acceptor
            .set_certificate_chain_file(&self.cert_path)
            .with_context(|| format!("load tls certificate '{}'", self.cert_path))?;
        Ok(Some(acceptor))
    }
}

impl ServerConfig {
    pub fn build_ctx(&self) -> Result<Arc<ServerContext>> {
        let ctx = ServerContext::new(self.authz.permissions.clone());
        Ok(Arc::new(ctx))
    }

    pub fn build_gate(&self) -> Result<Arc<Gate>> {
        let rules = self.authz.build_rules().context("build path rules")?;
        let sessions = SessionFactory::new(&self.session);
        let resolver = sessions
            .build_resolver()
            .context("build session resolver")?;
        let gate = Gate::new(
            self.gate.clone(),
            rules,
            sessions.build_extractor(),
            resolver,
        );
        Ok(Arc::new(gate))
    }

    pub fn build_restful_server(
        &self,
        ctx: Arc<ServerContext>,
        gate: Arc<Gate>,
    ) -> Result<RestfulServer> {
        let tls = self.tls.build_acceptor()?;

        let mut srv = RestfulServer::new(self.bind.clone(), tls, ctx, gate);
        if self.keep_alive_secs > 0 {
            srv = srv.with_keep_alive(self.keep_alive_secs);
        }
        if self.workers > 0 {
            srv = srv.with_workers(self.workers);
        }
        Ok(srv)
    }
}
