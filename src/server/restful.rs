use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::from_fn;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use crate::gate::middleware::gate_requests;
use crate::gate::Gate;

use super::context::ServerContext;
use super::handlers::{api, healthz, pages};

/// The HTTP server. Every request passes [`gate_requests`] before it reaches a handler.
pub struct RestfulServer {
    bind: String,
    ssl: Option<SslAcceptorBuilder>,

    ctx: Arc<ServerContext>,
    gate: Arc<Gate>,

    keep_alive: Option<Duration>,
    workers: Option<usize>,
}

impl RestfulServer {
    pub fn new(
        bind: String,
        ssl: Option<SslAcceptorBuilder>,
        ctx: Arc<ServerContext>,
        gate: Arc<Gate>,
    ) -> Self {
        Self {
            bind,
            ssl,
            ctx,
            gate,
            keep_alive: None,
            workers: None,
        }
    }

    pub fn with_keep_alive(mut self, secs: u64) -> Self {
        self.keep_alive = Some(Duration::from_secs(secs));
        self
    }

    pub fn with_workers(mut self, workers: u64) -> Self {
        self.workers = Some(workers as usize);
        self
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            bind,
            ssl,
            ctx,
            gate,
            keep_alive,
            workers,
        } = self;

        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(Data::new(ctx.clone()))
                .app_data(Data::from(gate.clone()))
                .wrap(from_fn(gate_requests))
                .configure(Self::configure)
        });
        if let Some(keep_alive) = keep_alive {
            srv = srv.keep_alive(keep_alive);
        }
        if let Some(workers) = workers {
            srv = srv.workers(workers);
        }

        srv = match ssl {
            Some(ssl) => {
                info!("Listening on https://{bind}");
                srv.bind_openssl(&bind, ssl)
                    .with_context(|| format!("bind https on '{bind}'"))?
            }
            None => {
                warn!("TLS is disabled, session tokens travel in clear text");
                info!("Listening on http://{bind}");
                srv.bind(&bind)
                    .with_context(|| format!("bind http on '{bind}'"))?
            }
        };

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd ready")?;
        srv.run().await.context("serve http")?;

        info!("Server stopped");
        Ok(())
    }

    /// Registers the routes. The app must also carry the [`ServerContext`] and the
    /// [`Gate`] as app data, and be wrapped by [`gate_requests`].
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/healthz", web::get().to(healthz::get_healthz))
            .service(
                web::scope("/api")
                    .route("/whoami", web::get().to(api::get_whoami))
                    .route("/cani/{permission}", web::get().to(api::get_cani)),
            )
            .service(web::resource("/{path:.*}").route(web::route().to(pages::default_handler)));
    }
}
