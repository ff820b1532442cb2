//! # Forwarder Hub Server
//!
//! Package forwarding backend built on `Axum`, `SurrealDB`, and a type-safe event bus.
//!
//! ## Example
//! ```no_run
//! use fhub_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut cfg = fhub::domain::config::ApiConfig::default();
//!     cfg.security.session.secret = "change-me".to_owned();
//!
//!     Server::builder()
//!         .config(cfg)
//!         .port(8080)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum_server::Handle;
use fhub::domain::config::ApiConfig;
use fhub::kernel::server::ApiState;
use fhub_database::{DatabaseBuilder, Repositories};
use fhub_event_bus::EventBus;
use fhub_notifications::Mailer;
use fhub_storage::Storage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
    repositories: Option<Repositories>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Use these repositories instead of connecting to the configured database.
    pub fn repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    /// Use this mailer instead of the one derived from the `mail` section.
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    async fn init_repositories(&mut self) -> Result<Repositories> {
        if let Some(repositories) = self.repositories.take() {
            info!("Using injected repositories");
            return Ok(repositories);
        }

        let db = DatabaseBuilder::from_config(&self.cfg.database)
            .init()
            .await
            .context("Failed to establish database connection")?;
        Ok(Repositories::surreal(&db))
    }

    async fn init_storage(&self) -> Result<Storage> {
        let storage = Storage::builder(&self.cfg.uploads.dir)
            .connect()
            .await
            .context("Failed to prepare the upload directory")?;

        let purged = storage.purge_tmp().await;
        if purged > 0 {
            info!(purged, "Removed stale temporary uploads");
        }
        Ok(storage)
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    fn validate_security(&self) -> Result<()> {
        let security = &self.cfg.security;
        if !security.session.has_secret() {
            anyhow::bail!("Session secret is not set; configure FHUB__SECURITY__SESSION__SECRET");
        }
        if security.warehouse_keys.iter().all(|k| k.trim().is_empty()) {
            warn!("No warehouse keys configured; staff access requires an admin or warehouse session");
        }
        if security.ingest_tokens.iter().all(|t| t.trim().is_empty()) {
            warn!("No ingest tokens configured; the carrier feed endpoint rejects every request");
        }
        Ok(())
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Validates TLS files and the session secret
    /// 2. Connects the repositories (`SurrealDB` unless injected) and the upload store
    /// 3. Initializes the event bus and every feature slice
    /// 4. Constructs application state
    ///
    /// # Errors
    /// Returns an error if:
    /// * Database connection fails (unreachable host, invalid credentials)
    /// * The upload directory cannot be created
    /// * SMTP settings are invalid
    /// * SSL certificate/key files are missing
    /// * No session secret is configured
    pub async fn build(mut self) -> Result<Server> {
        self.validate_ssl_config()?;
        self.validate_security()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        let repositories = self.init_repositories().await?;
        let storage = self.init_storage().await?;
        let mailer = match self.mailer.take() {
            Some(mailer) => mailer,
            None => fhub_notifications::mailer_from_config(&self.cfg.mail)
                .context("Invalid mail configuration")?,
        };

        let events = EventBus::new();
        let slices = fhub::init(&self.cfg, &repositories, &events, storage, mailer)
            .map_err(|e| anyhow!("Platform bootstrap failed: {e}"))?;

        let state = ApiState::builder()
            .config(self.cfg)
            .events(events)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;
        info!(slices = ?state.slice_names(), "Feature slices registered");

        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete HTTP application, without binding a socket.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(address = %address, ssl = cfg.server.ssl.is_some(), "Starting server");

        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        let served = if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&ssl_config.cert, &ssl_config.key)
                    .await
                    .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")
        };

        let closed = self.state.events.shutdown();
        info!(closed, "Event bus closed");

        served?;
        info!("Server shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
