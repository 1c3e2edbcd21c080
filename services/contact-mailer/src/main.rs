//! Contact Relay Mailer
//!
//! Startup order: configuration, logging, mail transport, then the HTTP
//! listener. No request is accepted before the transport exists.

use anyhow::{Context, Result};
use contact_mailer::{
    create_app,
    dispatcher::{Dispatcher, MailAddresses},
    ethereal::EtherealClient,
    transport::{create_transport, verify_transport, MailTransport, SmtpMailTransport},
    AppState,
};
use contact_relay_utils::{init_logging, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_logging(&config.logging)?;
    info!(mode = %config.mode, "Starting contact relay mailer");

    let ethereal = EtherealClient::new()?;
    let transport_config = create_transport(config.mode, &config.mailer, &ethereal)
        .await
        .context("Failed to create mail transport")?;
    info!(
        host = %transport_config.host,
        port = transport_config.port,
        disposable = transport_config.is_disposable(),
        "Mail transport ready"
    );

    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(transport_config)?);
    tokio::spawn(verify_transport(Arc::clone(&transport)));

    let addresses = MailAddresses::resolve(config.mode, &config.mail)?;
    let state = AppState::new(Dispatcher::new(transport, addresses), &config);
    let app = create_app(state, &config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Server is running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
