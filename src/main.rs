use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ctrader_bridge::{config, routes, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ctrader_bridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::load();

    if settings.has_credentials() {
        tracing::info!("configuration loaded");
    } else {
        tracing::warn!("missing CLIENT_ID, CLIENT_SECRET or ACCESS_TOKEN; broker proxy calls will fail");
    }

    let ip = settings.host.parse::<IpAddr>().unwrap_or_else(|_| {
        tracing::warn!(host = %settings.host, "invalid HOST, binding 0.0.0.0");
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    });
    let addr = SocketAddr::from((ip, settings.port));

    let state = AppState::new(settings);
    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("cTrader bridge listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
