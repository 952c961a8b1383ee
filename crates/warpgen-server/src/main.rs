//! warpgen Server
//!
//! HTTP front for the profile generator.

mod captcha;
mod handlers;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warpgen_core::{GenerationService, Settings};

use crate::captcha::CaptchaVerifier;
use crate::handlers::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warpgen_server=debug,warpgen_core=debug,tower_http=debug".into()
            }),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;

    let catalog = settings.route_catalog();
    let stats = catalog.stats();
    tracing::info!(
        "Route catalog: {} services, {} unique ranges",
        stats.total_services,
        stats.unique_ranges
    );

    let upstream = settings
        .upstream_client()
        .context("building upstream client")?;
    tracing::info!("Upstream API: {}", settings.upstream.base_url);

    let captcha = CaptchaVerifier::from_settings(&settings.captcha, settings.upstream_timeout())
        .context("building captcha verifier")?;
    if captcha.is_some() {
        tracing::info!("Captcha verification enabled");
    }

    let state = Arc::new(AppState {
        service: GenerationService::new(Arc::new(catalog), upstream),
        captcha,
    });

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("binding {}", settings.bind_address))?;
    tracing::info!("Server listening on http://{}", settings.bind_address);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
