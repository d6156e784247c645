use std::time::Duration;

use reqwest::Url;
use tokio::{sync::watch, time::MissedTickBehavior};

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("URL de ping inválida: {0}")]
    InvalidUrl(String),
    #[error("error de red: {0}")]
    Request(#[from] reqwest::Error),
    #[error("respuesta {0}")]
    Status(u16),
}

// "https://www.google.com/ping?sitemap=" + URL del sitemap codificada
pub fn search_ping_url(ping_base: &str, sitemap_url: &str) -> Result<Url, PingError> {
    Url::parse(sitemap_url).map_err(|_| PingError::InvalidUrl(sitemap_url.to_string()))?;
    let encoded = urlencoding::encode(sitemap_url);
    Url::parse(&format!("{ping_base}{encoded}")).map_err(|_| PingError::InvalidUrl(ping_base.to_string()))
}

pub async fn ping(http: &reqwest::Client, url: Url) -> Result<u16, PingError> {
    let response = http.get(url).timeout(Duration::from_secs(30)).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PingError::Status(status.as_u16()));
    }
    Ok(status.as_u16())
}

/// Tarea programada: hace un GET a `url` en cada intervalo, sin reintentos.
pub async fn run(
    name: &'static str,
    http: reqwest::Client,
    url: Url,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Tarea {} programada cada {:?} hacia {}", name, every, url);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        match ping(&http, url.clone()).await {
            Ok(status) => tracing::info!("{}: ok ({})", name, status),
            Err(e) => tracing::error!("{}: falló ({})", name, e),
        }
    }
}
