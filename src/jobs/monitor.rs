//! Auto-detección del vivo: cada cierto intervalo, si `is_auto` está activo,
//! se prueba la URL del stream activo y se actualiza `stream-videos.stream`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::{config::MonitorConfig, db::DbPool, models::streaming::StreamToggle, player::is_youtube};

#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn toggle(&self) -> Result<Option<StreamToggle>, sqlx::Error>;
    async fn active_stream_url(&self) -> Result<Option<String>, sqlx::Error>;
    async fn set_stream(&self, live: bool) -> Result<(), sqlx::Error>;
}

pub struct PgMonitorStore {
    pool: DbPool,
}

impl PgMonitorStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MonitorStore for PgMonitorStore {
    async fn toggle(&self) -> Result<Option<StreamToggle>, sqlx::Error> {
        sqlx::query_as::<_, StreamToggle>(r#"SELECT is_auto, stream FROM "stream-videos" WHERE id = 1"#)
            .fetch_optional(&self.pool)
            .await
    }

    async fn active_stream_url(&self) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT url FROM streaming WHERE is_active = TRUE ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_stream(&self, live: bool) -> Result<(), sqlx::Error> {
        sqlx::query(r#"UPDATE "stream-videos" SET stream = $1 WHERE id = 1"#)
            .bind(live)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Youtube,
    Hls,
    Generic,
}

pub fn classify(url: &str) -> ProbeKind {
    if is_youtube(url) {
        return ProbeKind::Youtube;
    }
    let is_manifest = Url::parse(url.trim())
        .map(|u| u.path().to_ascii_lowercase().ends_with(".m3u8"))
        .unwrap_or(false);
    if is_manifest {
        ProbeKind::Hls
    } else {
        ProbeKind::Generic
    }
}

#[derive(Clone)]
pub struct StreamProber {
    http: reqwest::Client,
    oembed_url: String,
    timeout: Duration,
}

impl StreamProber {
    pub fn new(http: reqwest::Client, config: &MonitorConfig) -> Self {
        Self {
            http,
            oembed_url: config.oembed_url.clone(),
            timeout: config.probe_timeout,
        }
    }

    pub async fn is_live(&self, url: &str) -> bool {
        let result = match classify(url) {
            ProbeKind::Youtube => self.probe_youtube(url).await,
            ProbeKind::Hls => self.probe_manifest(url).await,
            ProbeKind::Generic => self.probe_reachable(url).await,
        };
        match result {
            Ok(live) => live,
            Err(e) => {
                tracing::debug!("Sonda de {} falló: {}", url, e);
                false
            }
        }
    }

    // YouTube responde 200 en oEmbed solo si el video existe y es público
    async fn probe_youtube(&self, url: &str) -> Result<bool, reqwest::Error> {
        let Ok(endpoint) = Url::parse_with_params(&self.oembed_url, &[("url", url), ("format", "json")])
        else {
            tracing::warn!("YOUTUBE_OEMBED_URL inválida: {}", self.oembed_url);
            return Ok(false);
        };
        let response = self.http.get(endpoint).timeout(self.timeout).send().await?;
        Ok(response.status().is_success())
    }

    async fn probe_manifest(&self, url: &str) -> Result<bool, reqwest::Error> {
        let response = self.http.get(url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let body = response.text().await?;
        Ok(body.trim_start().starts_with("#EXTM3U"))
    }

    async fn probe_reachable(&self, url: &str) -> Result<bool, reqwest::Error> {
        let response = self.http.head(url).timeout(self.timeout).send().await?;
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            let response = self.http.get(url).timeout(self.timeout).send().await?;
            return Ok(response.status().is_success());
        }
        Ok(response.status().is_success())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    // Modo automático apagado (o sin fila de configuración)
    Disabled,
    Unchanged(bool),
    Updated(bool),
}

/// Una vuelta del monitor: leer, probar, comparar y escribir solo si cambió.
pub async fn check_once(
    store: &dyn MonitorStore,
    prober: &StreamProber,
) -> Result<TickOutcome, sqlx::Error> {
    let Some(toggle) = store.toggle().await? else {
        return Ok(TickOutcome::Disabled);
    };
    if !toggle.is_auto {
        return Ok(TickOutcome::Disabled);
    }

    let live = match store.active_stream_url().await? {
        Some(url) => prober.is_live(&url).await,
        None => false,
    };

    if live == toggle.stream {
        return Ok(TickOutcome::Unchanged(live));
    }
    store.set_stream(live).await?;
    Ok(TickOutcome::Updated(live))
}

// Las vueltas son secuenciales: una sonda lenta retrasa la siguiente, nunca se solapan
pub async fn run(
    store: Arc<dyn MonitorStore>,
    prober: StreamProber,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Monitor de streaming iniciado (cada {:?})", every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        match check_once(store.as_ref(), &prober).await {
            Ok(TickOutcome::Updated(live)) => {
                tracing::info!("Estado del vivo cambiado: stream={}", live)
            }
            Ok(outcome) => tracing::trace!("Monitor de streaming: {:?}", outcome),
            Err(e) => tracing::error!("Monitor de streaming sin acceso a la base: {:?}", e),
        }
    }

    tracing::info!("Monitor de streaming detenido");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::Router;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        toggle: Mutex<Option<StreamToggle>>,
        url: Mutex<Option<String>>,
        writes: Mutex<Vec<bool>>,
    }

    impl MemoryStore {
        fn new(is_auto: bool, stream: bool, url: Option<String>) -> Self {
            Self {
                toggle: Mutex::new(Some(StreamToggle { is_auto, stream })),
                url: Mutex::new(url),
                writes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MonitorStore for MemoryStore {
        async fn toggle(&self) -> Result<Option<StreamToggle>, sqlx::Error> {
            Ok(*self.toggle.lock().unwrap())
        }

        async fn active_stream_url(&self) -> Result<Option<String>, sqlx::Error> {
            Ok(self.url.lock().unwrap().clone())
        }

        async fn set_stream(&self, live: bool) -> Result<(), sqlx::Error> {
            self.writes.lock().unwrap().push(live);
            if let Some(toggle) = self.toggle.lock().unwrap().as_mut() {
                toggle.stream = live;
            }
            Ok(())
        }
    }

    async fn spawn_probe_targets() -> String {
        let app = Router::new()
            .route("/live/ok.m3u8", get(|| async { "#EXTM3U\n#EXT-X-VERSION:3\n" }))
            .route("/live/roto.m3u8", get(|| async { "<html>404</html>" }))
            .route("/oembed", get(|| async { "{\"title\":\"En vivo\"}" }))
            .route("/radio", get(|| async { "ok" }))
            .route("/caido", get(|| async { HttpStatus::SERVICE_UNAVAILABLE }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        format!("http://{address}")
    }

    fn prober(base: &str) -> StreamProber {
        StreamProber::new(
            reqwest::Client::new(),
            &MonitorConfig {
                interval: Duration::from_secs(20),
                probe_timeout: Duration::from_secs(5),
                oembed_url: format!("{base}/oembed"),
            },
        )
    }

    #[test]
    fn classifies_probe_kind() {
        assert_eq!(classify("https://www.youtube.com/watch?v=abc"), ProbeKind::Youtube);
        assert_eq!(classify("https://cdn.example/live/canal.M3U8?token=1"), ProbeKind::Hls);
        assert_eq!(classify("https://radio.example/stream"), ProbeKind::Generic);
    }

    #[tokio::test]
    async fn probes_follow_the_url_kind() {
        let base = spawn_probe_targets().await;
        let prober = prober(&base);
        assert!(prober.is_live(&format!("{base}/live/ok.m3u8")).await);
        assert!(!prober.is_live(&format!("{base}/live/roto.m3u8")).await);
        assert!(prober.is_live(&format!("{base}/radio")).await);
        assert!(!prober.is_live(&format!("{base}/caido")).await);
        assert!(prober.is_live("https://www.youtube.com/watch?v=abc").await);
        assert!(!prober.is_live("http://127.0.0.1:1/nada").await);
    }

    #[tokio::test]
    async fn writes_only_when_state_changes() {
        let base = spawn_probe_targets().await;
        let prober = prober(&base);
        let store = MemoryStore::new(true, false, Some(format!("{base}/live/ok.m3u8")));

        assert_eq!(check_once(&store, &prober).await.unwrap(), TickOutcome::Updated(true));
        assert_eq!(check_once(&store, &prober).await.unwrap(), TickOutcome::Unchanged(true));
        assert_eq!(*store.writes.lock().unwrap(), vec![true]);

        *store.url.lock().unwrap() = Some(format!("{base}/caido"));
        assert_eq!(check_once(&store, &prober).await.unwrap(), TickOutcome::Updated(false));
        assert_eq!(*store.writes.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn no_active_stream_means_videos() {
        let store = MemoryStore::new(true, true, None);
        let outcome = check_once(&store, &prober("http://127.0.0.1:1")).await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated(false));
    }

    #[tokio::test]
    async fn manual_mode_is_left_alone() {
        let store = MemoryStore::new(false, true, Some("http://127.0.0.1:1/x".into()));
        let outcome = check_once(&store, &prober("http://127.0.0.1:1")).await.unwrap();
        assert_eq!(outcome, TickOutcome::Disabled);
        assert!(store.writes.lock().unwrap().is_empty());

        let empty = MemoryStore::default();
        let outcome = check_once(&empty, &prober("http://127.0.0.1:1")).await.unwrap();
        assert_eq!(outcome, TickOutcome::Disabled);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let store: Arc<dyn MonitorStore> = Arc::new(MemoryStore::new(false, false, None));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(
            store,
            prober("http://127.0.0.1:1"),
            Duration::from_millis(10),
            rx,
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop")
            .expect("task should not panic");
    }
}
