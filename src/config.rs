use std::{env, time::Duration};

// Configuración leída del entorno (.env + variables del sistema)

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} no está definido en .env")]
    Missing(&'static str),
    #[error("valor inválido para {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    // Storage REST compatible con Supabase
    Supabase { base_url: String, anon_key: String },
    // Carpeta local servida en /uploads
    Local { dir: String },
}

#[derive(Debug, Clone, Default)]
pub struct SocialConfig {
    pub access_token: Option<String>,
    pub facebook_page_id: Option<String>,
    pub instagram_account_id: Option<String>,
    pub graph_api_url: String,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub oembed_url: String,
}

#[derive(Debug, Clone)]
pub struct PingConfig {
    pub search_ping_url: String,
    // None = tarea desactivada
    pub search_ping_every: Option<Duration>,
    pub sitemap_refresh_every: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub site_url: String,
    pub run_migrations: bool,
    pub storage: StorageConfig,
    pub social: SocialConfig,
    pub ai: AiConfig,
    pub monitor: MonitorConfig,
    pub ping: PingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado de `from_env` para poder probarlo sin tocar el entorno del proceso
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: v })?,
            None => 3000,
        };

        let storage = match get("STORAGE_BACKEND").as_deref().unwrap_or("supabase") {
            "supabase" => StorageConfig::Supabase {
                base_url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
                anon_key: required("SUPABASE_ANON_KEY")?,
            },
            "local" => StorageConfig::Local {
                dir: get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let run_migrations = match get("RUN_MIGRATIONS") {
            Some(v) => parse_bool("RUN_MIGRATIONS", v)?,
            None => false,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port,
            jwt_secret: required("JWT_SECRET")?,
            site_url: required("SITE_URL")?.trim_end_matches('/').to_string(),
            run_migrations,
            storage,
            social: SocialConfig {
                access_token: get("META_ACCESS_TOKEN"),
                facebook_page_id: get("FACEBOOK_PAGE_ID"),
                instagram_account_id: get("INSTAGRAM_ACCOUNT_ID"),
                graph_api_url: get("GRAPH_API_URL")
                    .unwrap_or_else(|| "https://graph.facebook.com/v19.0".to_string()),
            },
            ai: AiConfig {
                api_key: get("GEMINI_API_KEY"),
                api_url: get("GEMINI_API_URL").unwrap_or_else(|| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            },
            monitor: MonitorConfig {
                interval: Duration::from_secs(secs(&get, "STREAM_CHECK_INTERVAL_SECS", 20)?.max(1)),
                probe_timeout: Duration::from_secs(5),
                oembed_url: get("YOUTUBE_OEMBED_URL")
                    .unwrap_or_else(|| "https://www.youtube.com/oembed".to_string()),
            },
            ping: PingConfig {
                search_ping_url: get("SEARCH_PING_URL")
                    .unwrap_or_else(|| "https://www.google.com/ping?sitemap=".to_string()),
                search_ping_every: every(secs(&get, "SEARCH_PING_INTERVAL_SECS", 86_400)?),
                sitemap_refresh_every: every(secs(&get, "SITEMAP_REFRESH_INTERVAL_SECS", 86_400)?),
            },
        })
    }

    pub fn sitemap_url(&self) -> String {
        format!("{}/sitemap.xml", self.site_url)
    }
}

fn secs<G>(get: &G, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        None => Ok(default),
    }
}

fn every(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
