use reqwest::Url;
use serde::Serialize;

/// Reproductor que debe montar el sitio público para un stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayerSource {
    // Embed de YouTube
    Youtube { video_id: String, embed_url: String },
    // Reproductor adaptativo (hls.js) sobre un <video> nativo
    Hls { source: String },
}

pub fn select_player(url: &str) -> PlayerSource {
    match youtube_video_id(url) {
        Some(video_id) => PlayerSource::Youtube {
            embed_url: format!("https://www.youtube.com/embed/{video_id}?autoplay=1&mute=1"),
            video_id,
        },
        None => PlayerSource::Hls {
            source: url.trim().to_string(),
        },
    }
}

pub fn is_youtube(url: &str) -> bool {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(is_youtube_host))
        .unwrap_or(false)
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        host,
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "youtu.be" | "www.youtube-nocookie.com"
    )
}

/// Extrae el id de video de URLs watch, embed, live, shorts y youtu.be.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let candidate = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else {
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed" | "live" | "shorts" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    };

    candidate.filter(|id| valid_video_id(id))
}

fn valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
