pub mod anuncio;
pub mod article;
pub mod auth;
pub mod banner;
pub mod evento;
pub mod hcd;
pub mod header_image;
pub mod health;
pub mod sitemap;
pub mod social;
pub mod streaming;
pub mod ticker;
pub mod titulos;
pub mod upload;

use serde::Deserialize;

// ?activos=true en los listados de tablas con is_active
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub activos: Option<bool>,
}

impl ListFilter {
    pub fn only_active(&self) -> bool {
        self.activos.unwrap_or(false)
    }
}
