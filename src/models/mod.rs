pub mod anuncio;
pub mod article;
pub mod banner;
pub mod evento;
pub mod hcd;
pub mod header_image;
pub mod streaming;
pub mod ticker;
pub mod user;
