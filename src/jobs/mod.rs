pub mod monitor;
pub mod ping;
