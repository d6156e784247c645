pub mod jwt;
pub mod security;
pub mod slug;
pub mod validation;
