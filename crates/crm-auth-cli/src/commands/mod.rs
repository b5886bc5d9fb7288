pub mod config;
pub mod keys;
pub mod pkce;
pub mod smoke;
