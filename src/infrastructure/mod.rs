pub mod audio;
pub mod backends;
pub mod config;
pub mod http;
pub mod voices;
