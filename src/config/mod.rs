pub mod settings;

pub use settings::{AccessConfig, ServerConfig, Settings, UpstreamConfig};
