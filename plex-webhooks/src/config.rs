use std::collections::HashSet;
use std::net::SocketAddr;

use envconfig::Envconfig;
use tracing::Level;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    pub webhook_ids: String, // Comma-delimited ids, one per configured media server

    #[envconfig(default = "plex_webhooks")]
    pub event_type: String,

    #[envconfig(default = "10000000")]
    pub max_body_size: usize,

    #[envconfig(nested = true)]
    pub hass: HassConfig,

    pub otel_url: Option<String>,

    #[envconfig(default = "1.0")]
    pub otel_sampling_rate: f64,

    #[envconfig(default = "plex-webhooks")]
    pub otel_service_name: String,

    // Used for integration tests
    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(default = "info")]
    pub log_level: Level,
}

impl Config {
    pub fn webhook_ids(&self) -> HashSet<String> {
        parse_webhook_ids(&self.webhook_ids)
    }
}

#[derive(Envconfig, Clone)]
pub struct HassConfig {
    #[envconfig(default = "http://localhost:8123")]
    pub hass_url: String,
    pub hass_token: Option<String>, // Long-lived access token
    #[envconfig(default = "5000")]
    pub hass_request_timeout_ms: u64,
    #[envconfig(default = "1000")]
    pub hass_queue_capacity: usize, // Events waiting for delivery before publishing fails
}

fn parse_webhook_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
