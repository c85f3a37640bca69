//! Application configuration

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Broker
    pub broker_url: String,
    pub reconnect_delay: Duration,

    // Collaborator services
    pub tenant_service_url: String,
    pub chat_service_url: String,
    pub ai_service_url: String,

    // Session identity
    pub tenant_id: String,
    pub agent_id: String,
    pub agent_name: String,

    // Retention: whether customers released by a drop are removed from the
    // ledger or returned to the waiting pool
    pub forget_dropped_customers: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let agent_id = env::var("AGENT_ID").map_err(|_| ConfigError::Missing("AGENT_ID"))?;
        Ok(Self {
            broker_url: env::var("BROKER_WS_URL")
                .unwrap_or_else(|_| "ws://localhost:8080/ws".to_string()),
            reconnect_delay: Duration::from_millis(
                env::var("RECONNECT_DELAY_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("RECONNECT_DELAY_MS"))?,
            ),

            tenant_service_url: env::var("TENANT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            chat_service_url: env::var("CHAT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            ai_service_url: env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),

            tenant_id: env::var("TENANT_ID").map_err(|_| ConfigError::Missing("TENANT_ID"))?,
            agent_name: env::var("AGENT_NAME").unwrap_or_else(|_| agent_id.clone()),
            agent_id,

            forget_dropped_customers: env::var("FORGET_DROPPED_CUSTOMERS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
