use crate::session::EngineSettings;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub session: SessionDefaults,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Engine timing defaults applied to every session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDefaults {
    /// Cap on a single response-provider call, in seconds
    pub reply_timeout_secs: u64,

    /// Post-reply speaking-indicator window, in milliseconds
    pub speaking_hold_ms: u64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 30,
            speaking_hold_ms: 2500,
        }
    }
}

impl SessionDefaults {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            reply_timeout: Duration::from_secs(self.reply_timeout_secs),
            speaking_hold: Duration::from_millis(self.speaking_hold_ms),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "avatar-session".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 8080,
                },
            },
            session: SessionDefaults::default(),
        }
    }
}
