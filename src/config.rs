//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Deployment variables (HOST, PORT, RNNOISE_PORT)
//! 2. Environment variables (APP_SERVER__HOST, APP_SUPPRESSION__BACKEND, etc.)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)

use crate::audio::suppressor::SuppressorKind;
use crate::audio::TELEPHONY_SAMPLE_RATE;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Upper bound for `audio.max_payload_bytes` (about 35 minutes at 8 kHz).
/// The JSON body limit is sized from this, so any accepted setting is
/// enforced by payload validation rather than by the body extractor.
pub const MAX_PAYLOAD_CEILING: usize = 16 * 1024 * 1024;

/// Main application configuration that contains all settings.
///
/// Split into logical groups so each part of the service only has to look
/// at the settings it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub suppression: SuppressionConfig,
    pub audio: AudioConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Noise suppression settings.
///
/// ## Fields:
/// - `enabled`: When false no suppressor is created and cleaning requests get 503
/// - `backend`: Which suppressor to build ("rnnoise" or "passthrough")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionConfig {
    pub enabled: bool,
    pub backend: String,
}

/// Accepted audio format and limits.
///
/// ## Fields:
/// - `sample_rate`: Telephony rate; the pipeline only supports 8000
/// - `max_payload_bytes`: Largest μ-law payload accepted per request (one byte per sample)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub max_payload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8081,
            },
            suppression: SuppressionConfig {
                enabled: true,
                backend: "rnnoise".to_string(),
            },
            audio: AudioConfig {
                sample_rate: TELEPHONY_SAMPLE_RATE,
                max_payload_bytes: 160_000, // 20 seconds at 8kHz
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`: Override server port
    /// - `APP_SUPPRESSION__BACKEND=passthrough`: Disable the model but keep the pipeline
    /// - `APP_SUPPRESSION__ENABLED=false`: Run without a suppressor (health reports degraded)
    /// - `RNNOISE_PORT=8081`: Port variable used by existing deployments
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // Double underscore between sections so field names keep theirs:
            // APP_AUDIO__MAX_PAYLOAD_BYTES → audio.max_payload_bytes
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("RNNOISE_PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.audio.sample_rate != TELEPHONY_SAMPLE_RATE {
            return Err(anyhow::anyhow!(
                "Unsupported sample rate {}: only {} Hz telephony audio is supported",
                self.audio.sample_rate,
                TELEPHONY_SAMPLE_RATE
            ));
        }

        if self.audio.max_payload_bytes == 0 {
            return Err(anyhow::anyhow!("Max payload size must be greater than 0"));
        }

        if self.audio.max_payload_bytes > MAX_PAYLOAD_CEILING {
            return Err(anyhow::anyhow!(
                "Max payload size {} exceeds the ceiling of {} bytes",
                self.audio.max_payload_bytes,
                MAX_PAYLOAD_CEILING
            ));
        }

        self.suppression.backend.parse::<SuppressorKind>()?;

        Ok(())
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// Only fields present in the JSON are changed; for example
    /// `{"audio": {"max_payload_bytes": 8000}}` changes only the payload limit.
    /// Suppression settings are fixed at startup and ignored here.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial_config: serde_json::Value = serde_json::from_str(json_str)?;

        if let Some(server) = partial_config.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = u16::try_from(port)
                    .map_err(|_| anyhow::anyhow!("Server port out of range: {}", port))?;
            }
        }

        if let Some(audio) = partial_config.get("audio") {
            if let Some(rate) = audio.get("sample_rate").and_then(|v| v.as_u64()) {
                self.audio.sample_rate = u32::try_from(rate)
                    .map_err(|_| anyhow::anyhow!("Sample rate out of range: {}", rate))?;
            }
            if let Some(limit) = audio.get("max_payload_bytes").and_then(|v| v.as_u64()) {
                self.audio.max_payload_bytes = usize::try_from(limit)
                    .map_err(|_| anyhow::anyhow!("Max payload size out of range: {}", limit))?;
            }
        }

        self.validate()?;
        Ok(())
    }
}
