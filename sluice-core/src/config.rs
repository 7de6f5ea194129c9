//! Engine configuration.
//!
//! The only tunable part of the engine is the debugger it reports to. The
//! configuration can come from JSON or from environment variables:
//!
//! | Variable                   | Values                     | Default               |
//! |----------------------------|----------------------------|-----------------------|
//! | `SLUICE_DEBUGGER`          | `off`, `tracing`, `remote` | `off`                 |
//! | `SLUICE_DEBUGGER_URL`      | WebSocket URL              | `ws://127.0.0.1:9876` |
//! | `SLUICE_DEBUGGER_ENCODING` | `json`, `msgpack`          | `json`                |

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where debugger notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuggerMode {
    /// No debugger attached.
    #[default]
    Off,
    /// Notifications become `tracing` events.
    Tracing,
    /// Notifications are streamed to a remote WebSocket observer.
    Remote,
}

/// Frame encoding used by the remote debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEncoding {
    /// JSON text frames.
    #[default]
    Json,
    /// MessagePack binary frames.
    Msgpack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    pub mode: DebuggerMode,
    pub url: String,
    pub encoding: WireEncoding,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            mode: DebuggerMode::Off,
            url: "ws://127.0.0.1:9876".to_string(),
            encoding: WireEncoding::Json,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub debugger: DebuggerConfig,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the configuration from `SLUICE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(mode) = lookup("SLUICE_DEBUGGER") {
            config.debugger.mode = match mode.trim().to_ascii_lowercase().as_str() {
                "" | "off" => DebuggerMode::Off,
                "tracing" => DebuggerMode::Tracing,
                "remote" => DebuggerMode::Remote,
                _ => {
                    return Err(Error::InvalidSetting {
                        key: "SLUICE_DEBUGGER",
                        value: mode,
                    })
                }
            };
        }
        if let Some(url) = lookup("SLUICE_DEBUGGER_URL") {
            config.debugger.url = url;
        }
        if let Some(encoding) = lookup("SLUICE_DEBUGGER_ENCODING") {
            config.debugger.encoding = match encoding.trim().to_ascii_lowercase().as_str() {
                "json" => WireEncoding::Json,
                "msgpack" => WireEncoding::Msgpack,
                _ => {
                    return Err(Error::InvalidSetting {
                        key: "SLUICE_DEBUGGER_ENCODING",
                        value: encoding,
                    })
                }
            };
        }

        Ok(config)
    }
}
