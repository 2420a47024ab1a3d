// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Client configuration from the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use crate::protocol::Speed;
use crate::session::SessionConfig;

/// Configuration for the headless client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket base URL; the session endpoint is `{server_url}/ws/{client_id}`.
    pub server_url: String,
    pub player_name: String,
    pub speed: Speed,
    /// JSON file backing the score ledger.
    pub store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8000".to_string(),
            player_name: "Player".to_string(),
            speed: Speed::Normal,
            store_path: PathBuf::from("qracing-store.json"),
        }
    }
}

impl ClientConfig {
    /// Read `QRACING_SERVER_URL`, `QRACING_PLAYER`, `QRACING_SPEED` and
    /// `QRACING_STORE`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var("QRACING_SERVER_URL") {
            if url.starts_with("ws://") || url.starts_with("wss://") {
                config.server_url = url.trim().to_string();
            } else {
                warn!("QRACING_SERVER_URL must be a ws:// or wss:// URL, using {}", config.server_url);
            }
        }
        if let Some(name) = var("QRACING_PLAYER") {
            config.player_name = name.trim().to_string();
        }
        if let Some(speed) = var("QRACING_SPEED") {
            config.speed = speed
                .parse::<Speed>()
                .map_err(anyhow::Error::msg)
                .context("invalid QRACING_SPEED")?;
        }
        if let Some(path) = var("QRACING_STORE") {
            config.store_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Immutable per-session settings handed to `SessionManager::start`.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            player_name: self.player_name.clone(),
            speed: self.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QRACING_SERVER_URL", "wss://race.example.org"),
            ("QRACING_PLAYER", " Ada "),
            ("QRACING_SPEED", "fast"),
            ("QRACING_STORE", "/tmp/scores.json"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "wss://race.example.org");
        assert_eq!(config.store_path, PathBuf::from("/tmp/scores.json"));
        assert_eq!(
            config.session_config(),
            SessionConfig {
                player_name: "Ada".into(),
                speed: Speed::Fast,
            }
        );
    }

    #[test]
    fn test_bad_url_falls_back() {
        let config =
            ClientConfig::from_lookup(lookup(&[("QRACING_SERVER_URL", "http://x")])).unwrap();
        assert_eq!(config.server_url, "ws://localhost:8000");
    }

    #[test]
    fn test_bad_speed_is_an_error() {
        assert!(ClientConfig::from_lookup(lookup(&[("QRACING_SPEED", "ludicrous")])).is_err());
    }
}
