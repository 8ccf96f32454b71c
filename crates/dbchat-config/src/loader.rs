// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dbchat.toml` > `~/.config/dbchat/dbchat.toml` >
//! `/etc/dbchat/dbchat.toml` with environment variable overrides via the
//! `DBCHAT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DbChatConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dbchat/dbchat.toml` (system-wide)
/// 3. `~/.config/dbchat/dbchat.toml` (user XDG config)
/// 4. `./dbchat.toml` (local directory)
/// 5. `DBCHAT_*` environment variables
pub fn load_config() -> Result<DbChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DbChatConfig::default()))
        .merge(Toml::file("/etc/dbchat/dbchat.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dbchat/dbchat.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dbchat.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DbChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DbChatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DbChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DbChatConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DBCHAT_API_BASE_URL` must map to
/// `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("DBCHAT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: DBCHAT_API_BASE_URL -> "api_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("api_", "api.", 1)
            .replacen("user_", "user.", 1)
            .replacen("downloads_", "downloads.", 1)
            .replacen("app_", "app.", 1);
        mapped.into()
    })
}
