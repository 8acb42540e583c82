//! Explicit application configuration.
//!
//! All ambient state (process environment, `.env` file, optional
//! `haksik.toml`) is read exactly once, here, by [`AppConfig::resolve`].
//! Every other module receives plain values through constructors and never
//! touches the environment itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::graph::prefix::DEFAULT_DOMAIN_NS;
use crate::llm::GeminiConfig;

/// Default generative model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the provider credential.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Fixed knowledge-base layout: schema (TBox) file relative to the KB root.
pub const TBOX_REL_PATH: &str = "ontology/tbox.ttl";

/// Fixed knowledge-base layout: instance (ABox) file relative to the KB root.
pub const ABOX_REL_PATH: &str = "abox_inferred.ttl";

/// Optional per-knowledge-base config file (`<kb root>/haksik.toml`).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct KbConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
    namespace: Option<String>,
}

/// Resolved configuration for one session.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Knowledge-base root directory.
    pub kb_dir: PathBuf,
    /// Provider credential; `None` when no key is configured anywhere.
    pub api_key: Option<String>,
    /// Generative model identifier.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Domain namespace IRI used for compact-prefix rendering and prompts.
    pub namespace: String,
}

impl AppConfig {
    /// Resolve configuration for a knowledge-base root.
    ///
    /// Precedence, highest first: explicit overrides (CLI flags), the `.env`
    /// file in the KB root, the process environment (credential only),
    /// `haksik.toml` in the KB root, built-in defaults. A missing `.env` or
    /// `haksik.toml` is fine; a malformed `haksik.toml` is a fatal
    /// [`ConfigError`].
    pub fn resolve(
        kb_dir: PathBuf,
        model_override: Option<String>,
        timeout_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let kb_config = load_kb_config(&kb_dir.join("haksik.toml"))?;
        let env_file = load_env_file(&kb_dir.join(".env"));

        let api_key = env_file
            .get(API_KEY_VAR)
            .cloned()
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|k| !k.trim().is_empty());

        let model = model_override
            .or(kb_config.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = timeout_override
            .or(kb_config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let namespace = kb_config
            .namespace
            .unwrap_or_else(|| DEFAULT_DOMAIN_NS.to_string());

        tracing::debug!(
            kb_dir = %kb_dir.display(),
            model = %model,
            has_key = api_key.is_some(),
            "resolved configuration"
        );

        Ok(Self {
            kb_dir,
            api_key,
            model,
            timeout_secs,
            namespace,
        })
    }

    /// Path of the schema (TBox) source.
    pub fn tbox_path(&self) -> PathBuf {
        self.kb_dir.join(TBOX_REL_PATH)
    }

    /// Path of the instance (ABox) source.
    pub fn abox_path(&self) -> PathBuf {
        self.kb_dir.join(ABOX_REL_PATH)
    }

    /// Provider-client configuration derived from this config.
    pub fn generator(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

fn load_kb_config(path: &Path) -> Result<KbConfig, ConfigError> {
    if !path.exists() {
        return Ok(KbConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Toml {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read `KEY=VALUE` pairs from a `.env` file. Blank lines and `#` comments
/// are skipped; a missing or unreadable file yields an empty map.
fn load_env_file(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_env_file(&text),
        Err(_) => HashMap::new(),
    }
}

fn parse_env_file(text: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            vars.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    vars
}
