//! Lightweight configuration loader and typed engine settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars. `Settings` extracts the tuning knobs the engine actually consumes,
//! with defaults that match the shipped behavior.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}

/// Tuning knobs for scoring, fusion, deduplication, and normalization.
#[derive(Debug, Clone)]
pub struct Settings {
    /// BM25 term-frequency saturation.
    pub k1: f32,
    /// BM25 document-length normalization.
    pub b: f32,
    /// Fusion weight for the semantic score; `1 - alpha` goes to keyword.
    pub alpha: f32,
    /// Default result count for `retrieve`.
    pub top_k: usize,
    /// Cheap name-similarity cutoff applied before the expensive dedup gates.
    pub name_pre_filter: f32,
    /// Final name-similarity threshold for accepting a duplicate pair.
    pub name_threshold: f32,
    /// Lowest tolerated `min/max` price ratio between duplicate candidates.
    pub price_ratio_floor: f32,
    /// Cosine threshold for embedding-based term normalization.
    pub similarity_threshold: f32,
    /// Where the learned normalization rules are persisted.
    pub rules_path: PathBuf,
    /// Upper bound on one embedding call before falling back.
    pub embed_timeout_ms: u64,
    /// Vector width of the deterministic fallback embedder.
    pub embed_dim: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            alpha: 0.6,
            top_k: 10,
            name_pre_filter: 0.7,
            name_threshold: 0.85,
            price_ratio_floor: 0.8,
            similarity_threshold: 0.8,
            rules_path: PathBuf::from("normalization_rules.json"),
            embed_timeout_ms: 3000,
            embed_dim: 384,
        }
    }
}

impl Settings {
    /// Reads settings from a loaded [`Config`], falling back to the defaults
    /// for any key that is absent.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            k1: config.get("search.k1").unwrap_or(defaults.k1),
            b: config.get("search.b").unwrap_or(defaults.b),
            alpha: config.get("search.alpha").unwrap_or(defaults.alpha),
            top_k: config.get("search.top_k").unwrap_or(defaults.top_k),
            name_pre_filter: config.get("dedup.name_pre_filter").unwrap_or(defaults.name_pre_filter),
            name_threshold: config.get("dedup.name_threshold").unwrap_or(defaults.name_threshold),
            price_ratio_floor: config
                .get("dedup.price_ratio_floor")
                .unwrap_or(defaults.price_ratio_floor),
            similarity_threshold: config
                .get("normalize.similarity_threshold")
                .unwrap_or(defaults.similarity_threshold),
            rules_path: config
                .get::<String>("normalize.rules_path")
                .map(|p| expand_path(&p))
                .unwrap_or(defaults.rules_path),
            embed_timeout_ms: config
                .get("embedding.timeout_ms")
                .unwrap_or(defaults.embed_timeout_ms),
            embed_dim: config.get("embedding.dim").unwrap_or(defaults.embed_dim),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidConfig("alpha must be within [0, 1]".into()));
        }
        if self.k1 <= 0.0 {
            return Err(Error::InvalidConfig("k1 must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig("b must be within [0, 1]".into()));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be greater than 0".into()));
        }
        for (name, value) in [
            ("name_pre_filter", self.name_pre_filter),
            ("name_threshold", self.name_threshold),
            ("price_ratio_floor", self.price_ratio_floor),
            ("similarity_threshold", self.similarity_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidConfig(format!("{name} must be within (0, 1]")));
            }
        }
        if self.name_pre_filter > self.name_threshold {
            return Err(Error::InvalidConfig(
                "name_pre_filter must not exceed name_threshold".into(),
            ));
        }
        if self.embed_timeout_ms == 0 {
            return Err(Error::InvalidConfig("embedding timeout must be greater than 0".into()));
        }
        if self.embed_dim == 0 {
            return Err(Error::InvalidConfig("embedding dim must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn default_settings_match_shipped_tuning() {
        let settings = Settings::default();
        assert!((settings.k1 - 1.5).abs() < f32::EPSILON);
        assert!((settings.b - 0.75).abs() < f32::EPSILON);
        assert!((settings.alpha - 0.6).abs() < f32::EPSILON);
        assert!((settings.name_threshold - 0.85).abs() < f32::EPSILON);
        assert!((settings.price_ratio_floor - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn alpha_outside_unit_interval_rejected() {
        let settings = Settings { alpha: 1.2, ..Settings::default() };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn zero_threshold_rejected() {
        let settings = Settings { name_threshold: 0.0, ..Settings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn pre_filter_above_final_threshold_rejected() {
        let settings = Settings {
            name_pre_filter: 0.9,
            name_threshold: 0.85,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("name_pre_filter"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let settings = Settings { embed_timeout_ms: 0, ..Settings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn expand_path_keeps_plain_relative_paths() {
        assert_eq!(expand_path("rules.json"), PathBuf::from("rules.json"));
    }

    #[test]
    fn resolve_with_base_joins_relative() {
        let base = Path::new("/data");
        assert_eq!(resolve_with_base(base, "rules.json"), PathBuf::from("/data/rules.json"));
    }
}
