//! Configuration errors.
//!
//! Only misconfiguration is an error in this crate. Exhaustion is an empty `Option`
//! and ownership violations are logged no-ops, so nothing here crosses the registry or
//! director boundary at runtime.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("category {category} has no factory")]
    MissingFactory { category: String },

    #[error("category {category} was declared more than once")]
    DuplicateCategory { category: String },

    #[error("category {category} has a maximum size of zero")]
    ZeroCapacity { category: String },

    #[error("factory for category {category} did not produce a valid instance")]
    FactoryFailed { category: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid phase timeline: {0}")]
    InvalidTimeline(String),

    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config toml")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn category(kind: impl std::fmt::Debug) -> String {
        format!("{kind:?}")
    }
}
