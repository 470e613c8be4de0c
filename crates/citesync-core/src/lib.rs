use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod domains;
pub mod fingerprint;
pub mod location;
pub mod phone;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domains::{load_domains, DomainConfig, DomainsFile, ListingConfig};
pub use fingerprint::location_fingerprint;
pub use location::{
    DayHours, NormalizedLocation, QueueAction, SubmissionStatus, VerifyStatus, Weekday,
};
pub use phone::normalize_phone;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read domains file {path}: {source}")]
    DomainsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse domains file: {0}")]
    DomainsFileParse(#[from] serde_yaml::Error),

    #[error("domains file validation failed: {0}")]
    Validation(String),
}
