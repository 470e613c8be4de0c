use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("domain '{host}' not found")]
    DomainNotFound { host: String },

    #[error("domain '{host}' has no brand profile; seed the inventory first")]
    ProfileNotFound { host: String },

    #[error("no submission exists for domain '{host}' and provider '{slug}'")]
    SubmissionNotFound { host: String, slug: String },

    #[error("provider '{slug}' is not in the catalog")]
    UnknownProvider { slug: String },

    #[error(transparent)]
    Db(#[from] citesync_db::DbError),

    #[error(transparent)]
    Adapter(#[from] citesync_providers::AdapterError),
}
