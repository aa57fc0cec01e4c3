use crate::host::DocumentId;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced around the decoration pipeline.
///
/// None of these reach the end user: the engine logs them and degrades to "no decoration".
pub enum ErbalistError {
    #[error("invalid scanner pattern: {0}")]
    /// A built-in scanner pattern failed to compile.
    Pattern(#[from] regex::Error),

    #[error("invalid erbalist settings: {0}")]
    /// The `erbalist` settings section could not be deserialized.
    Config(#[source] serde_json::Error),

    #[error("invalid persisted toggle state for '{uri}': {source}")]
    /// Persisted per-document toggles could not be parsed.
    PersistedState {
        /// The document the state belonged to.
        uri: String,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    #[error("host unavailable: {0}")]
    /// A host collaborator call failed.
    HostUnavailable(String),

    #[error("document '{0}' is closed or not a template")]
    /// The document is not (or no longer) open in the host, or the engine does not decorate it.
    InvalidDocument(DocumentId),
}
