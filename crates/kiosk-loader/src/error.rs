//! Error types for loader operations.

use thiserror::Error;

use crate::unit::LoadPhase;

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while classifying or loading a file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A path matched a family prefix but its embedded metadata could not be
    /// extracted. The file cannot be loaded without a partition key.
    #[error("cannot extract snapshot date from path: {0}")]
    MalformedPath(String),

    /// A per-file load unit failed partway through.
    ///
    /// `reached` is the last phase the unit completed before the failure;
    /// retries can reason about recovery from it (a unit that reached
    /// `Merged` but failed before the manifest write will redo the merge
    /// harmlessly; one that reached `Manifested` leaves stray staging rows
    /// for the next unit to sweep).
    #[error("load unit for {path} failed after reaching {reached}: {source}")]
    Unit {
        /// Full object path of the file being loaded.
        path: String,
        /// Last phase completed before the failure.
        reached: LoadPhase,
        /// The failing operation's error.
        #[source]
        source: kiosk_core::Error,
    },

    /// An infrastructure operation failed outside a load unit.
    #[error(transparent)]
    Core(#[from] kiosk_core::Error),
}
