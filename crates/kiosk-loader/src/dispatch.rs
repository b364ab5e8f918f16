//! Storage-notification dispatch.
//!
//! Receives object-created events, classifies the path, and runs the
//! per-file load unit. The dispatcher performs no storage or warehouse I/O
//! of its own; it only inspects the event and maps the unit's result onto
//! the `(message, status)` outcome the invoking platform expects.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::LoadError;
use crate::paths::{Classification, classify};
use crate::unit::Loader;

/// An object-created notification from storage.
///
/// Extra fields in the notification payload are ignored on parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageEvent {
    /// Bucket the object was created in.
    pub bucket: String,
    /// Full object path.
    pub name: String,
}

/// Outcome reported back to the invoking platform for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// Human-readable outcome message.
    pub message: String,
    /// HTTP-style status: 200 handled-or-ignored, 400 malformed path,
    /// 500 load failure.
    pub status: u16,
}

impl EventOutcome {
    fn handled(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 200,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 400,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 500,
        }
    }
}

/// Classifies storage events and runs the per-file load unit for matches.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    loader: Loader,
}

impl Dispatcher {
    /// Creates a dispatcher over the given loader.
    #[must_use]
    pub fn new(loader: Loader) -> Self {
        Self { loader }
    }

    /// Returns the underlying loader.
    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Handles one storage event.
    ///
    /// A path matching no known family is a no-op (200), a most-popular
    /// path without an extractable date is a reported failure (400, the
    /// platform must not redeliver it), and any load failure surfaces as
    /// 500 for the platform's retry policy.
    pub async fn handle(&self, event: &StorageEvent) -> EventOutcome {
        let config = self.loader.config();
        info!(bucket = %event.bucket, name = %event.name, "received storage event");

        // The storage handle is bound to one bucket at startup; an event for
        // another bucket would read the wrong object.
        if event.bucket != config.bucket {
            warn!(
                event_bucket = %event.bucket,
                configured_bucket = %config.bucket,
                "event bucket differs from configured bucket"
            );
        }

        let file = match classify(&config.root_prefix, &event.name) {
            Ok(Classification::File(file)) => file,
            Ok(Classification::Ignored) => {
                info!(name = %event.name, "ignoring file outside known prefixes");
                return EventOutcome::handled("file ignored (not a recognized prefix)");
            }
            Err(error) => {
                error!(name = %event.name, %error, "could not classify path");
                return EventOutcome::bad_request("invalid most_popular path format");
            }
        };

        match self.loader.load_file(&file).await {
            Ok(_) => EventOutcome::handled(format!("{} loaded successfully", file.family)),
            Err(error @ LoadError::MalformedPath(_)) => {
                error!(name = %event.name, %error, "cannot load file without path metadata");
                EventOutcome::bad_request("invalid most_popular path format")
            }
            Err(error) => {
                error!(name = %event.name, %error, "error processing event");
                EventOutcome::failed(format!("error: {error}"))
            }
        }
    }
}
