//! Single-feature lookups.
//!
//! Item and name lookups are expected to match exactly one feature. Zero
//! matches is [`ClientError::NotFound`]; several is
//! [`ClientError::MultipleReturned`], which points at an upstream anomaly
//! rather than a missing record.

use groundwater_models::{Feature, FeatureCollection};

use crate::ClientError;

/// What a lookup was searching for, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// An `items/{id}` request.
    Id {
        /// Singular noun, e.g. `"Station"`.
        kind: &'a str,
        id: &'a str,
    },
    /// A filtered collection request.
    Filter {
        /// Plural noun, e.g. `"stations"`.
        kind: &'a str,
        filter: &'a str,
    },
}

impl Target<'_> {
    fn not_found(&self) -> String {
        match self {
            Self::Id { kind, id } => format!("{kind} {id} not found"),
            Self::Filter { kind, filter } => format!("No {kind} found for {filter}"),
        }
    }

    fn multiple(&self, count: usize) -> String {
        match self {
            Self::Id { kind, id } => {
                format!("Multiple features ({count}) returned for {kind} ID {id}")
            }
            Self::Filter { kind, filter } => {
                format!("Multiple {kind} ({count}) found for {filter}")
            }
        }
    }
}

/// Unwraps the only feature of a collection.
///
/// # Errors
///
/// Returns [`ClientError::NotFound`] for an empty collection and
/// [`ClientError::MultipleReturned`] for more than one feature.
pub fn exactly_one<P>(
    collection: FeatureCollection<P>,
    target: Target<'_>,
) -> Result<Feature<P>, ClientError> {
    let count = collection.len();
    let mut features = collection.into_iter();
    match (features.next(), count) {
        (None, _) => Err(ClientError::NotFound(target.not_found())),
        (Some(feature), 1) => Ok(feature),
        (Some(_), n) => Err(ClientError::MultipleReturned(target.multiple(n))),
    }
}
