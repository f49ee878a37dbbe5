//! How a caller identifies stations and sampling sites.
//!
//! Both the observed-levels and chemistry services key records by a site
//! code (`platsbeteckning`) and also carry a human-readable name. Exactly
//! one of the two is used per lookup, so the choice is an enum rather than
//! two optional arguments.

use crate::ClientError;
use crate::query::{eq_filter, in_filter};

/// Field holding the site code in every service.
pub const CODE_FIELD: &str = "platsbeteckning";

/// One station or site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationName {
    /// The site code, e.g. `"95_2"`.
    Code(String),
    /// The human-readable name, e.g. `"Lagga_2"`.
    Name(String),
}

/// Sampling sites are identified the same way.
pub type SiteName = StationName;

impl StationName {
    #[must_use]
    pub fn code(code: &str) -> Self {
        Self::Code(code.to_owned())
    }

    #[must_use]
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_owned())
    }

    /// CQL equality filter; `name_field` is the service's name column.
    #[must_use]
    pub fn filter(&self, name_field: &str) -> String {
        match self {
            Self::Code(code) => eq_filter(CODE_FIELD, code),
            Self::Name(name) => eq_filter(name_field, name),
        }
    }
}

/// Several stations or sites, all identified the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationNames {
    Codes(Vec<String>),
    Names(Vec<String>),
}

/// Sampling sites are identified the same way.
pub type SiteNames = StationNames;

impl StationNames {
    pub fn codes<S: AsRef<str>>(codes: &[S]) -> Self {
        Self::Codes(codes.iter().map(|c| c.as_ref().to_owned()).collect())
    }

    pub fn names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::Names(names.iter().map(|n| n.as_ref().to_owned()).collect())
    }

    /// CQL `in` filter; `name_field` is the service's name column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] if the list is empty.
    pub fn filter(&self, name_field: &str) -> Result<String, ClientError> {
        let (field, values) = match self {
            Self::Codes(codes) => (CODE_FIELD, codes),
            Self::Names(names) => (name_field, names),
        };
        if values.is_empty() {
            return Err(ClientError::InvalidArgument(format!(
                "at least one '{field}' value must be provided"
            )));
        }
        Ok(in_filter(field, values))
    }
}
