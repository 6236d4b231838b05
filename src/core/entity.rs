//! Entity trait - common interface for all record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::RECORD_SUFFIX;

/// Common trait for all corpweb records
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix
    const PREFIX: EntityPrefix;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Display name (company name, issue text, ...)
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;

    /// File name the record is stored under
    fn file_name(&self) -> String {
        format!("{}{}", self.id(), RECORD_SUFFIX)
    }
}

pub(crate) fn default_revision() -> u32 {
    1
}
