//! Target namespace for an operation: a database plus collection pair.

use std::fmt;

use crate::error::{QuillError, Result};

/// Identifies a target collection as a database name plus collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Creates a namespace, validating that both parts are usable on the wire.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let collection = collection.into();

        if database.is_empty() {
            return Err(QuillError::Configuration(
                "database name must not be empty".to_string(),
            ));
        }
        if collection.is_empty() {
            return Err(QuillError::Configuration(
                "collection name must not be empty".to_string(),
            ));
        }
        if database.contains('\0') || collection.contains('\0') {
            return Err(QuillError::Configuration(
                "namespace must not contain NUL bytes".to_string(),
            ));
        }
        if database.contains('.') {
            return Err(QuillError::Configuration(format!(
                "database name must not contain '.': {:?}",
                database
            )));
        }

        Ok(Self {
            database,
            collection,
        })
    }

    /// Returns the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the full `database.collection` name used on the wire.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}
