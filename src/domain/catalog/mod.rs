//! Catalog domain - content items as seen by the entitlement engine.
//!
//! Only the fields that drive access decisions and delivery live here;
//! everything else about an item belongs to the catalog service.

use crate::domain::foundation::{ItemId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who may read an item without an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone gets the full asset.
    Public,

    /// Full asset requires ownership or a live subscription.
    Premium,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Premium => "premium",
        }
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "premium" => Ok(Visibility::Premium),
            other => Err(ValidationError::invalid_format(
                "visibility",
                format!("unknown visibility '{}'", other),
            )),
        }
    }
}

/// Storage-provider reference to an item's asset (public id / object key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(reference: impl Into<String>) -> Result<Self, ValidationError> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(ValidationError::empty_field("content_ref"));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A book-like asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub visibility: Visibility,
    pub content_ref: ContentRef,
    /// Page/unit count, filled lazily from the storage provider.
    pub cached_length: Option<u32>,
}

impl Item {
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        visibility: Visibility,
        content_ref: ContentRef,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            visibility,
            content_ref,
            cached_length: None,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}
