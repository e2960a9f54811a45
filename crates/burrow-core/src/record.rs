use crate::error::CoreError;
use crate::token::ShortToken;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Lifecycle state of a link. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Created,
    Deleted,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Created => "created",
            LinkStatus::Deleted => "deleted",
        }
    }
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(LinkStatus::Created),
            "deleted" => Ok(LinkStatus::Deleted),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A stored link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The short token the link resolves through.
    pub token: ShortToken,
    /// The URL that was shortened.
    pub original_url: String,
    /// Opaque identifier of the user that created the link.
    pub owner_id: String,
    pub status: LinkStatus,
}

impl LinkRecord {
    /// Creates a live record.
    pub fn new(
        token: ShortToken,
        original_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            token,
            original_url: original_url.into(),
            owner_id: owner_id.into(),
            status: LinkStatus::Created,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status == LinkStatus::Deleted
    }
}
