//! Resource definitions and the CRUD lifecycle controller

pub mod controller;
pub mod response;

pub use controller::{MutationOutcome, RequestContext, Resource, ResourceController};
pub use response::{ACTION_AVOIDED, Envelope, RestResponse};

use std::fmt;
use std::str::FromStr;

/// The five CRUD operations a resource exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    One,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::One,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::One => "one",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Parse a comma-combined operation list, e.g. `"create,update"`.
    /// Whitespace around names is ignored.
    pub fn parse_list(s: &str) -> Result<Vec<Operation>, UnknownOperation> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation name that matches none of the five CRUD operations
#[derive(Debug, thiserror::Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" | "index" => Ok(Operation::List),
            "one" => Ok(Operation::One),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}
