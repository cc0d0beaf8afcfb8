use std::fmt;

use serde::{Deserialize, Serialize};

/// A mutation the reconciler performs on the destination calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Create,
    Delete,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Create => "+",
            ChangeKind::Delete => "-",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}
