use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity a client announces in a room. The empty id addresses everyone.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn broadcast() -> Self {
        Self(String::new())
    }

    pub fn is_broadcast(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "<all>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
