//! Subject policy applied while projecting source events.

use regex::Regex;

use crate::error::{SyncError, SyncResult};
use crate::identity::FALLBACK_ID_HASH_SEED;

pub const DEFAULT_WORK_PREFIX: &str = "work";

/// A subject regex that only matches at the start of the subject.
#[derive(Debug, Clone)]
pub struct SubjectPattern {
    source: String,
    regex: Regex,
}

impl SubjectPattern {
    /// Compile `pattern`. `key` names the setting in the error on failure.
    pub fn new(key: &'static str, pattern: &str) -> SyncResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            SyncError::InvalidSetting {
                key,
                reason: e.to_string(),
            }
        })?;

        Ok(SubjectPattern {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern text as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches_start(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

/// Immutable per-run projection policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub passthrough: Option<SubjectPattern>,
    pub ignore: Option<SubjectPattern>,
    pub work_prefix: String,
    pub id_hash_seed: Vec<u8>,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            passthrough: None,
            ignore: None,
            work_prefix: DEFAULT_WORK_PREFIX.to_string(),
            id_hash_seed: FALLBACK_ID_HASH_SEED.as_bytes().to_vec(),
        }
    }
}

impl Policy {
    /// Whether a source event with this subject is dropped entirely.
    ///
    /// Absent or empty subjects are never ignored.
    pub fn is_ignored(&self, subject: Option<&str>) -> bool {
        match (&self.ignore, subject) {
            (Some(pattern), Some(subject)) if !subject.is_empty() => {
                pattern.matches_start(subject)
            }
            _ => false,
        }
    }

    /// The subject shown on the destination calendar.
    pub fn public_subject(&self, subject: Option<&str>) -> String {
        match (&self.passthrough, subject) {
            (Some(pattern), Some(subject)) if !subject.is_empty() && pattern.matches_start(subject) => {
                format!("{}: {}", self.work_prefix, subject)
            }
            _ => format!("{} appointment", self.work_prefix),
        }
    }

    /// Identity component describing the passthrough policy.
    pub fn passthrough_component(&self) -> String {
        match &self.passthrough {
            Some(pattern) => format!("passthrough:{}", pattern.as_str()),
            None => "passthrough:none".to_string(),
        }
    }
}
