//! Content-derived, keyed event identities.
//!
//! Every surrogate event gets an id computed as HMAC-SHA256 over the fields
//! that determine its public content. Unchanged source events therefore map
//! to the same id on every run, and any change to a projected field yields a
//! new id. Keying the hash with a secret seed stops anyone who can read the
//! destination calendar from brute-forcing source subjects out of the UIDs.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::event::format_instant;

type HmacSha256 = Hmac<Sha256>;

/// Well-known seed used when none is configured. Not a secret.
pub const FALLBACK_ID_HASH_SEED: &str = "croup.rang.lathed.spoor.opened.brewed";

const SEPARATOR: &str = "::";

/// The fields an event id is derived from.
#[derive(Debug, Clone, Copy)]
pub struct IdentityInput<'a> {
    pub container: &'a str,
    pub start: &'a DateTime<Utc>,
    pub end: &'a DateTime<Utc>,
    pub subject: &'a str,
    pub public_subject: &'a str,
    /// Additional ordered components, e.g. the passthrough policy
    pub extra: &'a [&'a str],
}

impl IdentityInput<'_> {
    /// The byte string that gets hashed: all components joined with `::`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let start = format_instant(self.start);
        let end = format_instant(self.end);

        let mut parts = vec![
            self.container,
            start.as_str(),
            end.as_str(),
            self.subject,
            self.public_subject,
        ];
        parts.extend_from_slice(self.extra);

        parts.join(SEPARATOR).into_bytes()
    }
}

/// Strategy for turning identity inputs into an event id.
pub trait IdDeriver {
    fn derive(&self, input: &IdentityInput<'_>) -> String;
}

/// HMAC-SHA256 keyed deriver producing 64 lowercase hex characters.
#[derive(Clone)]
pub struct HmacIdDeriver {
    seed: Vec<u8>,
}

impl HmacIdDeriver {
    pub fn new(seed: impl AsRef<[u8]>) -> Self {
        HmacIdDeriver {
            seed: seed.as_ref().to_vec(),
        }
    }
}

impl Default for HmacIdDeriver {
    fn default() -> Self {
        HmacIdDeriver::new(FALLBACK_ID_HASH_SEED)
    }
}

impl std::fmt::Debug for HmacIdDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacIdDeriver").finish_non_exhaustive()
    }
}

impl IdDeriver for HmacIdDeriver {
    fn derive(&self, input: &IdentityInput<'_>) -> String {
        derive_id(input, &self.seed)
    }
}

/// Compute the keyed id for `input`.
pub fn derive_id(input: &IdentityInput<'_>, seed: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(seed).expect("HMAC can take keys of any size");
    mac.update(&input.to_bytes());
    hex::encode(mac.finalize().into_bytes())
}
