//! Run configuration.
//!
//! Settings come from an optional TOML file overlaid by environment
//! variables. Both use the same flat, lowercase keys (`nc_url`,
//! `sync_next_x_days`, ...). Everything is validated up front so that a
//! misconfiguration fails before any network call.

use std::path::Path;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::error::{SyncError, SyncResult};
use crate::identity::FALLBACK_ID_HASH_SEED;
use crate::policy::{DEFAULT_WORK_PREFIX, Policy, SubjectPattern};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Vienna;

/// Settings exactly as read, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    nc_url: Option<String>,
    nc_username: Option<String>,
    nc_password: Option<String>,
    nc_calendar_name: Option<String>,
    ews_host: Option<String>,
    ews_username: Option<String>,
    ews_password: Option<String>,
    sync_next_x_days: Option<String>,
    id_hash_seed: Option<String>,
    subject_passthrough_re: Option<String>,
    subject_ignore_re: Option<String>,
    work_prefix: Option<String>,
    default_timezone: Option<String>,
}

/// CalDAV server holding the surrogate calendar.
#[derive(Clone)]
pub struct DestinationSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub calendar_name: String,
}

/// Exchange server events are read from.
#[derive(Clone)]
pub struct SourceSettings {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Validated settings for one run.
#[derive(Clone)]
pub struct Settings {
    pub destination: DestinationSettings,
    pub source: SourceSettings,
    pub sync_days: u32,
    pub timezone: Tz,
    pub policy: Policy,
}

impl Settings {
    /// Load from `file` (if given) and the process environment.
    pub fn load(file: Option<&Path>) -> SyncResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder.add_source(Environment::default()).build()?;

        config.try_deserialize::<RawSettings>()?.validate()
    }

    /// Load from an explicit set of variables instead of the environment.
    pub fn from_vars<I, K, V>(vars: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let config = Config::builder()
            .add_source(Environment::default().source(Some(vars)))
            .build()?;

        config.try_deserialize::<RawSettings>()?.validate()
    }
}

impl RawSettings {
    fn validate(self) -> SyncResult<Settings> {
        let destination = DestinationSettings {
            url: required("nc_url", self.nc_url)?,
            username: required("nc_username", self.nc_username)?,
            password: required("nc_password", self.nc_password)?,
            calendar_name: required("nc_calendar_name", self.nc_calendar_name)?,
        };

        let source = SourceSettings {
            host: required("ews_host", self.ews_host)?,
            username: required("ews_username", self.ews_username)?,
            password: required("ews_password", self.ews_password)?,
        };

        let sync_days = required("sync_next_x_days", self.sync_next_x_days)?
            .trim()
            .parse::<u32>()
            .map_err(|e| SyncError::InvalidSetting {
                key: "sync_next_x_days",
                reason: e.to_string(),
            })?;

        let timezone = match optional(self.default_timezone) {
            Some(name) => name.parse::<Tz>().map_err(|e| SyncError::InvalidSetting {
                key: "default_timezone",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let id_hash_seed = optional(self.id_hash_seed).unwrap_or_else(|| {
            warn!("id_hash_seed is not set, falling back to the public default seed");
            FALLBACK_ID_HASH_SEED.to_string()
        });

        let policy = Policy {
            passthrough: optional(self.subject_passthrough_re)
                .map(|p| SubjectPattern::new("subject_passthrough_re", &p))
                .transpose()?,
            ignore: optional(self.subject_ignore_re)
                .map(|p| SubjectPattern::new("subject_ignore_re", &p))
                .transpose()?,
            work_prefix: optional(self.work_prefix)
                .unwrap_or_else(|| DEFAULT_WORK_PREFIX.to_string()),
            id_hash_seed: id_hash_seed.into_bytes(),
        };

        Ok(Settings {
            destination,
            source,
            sync_days,
            timezone,
            policy,
        })
    }
}

/// Empty values count as unset.
fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(key: &'static str, value: Option<String>) -> SyncResult<String> {
    optional(value).ok_or(SyncError::MissingSetting(key))
}
