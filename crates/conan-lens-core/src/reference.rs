//! Recipe references: `name/version[@user[/channel]][#revision]`.
//!
//! A [`ReferenceRecord`] is the unit every other module consumes. It is
//! produced by the registry for a search pattern and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder some remotes use for an absent user or channel.
const ABSENT: &str = "_";

/// A recipe reference as enumerated by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Recipe revision.
    #[serde(default)]
    pub revision: Option<String>,
    /// Upload time in seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: Option<f64>,
}

/// Grouping identity of a reference: `(name, version, user, channel, revision)`.
pub type ReferenceKey<'a> = (&'a str, &'a str, Option<&'a str>, Option<&'a str>, Option<&'a str>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reference '{0}': expected name/version[@user[/channel]][#revision]")]
pub struct InvalidReference(pub String);

impl ReferenceRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            user: None,
            channel: None,
            revision: None,
            created_at: None,
        }
    }

    /// Set user and channel; empty strings and `_` count as absent.
    pub fn with_user_channel(mut self, user: Option<String>, channel: Option<String>) -> Self {
        self.user = user.and_then(present);
        self.channel = channel.and_then(present);
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = present(revision.into());
        self
    }

    pub fn with_created_at(mut self, created_at: f64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn key(&self) -> ReferenceKey<'_> {
        (
            &self.name,
            &self.version,
            self.user.as_deref(),
            self.channel.as_deref(),
            self.revision.as_deref(),
        )
    }

    /// Canonical recipe form without revision, e.g. `zlib/1.3@acme/stable`.
    pub fn path(&self) -> String {
        self.to_string()
    }

    /// [`Self::path`] followed by `#revision` when the revision is known.
    pub fn full_path(&self) -> String {
        match &self.revision {
            Some(revision) => format!("{self}#{revision}"),
            None => self.to_string(),
        }
    }

    /// Path of one binary of this recipe: `recipe:package_id`.
    pub fn binary_path(&self, package_id: &str) -> String {
        format!("{self}:{package_id}")
    }
}

impl fmt::Display for ReferenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(user) = &self.user {
            write!(f, "@{user}")?;
            if let Some(channel) = &self.channel {
                write!(f, "/{channel}")?;
            }
        } else if let Some(channel) = &self.channel {
            write!(f, "@{ABSENT}/{channel}")?;
        }
        Ok(())
    }
}

impl FromStr for ReferenceRecord {
    type Err = InvalidReference;

    /// Parses `name/version[@user[/channel]][#revision[%timestamp]]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidReference(s.to_owned());
        let text = s.trim();

        let (body, revision) = match text.split_once('#') {
            Some((body, revision)) => (body, Some(revision)),
            None => (text, None),
        };
        let (name_version, user_channel) = match body.split_once('@') {
            Some((nv, uc)) => (nv, Some(uc)),
            None => (body, None),
        };
        let (name, version) = name_version.split_once('/').ok_or_else(invalid)?;
        if name.is_empty() || version.is_empty() || version.contains('/') {
            return Err(invalid());
        }

        let (user, channel) = match user_channel {
            Some(uc) => match uc.split_once('/') {
                Some((user, channel)) => (present(user.to_owned()), present(channel.to_owned())),
                None => (present(uc.to_owned()), None),
            },
            None => (None, None),
        };

        let mut reference = Self::new(name, version);
        reference.user = user;
        reference.channel = channel;
        if let Some(revision) = revision {
            let (revision, timestamp) = match revision.split_once('%') {
                Some((revision, timestamp)) => (revision, Some(timestamp)),
                None => (revision, None),
            };
            reference.revision = present(revision.to_owned());
            reference.created_at = timestamp.and_then(|t| t.parse().ok());
        }
        Ok(reference)
    }
}

fn present(value: String) -> Option<String> {
    if value.is_empty() || value == ABSENT {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name_and_version() {
        let r: ReferenceRecord = "zlib/1.3".parse().unwrap();
        assert_eq!(r.name, "zlib");
        assert_eq!(r.version, "1.3");
        assert_eq!(r.user, None);
        assert_eq!(r.channel, None);
        assert_eq!(r.revision, None);
    }

    #[test]
    fn parses_user_channel_revision_and_timestamp() {
        let r: ReferenceRecord = "fmt/10.2.1@acme/stable#abc123%1700000000.5".parse().unwrap();
        assert_eq!(r.user.as_deref(), Some("acme"));
        assert_eq!(r.channel.as_deref(), Some("stable"));
        assert_eq!(r.revision.as_deref(), Some("abc123"));
        assert_eq!(r.created_at, Some(1_700_000_000.5));
    }

    #[test]
    fn underscore_placeholders_mean_absent() {
        let r: ReferenceRecord = "zlib/1.3@_/_".parse().unwrap();
        assert_eq!(r.user, None);
        assert_eq!(r.channel, None);
        assert_eq!(r.path(), "zlib/1.3");
    }

    #[test]
    fn rejects_missing_version() {
        assert!("zlib".parse::<ReferenceRecord>().is_err());
        assert!("zlib/".parse::<ReferenceRecord>().is_err());
        assert!("/1.0".parse::<ReferenceRecord>().is_err());
    }

    #[test]
    fn path_omits_revision_but_full_path_keeps_it() {
        let r = ReferenceRecord::new("boost", "1.84.0")
            .with_user_channel(Some("acme".into()), Some("testing".into()))
            .with_revision("deadbeef");
        assert_eq!(r.path(), "boost/1.84.0@acme/testing");
        assert_eq!(r.full_path(), "boost/1.84.0@acme/testing#deadbeef");
        assert_eq!(r.binary_path("pkg1"), "boost/1.84.0@acme/testing:pkg1");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let r = ReferenceRecord::new("openssl", "3.2.0")
            .with_user_channel(Some("corp".into()), None)
            .with_revision("r1");
        let parsed: ReferenceRecord = r.full_path().parse().unwrap();
        assert_eq!(parsed, r);
    }
}
