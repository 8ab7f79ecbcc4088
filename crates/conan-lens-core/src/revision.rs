//! Recipe revision resolution.
//!
//! Revisions are ordered as plain strings, descending. This is not timestamp
//! or semver aware: `"2"` sorts above `"10"`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::reference::ReferenceRecord;

/// A de-duplicated, descending list of revision identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRevisions {
    revisions: Vec<String>,
}

impl ResolvedRevisions {
    /// Sort and de-duplicate `revisions`; empty identifiers are dropped.
    pub fn from_revisions<I, S>(revisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = revisions
            .into_iter()
            .map(Into::into)
            .filter(|revision| !revision.is_empty())
            .collect();
        Self {
            revisions: unique.into_iter().rev().collect(),
        }
    }

    pub fn latest(&self) -> Option<&str> {
        self.revisions.first().map(String::as_str)
    }

    /// The revision a request targets: `explicit` verbatim when given,
    /// otherwise [`Self::latest`]. An explicit revision is not checked
    /// against the resolved set.
    pub fn target<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .filter(|revision| !revision.is_empty())
            .or_else(|| self.latest())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.revisions
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.revisions
    }
}

/// Revisions, users and channels seen across the references of one
/// `(name, version)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RevisionInfo {
    pub recipe_revisions: Vec<String>,
    pub users: Vec<String>,
    pub channels: Vec<String>,
    pub latest_revision: Option<String>,
}

impl RevisionInfo {
    pub fn collect<'a, I>(references: I) -> Self
    where
        I: IntoIterator<Item = &'a ReferenceRecord>,
    {
        let mut revisions = Vec::new();
        let mut users = BTreeSet::new();
        let mut channels = BTreeSet::new();

        for reference in references {
            if let Some(revision) = reference.revision.as_deref() {
                revisions.push(revision);
            }
            if let Some(user) = reference.user.as_deref().filter(|u| !u.is_empty()) {
                users.insert(user.to_owned());
            }
            if let Some(channel) = reference.channel.as_deref().filter(|c| !c.is_empty()) {
                channels.insert(channel.to_owned());
            }
        }

        let resolved = ResolvedRevisions::from_revisions(revisions);
        Self {
            latest_revision: resolved.latest().map(str::to_owned),
            recipe_revisions: resolved.into_vec(),
            users: users.into_iter().collect(),
            channels: channels.into_iter().collect(),
        }
    }
}
