//! Reference search patterns.
//!
//! Grammar: `name[/version][@user[/channel]][#revision][:package[#package_revision]]`.
//! Every component is a glob (`*`, `?`, `[...]`) matched case-insensitively.
//!
//! - A missing version matches every version.
//! - Without an `@` section user and channel are unconstrained; with one, an
//!   absent user or channel is matched as the empty string, and a missing
//!   channel glob matches any channel.
//! - The recipe revision is `latest` or a glob. Without one the recipe is
//!   unpinned: each recipe is listed once without a revision, and a `:`
//!   section lists the binaries of its latest revision.
//! - A `:` section asks for the binaries of each reference as well. A
//!   package revision part (`:*#*`) also asks for their revisions; its value
//!   is not matched.

use std::fmt;
use std::str::FromStr;

use glob::{MatchOptions, Pattern};
use thiserror::Error;

use crate::reference::ReferenceRecord;

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search pattern '{pattern}': {reason}")]
pub struct InvalidPattern {
    pub pattern: String,
    pub reason: String,
}

/// Which recipe revisions of a reference a search returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RevisionSelector {
    /// No revision asked for.
    #[default]
    Unpinned,
    Latest,
    Matching(Pattern),
}

impl RevisionSelector {
    pub fn matches(&self, revision: Option<&str>) -> bool {
        match self {
            RevisionSelector::Unpinned | RevisionSelector::Latest => true,
            RevisionSelector::Matching(glob) => {
                glob.matches_with(revision.unwrap_or_default(), MATCH)
            }
        }
    }
}

/// A parsed search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPattern {
    raw: String,
    name: Pattern,
    version: Pattern,
    user: Option<Pattern>,
    channel: Option<Pattern>,
    revision: RevisionSelector,
    packages: Option<Pattern>,
    package_revisions: bool,
}

impl ListPattern {
    /// Every recipe whose name contains `query`; every recipe when it is empty.
    pub fn recipes_containing(query: &str) -> Self {
        let expression = if query.is_empty() {
            "*".to_owned()
        } else {
            format!("*{}*", Pattern::escape(query))
        };
        Self::parse_escaped(expression)
    }

    /// Every version of `name`, with binaries.
    pub fn versions_of(name: &str) -> Self {
        Self::parse_escaped(format!("{}/*:*", Pattern::escape(name)))
    }

    /// Every variant and revision of `name/version`, with binaries.
    pub fn binaries_of(name: &str, version: &str) -> Self {
        Self::parse_escaped(format!(
            "{}/{}@*#*:*#*",
            Pattern::escape(name),
            Pattern::escape(version)
        ))
    }

    // Escaped literals always compile.
    fn parse_escaped(expression: String) -> Self {
        expression
            .parse()
            .unwrap_or_else(|_| Self::any_recipe(expression))
    }

    fn any_recipe(raw: String) -> Self {
        Self {
            raw,
            name: any(),
            version: any(),
            user: None,
            channel: None,
            revision: RevisionSelector::Unpinned,
            packages: None,
            package_revisions: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn revision(&self) -> &RevisionSelector {
        &self.revision
    }

    pub fn includes_packages(&self) -> bool {
        self.packages.is_some()
    }

    /// Name, version, user and channel; the revision is judged separately
    /// through [`Self::revision`].
    pub fn matches_recipe(&self, reference: &ReferenceRecord) -> bool {
        if !self.name.matches_with(&reference.name, MATCH)
            || !self.version.matches_with(&reference.version, MATCH)
        {
            return false;
        }
        let component = |glob: &Option<Pattern>, value: &Option<String>| match glob {
            Some(glob) => glob.matches_with(value.as_deref().unwrap_or_default(), MATCH),
            None => true,
        };
        component(&self.user, &reference.user) && component(&self.channel, &reference.channel)
    }

    pub fn includes_package_revisions(&self) -> bool {
        self.package_revisions
    }

    pub fn matches_package(&self, package_id: &str) -> bool {
        self.packages
            .as_ref()
            .is_some_and(|glob| glob.matches_with(package_id, MATCH))
    }

    /// The recipe part in the form remote search endpoints accept:
    /// `name/version[@user/channel]`. A `@*/*` section is left out since
    /// remotes do not match it against references without user and channel.
    pub fn search_expression(&self) -> String {
        let mut expression = format!("{}/{}", self.name, self.version);
        let user = self.user.as_ref().map_or("*", Pattern::as_str);
        let channel = self.channel.as_ref().map_or("*", Pattern::as_str);
        if user != "*" || channel != "*" {
            expression.push_str(&format!("@{user}/{channel}"));
        }
        expression
    }
}

fn any() -> Pattern {
    Pattern::new("*").unwrap_or_default()
}

impl FromStr for ListPattern {
    type Err = InvalidPattern;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| InvalidPattern {
            pattern: raw.to_owned(),
            reason,
        };
        let compile = |glob: &str| Pattern::new(glob).map_err(|e| invalid(e.to_string()));

        let raw_trimmed = raw.trim();
        if raw_trimmed.is_empty() {
            return Err(invalid("pattern is empty".into()));
        }

        let (recipe, package) = match raw_trimmed.split_once(':') {
            Some((recipe, package)) => (recipe, Some(package)),
            None => (raw_trimmed, None),
        };
        let (recipe, revision) = match recipe.split_once('#') {
            Some((recipe, revision)) => (recipe, Some(revision)),
            None => (recipe, None),
        };
        let (name_version, user_channel) = match recipe.split_once('@') {
            Some((name_version, user_channel)) => (name_version, Some(user_channel)),
            None => (recipe, None),
        };
        let (name, version) = name_version
            .split_once('/')
            .unwrap_or((name_version, "*"));
        if name.is_empty() {
            return Err(invalid("name is empty".into()));
        }

        let (user, channel) = match user_channel {
            Some(user_channel) => {
                let (user, channel) = user_channel.split_once('/').unwrap_or((user_channel, "*"));
                (Some(compile(user)?), Some(compile(channel)?))
            }
            None => (None, None),
        };

        let revision = match revision {
            None | Some("") => RevisionSelector::Unpinned,
            Some(revision) if revision.eq_ignore_ascii_case("latest") => RevisionSelector::Latest,
            Some(revision) => RevisionSelector::Matching(compile(revision)?),
        };

        let (packages, package_revisions) = match package {
            Some(package) => {
                let (id, revision) = match package.split_once('#') {
                    Some((id, _)) => (id, true),
                    None => (package, false),
                };
                (Some(compile(if id.is_empty() { "*" } else { id })?), revision)
            }
            None => (None, false),
        };

        Ok(Self {
            raw: raw_trimmed.to_owned(),
            name: compile(name)?,
            version: compile(if version.is_empty() { "*" } else { version })?,
            user,
            channel,
            revision,
            packages,
            package_revisions,
        })
    }
}

impl fmt::Display for ListPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
