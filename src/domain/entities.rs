//! Domain entities: core data structures

use std::fmt;

use serde::Serialize;

/// A member of the network.
///
/// Tree position and graph edges live in the registry; the user only carries
/// its profile and interaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    /// Opaque reference to a profile picture (path, URL, ...)
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    /// Append-only, in insertion order
    interactions: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_image: None,
            bio: None,
            interactions: Vec::new(),
        }
    }

    pub fn add_interaction(&mut self, text: impl Into<String>) {
        self.interactions.push(text.into());
    }

    pub fn interactions(&self) -> &[String] {
        &self.interactions
    }

    /// Apply image and bio replacements. Renaming is handled by the registry
    /// because the name is the key of the tree and graph as well.
    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        if let Some(image) = update.profile_image() {
            self.profile_image = Some(image.to_string());
        }
        if let Some(bio) = update.bio() {
            self.bio = Some(bio.to_string());
        }
    }
}

/// Requested profile changes.
///
/// Absent or blank fields mean "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_profile_image(mut self, image: impl Into<String>) -> Self {
        self.profile_image = Some(image.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name).map(str::trim)
    }

    pub fn profile_image(&self) -> Option<&str> {
        non_blank(&self.profile_image)
    }

    pub fn bio(&self) -> Option<&str> {
        non_blank(&self.bio)
    }

    pub fn is_empty(&self) -> bool {
        self.name().is_none() && self.profile_image().is_none() && self.bio().is_none()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Snapshot of a user and its tree position, as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub name: String,
    pub parent: Option<String>,
    /// In insertion order
    pub children: Vec<String>,
    pub interactions: Vec<String>,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User: {}", self.name)?;
        writeln!(f, "Parent: {}", self.parent.as_deref().unwrap_or("none"))?;
        writeln!(f, "Children: [{}]", self.children.join(", "))?;
        if let Some(image) = &self.profile_image {
            writeln!(f, "Profile image: {}", image)?;
        }
        if let Some(bio) = &self.bio {
            writeln!(f, "Bio: {}", bio)?;
        }
        write!(f, "Interactions: {:?}", self.interactions)
    }
}

/// Result of a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Inserted without a parent
    Root,
    /// Attached below an existing user
    Child { parent: String },
    /// Parent was requested but unknown; inserted as a root instead
    Fallback { reason: super::DomainError },
}

impl InsertOutcome {
    /// The degraded-path condition to report, if any.
    pub fn warning(&self) -> Option<&super::DomainError> {
        match self {
            InsertOutcome::Fallback { reason } => Some(reason),
            _ => None,
        }
    }
}

/// What a removal changed in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub name: String,
    /// Parent of the removed user; `None` if it was a root
    pub former_parent: Option<String>,
    /// Children that were moved to `former_parent` (or became roots)
    pub relocated: Vec<String>,
}

/// Mean polarity for one user; `score` is `None` when there is nothing to score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSentiment {
    pub name: String,
    pub score: Option<f64>,
}
