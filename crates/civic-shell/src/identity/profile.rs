//! Citizen profiles and the roster.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payload::ImagePayload;

/// Unique identifier of a citizen profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A citizen identity that drives personalization across modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenProfile {
    pub id: ProfileId,
    /// Display name
    pub name: String,
    /// Role label ("Warga", "Ketua RT", ...)
    pub role: String,
    /// Seed for the deterministic placeholder avatar
    pub avatar_seed: String,
    /// Photo set by capture or upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<ImagePayload>,
}

impl CitizenProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        avatar_seed: impl Into<String>,
    ) -> Self {
        Self {
            id: ProfileId::new(id),
            name: name.into(),
            role: role.into(),
            avatar_seed: avatar_seed.into(),
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: ImagePayload) -> Self {
        self.photo = Some(photo);
        self
    }

    /// Image source for this profile: the photo when present, otherwise the
    /// seeded placeholder under `placeholder_base`.
    pub fn avatar_url(&self, placeholder_base: &str) -> String {
        match &self.photo {
            Some(photo) => photo.as_str().to_string(),
            None => format!("{placeholder_base}?seed={}", self.avatar_seed),
        }
    }
}

/// Roster validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,
    #[error("duplicate profile id {0} in roster")]
    DuplicateId(ProfileId),
}

/// Immutable list of switchable profiles, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    profiles: Vec<CitizenProfile>,
}

impl Roster {
    /// Build a roster; ids must be unique and the list non-empty.
    pub fn new(profiles: Vec<CitizenProfile>) -> Result<Self, RosterError> {
        if profiles.is_empty() {
            return Err(RosterError::Empty);
        }
        let mut seen = HashSet::with_capacity(profiles.len());
        for profile in &profiles {
            if !seen.insert(&profile.id) {
                return Err(RosterError::DuplicateId(profile.id.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, id: &ProfileId) -> Option<&CitizenProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        self.get(id).is_some()
    }

    /// First profile, the default when none is configured.
    pub fn first(&self) -> &CitizenProfile {
        // Non-empty by construction.
        &self.profiles[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CitizenProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let profiles = Vec::<CitizenProfile>::deserialize(deserializer)?;
        Roster::new(profiles).map_err(serde::de::Error::custom)
    }
}
