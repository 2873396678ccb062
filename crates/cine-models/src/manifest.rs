//! Visual manifest: characters, environments and motifs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CharacterId, EnvironmentId, ImageSource, MotifId};

/// A cast member and their reference plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: ImageSource,
}

impl Character {
    /// Create a character whose plate has not been generated yet.
    pub fn pending(
        id: CharacterId,
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            description: description.into(),
            image: ImageSource::Pending,
        }
    }
}

/// A location and its establishing plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    #[serde(default)]
    pub mood: String,
    /// Display colors, in order.
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub image: ImageSource,
}

impl Environment {
    /// Create an environment whose plate has not been generated yet.
    pub fn pending(
        id: EnvironmentId,
        name: impl Into<String>,
        mood: impl Into<String>,
        colors: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            mood: mood.into(),
            colors,
            image: ImageSource::Pending,
        }
    }
}

/// A recurring visual motif. Never mutated after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motif {
    pub id: MotifId,
    pub label: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

/// Which kind of manifest entry an asset plate is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Character,
    Environment,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Character => "character",
            AssetKind::Environment => "environment",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured set of characters, environments and motifs for a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub motifs: Vec<Motif>,
}

impl Manifest {
    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| &c.id == id)
    }

    pub fn environment(&self, id: &EnvironmentId) -> Option<&Environment> {
        self.environments.iter().find(|e| &e.id == id)
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| &c.id == id)
    }

    pub fn environment_mut(&mut self, id: &EnvironmentId) -> Option<&mut Environment> {
        self.environments.iter_mut().find(|e| &e.id == id)
    }
}
