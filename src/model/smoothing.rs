use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Icon state names produced by the smoothing system that only ship a
/// single direction and need four rotated copies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingSet {
    #[serde(default = "default_smoothing_states")]
    pub names: BTreeSet<String>,
}

impl Default for SmoothingSet {
    fn default() -> Self {
        Self {
            names: default_smoothing_states(),
        }
    }
}

impl SmoothingSet {
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let content = self.to_toml_string().map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

fn default_smoothing_states() -> BTreeSet<String> {
    [
        // Inner corners
        "1-i", "2-i", "3-i", "4-i",
        // Edges
        "1-n", "2-n", "3-s", "4-s", "1-w", "2-e", "3-w", "4-e",
        // Outer corners
        "1-nw", "2-ne", "3-sw", "4-se",
        // Full
        "1-f", "2-f", "3-f", "4-f",
        // Diagonals
        "d-se-0", "d-se-1", "d-se",
        "d-sw-0", "d-sw-1", "d-sw",
        "d-ne-0", "d-ne-1", "d-ne",
        "d-nw-0", "d-nw-1", "d-nw",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
