//! BIP32-style derivation path handling.
//!
//! Paths here are metadata carried alongside device-reported keys; the
//! derivation arithmetic itself happens on the device, never in photon.
//!
//! Reference: https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("derivation path must start with 'm/' or 'M/'")]
    MissingPrefix,

    #[error("invalid path component:: {0}")]
    InvalidComponent(String),
}

/// One level of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathComponent {
    /// Index value, without the hardened offset
    pub index: u32,
    /// Whether this level uses hardened derivation
    pub hardened: bool,
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A parsed derivation path.
///
/// Renders back to the canonical apostrophe form regardless of which
/// hardened marker the input used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    components: Vec<PathComponent>,
}

impl KeyPath {
    /// Parse a derivation path string (e.g. "m/44'/637'/0'/0/0").
    ///
    /// Both `'` and `h` mark hardened levels.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let rest = path
            .strip_prefix("m/")
            .or_else(|| path.strip_prefix("M/"))
            .ok_or(PathError::MissingPrefix)?;

        let mut components = Vec::new();
        for component in rest.split('/') {
            if component.is_empty() {
                continue;
            }

            let (index_str, hardened) = if component.ends_with('\'') || component.ends_with('h') {
                (&component[..component.len() - 1], true)
            } else {
                (component, false)
            };

            let index = index_str
                .parse::<u32>()
                .map_err(|_| PathError::InvalidComponent(component.to_string()))?;

            if index >= (1u32 << 31) {
                return Err(PathError::InvalidComponent(component.to_string()));
            }

            components.push(PathComponent { index, hardened });
        }

        Ok(KeyPath { components })
    }

    /// Get the components of this path.
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Number of levels below the master key.
    pub fn depth(&self) -> usize {
        self.components.len()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

// Paths travel inside device records as plain strings.
impl serde::Serialize for KeyPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for KeyPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        KeyPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
