//! Domain models for the label library
//!
//! A [`Label`] is split into an immutable identity component ([`LabelId`])
//! and mutable display attributes (name, color). Equality and hashing look
//! at the identity only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// ID Types
// =============================================================================

/// Canonical label identifier
///
/// Produced by [`LabelId::normalize`]: the name lowercased, with every space
/// and newline replaced by an underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(String);

impl LabelId {
    /// Normalize a display name into an identifier.
    pub fn normalize(name: &str) -> Self {
        let id = name
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '\n' { '_' } else { c })
            .collect();
        Self(id)
    }

    /// Normalize an optional name; a missing name maps to the empty identifier.
    pub fn normalize_opt(name: Option<&str>) -> Self {
        Self::normalize(name.unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LabelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelId {
    fn from(name: &str) -> Self {
        Self::normalize(name)
    }
}

// =============================================================================
// Display Attributes
// =============================================================================

/// RGBA display color of a label chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LabelColor {
    pub const WHITE: LabelColor = LabelColor::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 && digits.len() != 8 {
            return Err(format!("Invalid color '{}': expected 6 or 8 hex digits", hex));
        }

        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("Invalid color '{}': bad hex digits", hex))
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// The same color at half opacity, used for labels not carried by the
    /// current selection.
    pub fn dimmed(&self) -> Self {
        Self::rgba(self.r, self.g, self.b, self.a / 2)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A named tag that can be attached to assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredLabel")]
pub struct Label {
    id: LabelId,
    /// Free-form display name
    pub name: String,
    /// Optional chip color; `None` means the host default
    pub color: Option<LabelColor>,
}

impl Label {
    /// Create a label whose identifier is derived from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: LabelId::normalize(&name),
            name,
            color: None,
        }
    }

    /// Create the label implied by a bare identifier found in a record.
    ///
    /// The display name defaults to the identifier and no color is set.
    pub fn from_identifier(id: &str) -> Self {
        Self::new(id)
    }

    pub fn with_color(mut self, color: LabelColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn id(&self) -> &LabelId {
        &self.id
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// On-disk shape of a label; older containers carry only the name.
#[derive(Deserialize)]
struct StoredLabel {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    color: Option<LabelColor>,
}

impl From<StoredLabel> for Label {
    fn from(stored: StoredLabel) -> Self {
        let id = match stored.id {
            Some(id) => LabelId::normalize(&id),
            None => LabelId::normalize(&stored.name),
        };
        Self {
            id,
            name: stored.name,
            color: stored.color,
        }
    }
}

/// A label together with the asset paths currently carrying it
///
/// Asset paths are unique within an entry and kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub label: Label,
    pub assets: Vec<String>,
}

impl LabelEntry {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            assets: Vec::new(),
        }
    }

    pub fn contains(&self, asset_path: &str) -> bool {
        self.assets.iter().any(|a| a == asset_path)
    }

    /// Add an asset path. Returns `false` if it was already present.
    pub fn insert(&mut self, asset_path: &str) -> bool {
        if self.contains(asset_path) {
            return false;
        }
        self.assets.push(asset_path.to_string());
        true
    }

    /// Remove an asset path. Returns `false` if it was absent.
    pub fn remove(&mut self, asset_path: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a != asset_path);
        self.assets.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize() {
        assert_eq!(LabelId::normalize("Hero Prop").as_str(), "hero_prop");
        assert_eq!(LabelId::normalize("hero_prop").as_str(), "hero_prop");
        assert_eq!(LabelId::normalize("Two\nLines").as_str(), "two_lines");
        assert_eq!(LabelId::normalize("").as_str(), "");
        assert_eq!(LabelId::normalize_opt(None).as_str(), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["Hero Prop", "  Spaced  Out ", "MiXeD\nCase", "ÄÖÜ tag", "a|b", ""] {
            let once = LabelId::normalize(name);
            let twice = LabelId::normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_normalize_leaves_tabs_alone() {
        assert_eq!(LabelId::normalize("a\tb").as_str(), "a\tb");
    }

    #[test]
    fn test_label_equality_ignores_display() {
        let stored = Label::new("Hero Prop").with_color(LabelColor::rgb(255, 0, 0));
        let ad_hoc = Label::new("hero_prop");
        assert_eq!(stored, ad_hoc);

        let mut set = HashSet::new();
        set.insert(stored);
        assert!(set.contains(&ad_hoc));
        assert!(!set.insert(Label::new("HERO PROP")));
    }

    #[test]
    fn test_identity_survives_rename() {
        let mut label = Label::new("Hero Prop");
        label.name = "Villain Prop".to_string();
        assert_eq!(label.id().as_str(), "hero_prop");
        assert_eq!(label, Label::new("hero prop"));
    }

    #[test]
    fn test_from_identifier_defaults() {
        let label = Label::from_identifier("foliage");
        assert_eq!(label.name, "foliage");
        assert_eq!(label.color, None);
    }

    #[test]
    fn test_color_hex() {
        let color = LabelColor::from_hex("#FF8000").unwrap();
        assert_eq!(color, LabelColor::rgb(255, 128, 0));
        assert_eq!(color.to_hex(), "#FF8000FF");
        assert_eq!(
            LabelColor::from_hex("00000080").unwrap(),
            LabelColor::rgba(0, 0, 0, 128)
        );
        assert!(LabelColor::from_hex("#12345").is_err());
        assert!(LabelColor::from_hex("#GG0000").is_err());
        assert_eq!(LabelColor::WHITE.dimmed().a, 127);
    }

    #[test]
    fn test_label_deserialize_derives_id() {
        let label: Label = serde_json::from_str(r#"{"name":"Hero Prop"}"#).unwrap();
        assert_eq!(label.id().as_str(), "hero_prop");
        assert_eq!(label.color, None);

        let label: Label =
            serde_json::from_str(r#"{"id":"hero_prop","name":"Renamed"}"#).unwrap();
        assert_eq!(label.id().as_str(), "hero_prop");
        assert_eq!(label.name, "Renamed");
    }

    #[test]
    fn test_entry_insert_remove() {
        let mut entry = LabelEntry::new(Label::new("tree"));
        assert!(entry.insert("a.png"));
        assert!(!entry.insert("a.png"));
        assert!(entry.insert("b.png"));
        assert_eq!(entry.assets, vec!["a.png", "b.png"]);
        assert!(entry.remove("a.png"));
        assert!(!entry.remove("a.png"));
        assert_eq!(entry.assets, vec!["b.png"]);
    }
}
