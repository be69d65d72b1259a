//! Label search over candidate asset paths.
//!
//! The host supplies candidates (typically a name search through the asset
//! database); the query keeps the ones carrying every required label and
//! attaches the labels each hit carries so a browser can render its chips.

use crate::index::LabelIndex;
use crate::models::{Label, LabelId};
use serde::{Deserialize, Serialize};

/// Default cap on the number of hits a query returns.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Filter applied to candidate asset paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelQuery {
    /// Labels every hit must carry (AND semantics).
    pub required: Vec<LabelId>,
    /// Only return assets carrying at least one label.
    pub require_any_label: bool,
    /// Maximum number of hits.
    pub limit: usize,
}

impl Default for LabelQuery {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            require_any_label: false,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

/// Asset path that passed a [`LabelQuery`], with the labels it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub asset_path: String,
    pub labels: Vec<Label>,
}

impl LabelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` (normalized) on every hit.
    pub fn with_label(mut self, name: &str) -> Self {
        let id = LabelId::normalize(name);
        if !self.required.contains(&id) {
            self.required.push(id);
        }
        self
    }

    pub fn require_any_label(mut self, enabled: bool) -> Self {
        self.require_any_label = enabled;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether the query filters on labels at all.
    pub fn is_label_filtered(&self) -> bool {
        self.require_any_label || !self.required.is_empty()
    }

    /// Whether a single asset path passes the filter.
    pub fn matches(&self, index: &LabelIndex, asset_path: &str) -> bool {
        if self.is_label_filtered() && !index.has_any_label(asset_path) {
            return false;
        }
        self.required.iter().all(|id| {
            index
                .entry(id.as_str())
                .is_some_and(|entry| entry.contains(asset_path))
        })
    }

    /// Filter `candidates` in order, stopping after `limit` hits.
    pub fn apply<I, S>(&self, index: &LabelIndex, candidates: I) -> Vec<SearchHit>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .filter(|path| self.matches(index, path.as_ref()))
            .take(self.limit)
            .map(|path| {
                let asset_path = path.as_ref().to_string();
                let labels = index.labels_of(&asset_path).cloned().collect();
                SearchHit { asset_path, labels }
            })
            .collect()
    }
}
