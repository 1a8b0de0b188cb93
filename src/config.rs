//! Report view configuration.

use serde::{Deserialize, Serialize};

use crate::model::traverse::{Direction, DisplayChoices, GroupBy, SortBy};

/// Default label of the root node.
pub const DEFAULT_ROOT_LABEL: &str = "Aggregated Results";

/// How a sealed run is grouped, ordered and labelled when rendered.
///
/// Every field has a default, so a config document only needs the keys it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    /// Package levels to show.
    pub group_by: GroupBy,
    /// Sort key for siblings.
    pub sort_by: SortBy,
    /// Sort direction.
    pub direction: Direction,
    /// Show single-child package chains as one dotted label.
    pub collapse_packages: bool,
    /// Label of the root node.
    pub root_label: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            sort_by: SortBy::default(),
            direction: Direction::default(),
            collapse_packages: true,
            root_label: DEFAULT_ROOT_LABEL.to_string(),
        }
    }
}

impl ViewConfig {
    /// Parse a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set grouping.
    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    /// Set sort key.
    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Set sort direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Enable or disable package chain collapsing.
    pub fn with_collapse_packages(mut self, collapse: bool) -> Self {
        self.collapse_packages = collapse;
        self
    }

    /// Set root label.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Choices handed to the traversal engine.
    pub fn display_choices(&self) -> DisplayChoices {
        DisplayChoices {
            group_by: self.group_by,
            sort_by: self.sort_by,
            direction: self.direction,
            collapse_packages: self.collapse_packages,
        }
    }
}
