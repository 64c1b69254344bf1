use serde::{Deserialize, Serialize};

/// Value of a style layer's `visibility` layout property.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

impl Visibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    /// Parse a layout value; anything other than `"none"` renders, matching
    /// how the rendering engine treats unknown values.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("none") {
            Visibility::None
        } else {
            Visibility::Visible
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
