//! Declarative level-of-detail policy.

use serde::{Deserialize, Serialize};

use crate::classify::LayerRole;

/// Discrete level of detail. Persisted as its index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodLevel {
    Low,
    Medium,
    #[default]
    High,
}

impl LodLevel {
    pub const ALL: [LodLevel; 3] = [LodLevel::Low, LodLevel::Medium, LodLevel::High];

    pub fn index(self) -> u8 {
        match self {
            LodLevel::Low => 0,
            LodLevel::Medium => 1,
            LodLevel::High => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Accepts an index (`"0"`..`"2"`) or a name (`"low"`, `"medium"`, `"high"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(index) = raw.parse::<u8>() {
            return Self::from_index(index);
        }
        match raw.to_ascii_lowercase().as_str() {
            "low" => Some(LodLevel::Low),
            "medium" | "med" => Some(LodLevel::Medium),
            "high" | "full" => Some(LodLevel::High),
            _ => None,
        }
    }

    /// Level restored at startup from storage; missing or invalid values
    /// fall back to the default (`High`).
    pub fn from_persisted(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LodLevel::Low => "low",
            LodLevel::Medium => "medium",
            LodLevel::High => "high",
        }
    }
}

impl std::fmt::Display for LodLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the policy wants done with one layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Not under detail control.
    Untouched,
    Show,
    Hide,
    /// Put back the visibility first observed for this style instance.
    Restore,
}

impl Directive {
    fn show_if(visible: bool) -> Self {
        if visible { Directive::Show } else { Directive::Hide }
    }
}

/// Policy table for one layer role at one level.
///
/// Roads carrying both major and minor classes count as major so a shared
/// layer never drops motorways.
pub fn directive_for(level: LodLevel, role: LayerRole) -> Directive {
    if level == LodLevel::High {
        return match role {
            LayerRole::Label { .. } | LayerRole::Boundary { .. } | LayerRole::Road { .. } => {
                Directive::Restore
            }
            LayerRole::BuildingExtrusion | LayerRole::Other => Directive::Untouched,
        };
    }

    match (level, role) {
        (LodLevel::Low, LayerRole::Label { .. }) => Directive::Hide,
        (LodLevel::Medium, LayerRole::Label { major_place }) => Directive::show_if(major_place),

        (LodLevel::Low, LayerRole::Boundary { is_country, .. }) => Directive::show_if(is_country),
        (
            LodLevel::Medium,
            LayerRole::Boundary {
                admin_level,
                is_country,
            },
        ) => Directive::show_if(is_country || admin_level.is_some_and(|l| l <= 2)),

        (LodLevel::Low, LayerRole::Road { major, .. }) => Directive::show_if(major),
        (LodLevel::Medium, LayerRole::Road { major, minor }) => Directive::show_if(major || !minor),

        _ => Directive::Untouched,
    }
}
