//! Named adjustments layered on top of the blended score.

use core::fmt;

/// Key of a modifier. Empty ids are anonymous and only removable by handle.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<anonymous>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Multiplicative and additive adjustment pushed by an ability or effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StealthModifier {
    pub source_id: SourceId,
    pub light_multiplier: f32,
    pub visibility_multiplier: f32,
    pub light_offset01: f32,
    pub global_score_offset01: f32,
}

impl StealthModifier {
    pub fn new(source_id: impl Into<SourceId>) -> Self {
        Self {
            source_id: source_id.into(),
            light_multiplier: 1.0,
            visibility_multiplier: 1.0,
            light_offset01: 0.0,
            global_score_offset01: 0.0,
        }
    }

    pub fn with_light_multiplier(mut self, multiplier: f32) -> Self {
        self.light_multiplier = multiplier;
        self
    }

    pub fn with_visibility_multiplier(mut self, multiplier: f32) -> Self {
        self.visibility_multiplier = multiplier;
        self
    }

    pub fn with_light_offset(mut self, offset01: f32) -> Self {
        self.light_offset01 = offset01;
        self
    }

    pub fn with_score_offset(mut self, offset01: f32) -> Self {
        self.global_score_offset01 = offset01;
        self
    }
}

impl Default for StealthModifier {
    fn default() -> Self {
        Self::new(SourceId::anonymous())
    }
}
