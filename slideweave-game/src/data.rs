use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionList;

/// Slide type tag. Anything other than `"Minigame"` is an ordinary slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SlideKind {
    Minigame,
    #[default]
    #[serde(other)]
    Ordinary,
}

/// A clickable button on a slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ButtonDef {
    /// Initial visibility, only read when the catalog seeds game state
    #[serde(rename = "Visible", default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(rename = "Actions", default)]
    pub actions: ActionList,
}

/// A slide in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SlideDef {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SlideKind>,
    #[serde(rename = "Buttons", default)]
    pub buttons: IndexMap<String, ButtonDef>,
    #[serde(rename = "FallbackSlide", default, skip_serializing_if = "Option::is_none")]
    pub fallback_slide: Option<String>,
}

impl SlideDef {
    /// Effective type; an absent or null tag means ordinary.
    #[must_use]
    pub fn kind(&self) -> SlideKind {
        self.kind.unwrap_or_default()
    }

    #[must_use]
    pub fn is_minigame(&self) -> bool {
        self.kind() == SlideKind::Minigame
    }

    #[must_use]
    pub fn button(&self, name: &str) -> Option<&ButtonDef> {
        self.buttons.get(name)
    }
}

/// Container for all slide definitions, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SlideData {
    pub slides: IndexMap<String, SlideDef>,
}

impl SlideData {
    /// Create empty slide data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slides: IndexMap::new(),
        }
    }

    /// Load slide data from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an object of slide definitions.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build slide data from `(id, slide)` pairs, keeping their order
    #[must_use]
    pub fn from_slides<I>(slides: I) -> Self
    where
        I: IntoIterator<Item = (String, SlideDef)>,
    {
        Self {
            slides: slides.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Errors raised while obtaining slide data from a source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read slide source `{origin}`")]
    Unreachable {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed slide source `{origin}`")]
    Malformed {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Name of the source that failed (path or label).
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            Self::Unreachable { origin, .. } | Self::Malformed { origin, .. } => origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_data_from_json() {
        let json = r#"{
            "intro": {
                "Buttons": {
                    "door": {
                        "Visible": true,
                        "Actions": [["Route", "hall"]]
                    },
                    "note": {}
                },
                "FallbackSlide": "intro"
            },
            "puzzle": {
                "Type": "Minigame",
                "FallbackSlide": "intro"
            }
        }"#;

        let data = SlideData::from_json(json).unwrap();
        assert_eq!(data.len(), 2);
        let intro = &data.slides["intro"];
        assert_eq!(intro.kind(), SlideKind::Ordinary);
        assert_eq!(intro.buttons["door"].visible, Some(true));
        assert_eq!(intro.buttons["door"].actions[0].operand(0), Some("hall"));
        assert_eq!(intro.buttons["note"].visible, None);
        assert!(intro.buttons["note"].actions.is_empty());

        let puzzle = &data.slides["puzzle"];
        assert!(puzzle.is_minigame());
        assert!(puzzle.buttons.is_empty());
        assert_eq!(puzzle.fallback_slide.as_deref(), Some("intro"));
    }

    #[test]
    fn unknown_and_null_types_are_ordinary() {
        let data = SlideData::from_json(
            r#"{"a": {"Type": null}, "b": {"Type": "Cutscene"}, "c": {"Type": "Minigame"}}"#,
        )
        .unwrap();
        assert_eq!(data.slides["a"].kind(), SlideKind::Ordinary);
        assert_eq!(data.slides["b"].kind(), SlideKind::Ordinary);
        assert_eq!(data.slides["c"].kind(), SlideKind::Minigame);
    }

    #[test]
    fn source_order_is_preserved() {
        let data = SlideData::from_json(r#"{"zeta": {}, "alpha": {}, "mid": {}}"#).unwrap();
        let keys: Vec<&str> = data.slides.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn non_object_sources_are_rejected() {
        assert!(SlideData::from_json("[]").is_err());
        assert!(SlideData::from_json(r#"{"a": {"Buttons": []}}"#).is_err());
    }
}
