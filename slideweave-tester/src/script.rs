//! Playthrough scripts: interactions to replay plus the state to expect.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use slideweave_game::ActionList;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed script {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One interaction against the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Press a button on the current slide.
    Press(String),
    /// Run a raw action list.
    Actions(ActionList),
    /// Report the current minigame's outcome.
    FinishMinigame(bool),
    /// Jump to a slide directly.
    Route(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press(button) => write!(f, "press `{button}`"),
            Self::Actions(actions) => write!(f, "actions ({} entries)", actions.len()),
            Self::FinishMinigame(success) => write!(f, "finish minigame (success: {success})"),
            Self::Route(slide) => write!(f, "route to `{slide}`"),
        }
    }
}

/// Final-state assertions. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Expectations {
    pub slide: Option<String>,
    pub items: Vec<String>,
    pub missing_items: Vec<String>,
    pub flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaythroughScript {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: Expectations,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Many(Vec<PlaythroughScript>),
    One(PlaythroughScript),
}

impl PlaythroughScript {
    /// Parse a script document holding either one script or an array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON matches neither shape.
    pub fn parse_all(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        Ok(match serde_json::from_str::<ScriptFile>(json)? {
            ScriptFile::Many(scripts) => scripts,
            ScriptFile::One(script) => vec![script],
        })
    }

    /// Read every script in a file.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Vec<Self>, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_all(&json).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_multiple_scripts() {
        let one = PlaythroughScript::parse_all(
            r#"{"name": "solo", "steps": [{"press": "door"}, {"finish_minigame": false}]}"#,
        )
        .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(
            one[0].steps,
            vec![Step::Press("door".into()), Step::FinishMinigame(false)]
        );
        assert_eq!(one[0].expect, Expectations::default());

        let many = PlaythroughScript::parse_all(
            r#"[
                {"name": "a", "steps": [{"route": "hall"}]},
                {"name": "b", "steps": [{"actions": [["AddItem", "x"]]}],
                 "expect": {"items": ["x"], "flags": {"hall.door": true}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].expect.items, vec!["x"]);
        assert_eq!(many[1].expect.flags.get("hall.door"), Some(&true));
    }

    #[test]
    fn unknown_step_kinds_are_rejected() {
        assert!(
            PlaythroughScript::parse_all(r#"{"name": "bad", "steps": [{"jump": "x"}]}"#).is_err()
        );
    }

    #[test]
    fn steps_describe_themselves() {
        assert_eq!(Step::Press("lever".into()).to_string(), "press `lever`");
        assert_eq!(
            Step::FinishMinigame(true).to_string(),
            "finish minigame (success: true)"
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PlaythroughScript::load_file(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/script.json"));
    }
}
