//! Action tokens and the opcode vocabulary understood by the interpreter.
use serde::{Deserialize, Serialize};

/// A single action: token 0 is the opcode, the rest are operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Action(pub Vec<String>);

/// Ordered actions executed for one interaction.
pub type ActionList = Vec<Action>;

impl Action {
    /// Build an action from any iterator of tokens.
    #[must_use]
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Raw opcode token, if the action has any tokens at all.
    #[must_use]
    pub fn opcode_token(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Operand tokens following the opcode.
    #[must_use]
    pub fn operands(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Operand at `index` (0-based, not counting the opcode).
    #[must_use]
    pub fn operand(&self, index: usize) -> Option<&str> {
        self.operands().get(index).map(String::as_str)
    }

    /// True when this action is an `EndBlock` closing `label`.
    #[must_use]
    pub fn closes_block(&self, label: &str) -> bool {
        self.opcode_token() == Some(Opcode::EndBlock.name()) && self.operand(0) == Some(label)
    }

    /// True when this action is a `StartBlock` opening `label`.
    #[must_use]
    pub fn opens_block(&self, label: &str) -> bool {
        self.opcode_token() == Some(Opcode::StartBlock.name()) && self.operand(0) == Some(label)
    }
}

/// Known opcodes. Anything else is ignored at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Route,
    AddItem,
    RemoveItem,
    SetGameState,
    RequireItem,
    RequireGameState,
    StartBlock,
    EndBlock,
    Exit,
}

impl Opcode {
    pub const ALL: &'static [Self] = &[
        Self::Route,
        Self::AddItem,
        Self::RemoveItem,
        Self::SetGameState,
        Self::RequireItem,
        Self::RequireGameState,
        Self::StartBlock,
        Self::EndBlock,
        Self::Exit,
    ];

    /// Parse an opcode token. Matching is case-sensitive.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == token)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Route => "Route",
            Self::AddItem => "AddItem",
            Self::RemoveItem => "RemoveItem",
            Self::SetGameState => "SetGameState",
            Self::RequireItem => "RequireItem",
            Self::RequireGameState => "RequireGameState",
            Self::StartBlock => "StartBlock",
            Self::EndBlock => "EndBlock",
            Self::Exit => "Exit",
        }
    }

    /// Minimum number of operands the opcode reads.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Exit | Self::EndBlock => 0,
            Self::SetGameState => 2,
            Self::Route
            | Self::AddItem
            | Self::RemoveItem
            | Self::RequireItem
            | Self::RequireGameState
            | Self::StartBlock => 1,
        }
    }
}

/// Second operand of `SetGameState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    Show,
    Hide,
    Toggle,
}

impl VisibilityMode {
    /// `"true"`, `"false"` or `"toggle"`; any other value yields `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "true" => Some(Self::Show),
            "false" => Some(Self::Hide),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }
}

/// Operand of `RequireItem` / `RequireGameState`, with an optional leading `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement<'a> {
    pub key: &'a str,
    pub negated: bool,
}

impl<'a> Requirement<'a> {
    #[must_use]
    pub fn parse(operand: &'a str) -> Self {
        match operand.strip_prefix('!') {
            Some(key) => Self { key, negated: true },
            None => Self {
                key: operand,
                negated: false,
            },
        }
    }

    /// Whether the requirement passes given the observed value of its key.
    #[must_use]
    pub const fn holds(self, observed: bool) -> bool {
        observed != self.negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_names_roundtrip_through_parse() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::parse(op.name()), Some(*op));
        }
        assert_eq!(Opcode::parse("route"), None);
        assert_eq!(Opcode::parse("PlaySound"), None);
    }

    #[test]
    fn requirement_strips_single_negation_prefix() {
        let plain = Requirement::parse("key");
        assert_eq!(plain.key, "key");
        assert!(!plain.negated);
        assert!(plain.holds(true));
        assert!(!plain.holds(false));

        let negated = Requirement::parse("!key");
        assert_eq!(negated.key, "key");
        assert!(negated.negated);
        assert!(negated.holds(false));
        assert!(!negated.holds(true));

        let double = Requirement::parse("!!key");
        assert_eq!(double.key, "!key");
    }

    #[test]
    fn action_accessors_tolerate_short_actions() {
        let empty = Action::default();
        assert_eq!(empty.opcode_token(), None);
        assert!(empty.operands().is_empty());

        let exit = Action::new(["Exit"]);
        assert_eq!(exit.opcode_token(), Some("Exit"));
        assert_eq!(exit.operand(0), None);
        assert!(!exit.closes_block("A"));

        let end = Action::new(["EndBlock", "A"]);
        assert!(end.closes_block("A"));
        assert!(!end.closes_block("B"));
        assert!(!Action::new(["EndBlock"]).closes_block("A"));
        assert_eq!(Opcode::EndBlock.arity(), 0);
        assert!(Action::new(["StartBlock", "A"]).opens_block("A"));
    }

    #[test]
    fn visibility_modes_are_exact_tokens() {
        assert_eq!(VisibilityMode::parse("true"), Some(VisibilityMode::Show));
        assert_eq!(VisibilityMode::parse("false"), Some(VisibilityMode::Hide));
        assert_eq!(VisibilityMode::parse("toggle"), Some(VisibilityMode::Toggle));
        assert_eq!(VisibilityMode::parse("True"), None);
        assert_eq!(VisibilityMode::parse("flip"), None);
    }

    #[test]
    fn actions_deserialize_from_string_arrays() {
        let list: ActionList =
            serde_json::from_str(r#"[["AddItem", "key"], ["Route", "hall"]]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].operand(0), Some("hall"));
    }
}
