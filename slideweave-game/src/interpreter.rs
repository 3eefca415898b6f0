//! Action-list interpreter.
//!
//! Executes one action list in a single forward pass. `StartBlock`/`EndBlock`
//! maintain a stack of open labels; a failed `Require*` either skips ahead to
//! the `EndBlock` of the innermost open block or, with no block open, ends
//! the whole execution. Side effects land immediately and are never rolled
//! back.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::action::{Action, Opcode, Requirement, VisibilityMode};
use crate::config::{EngineConfig, NestedSkip};
use crate::state::GameState;

/// Navigation side-effect target for `Route`.
pub trait Navigator {
    fn change_slide(&mut self, slide_id: &str);
}

/// Why an execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Ran off the end of the list (possibly while still skipping).
    Completed,
    /// `Exit` at the given action index.
    Exited { at: usize },
    /// A requirement failed with no open block at the given action index.
    RequirementFailed { at: usize },
}

/// Outcome of one action-list execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub termination: Termination,
    /// Actions dispatched through the opcode table.
    pub dispatched: usize,
    /// Actions passed over in skip mode.
    pub skipped: usize,
    /// Unknown opcodes and malformed actions treated as no-ops.
    pub ignored: usize,
}

impl ExecutionReport {
    const fn new() -> Self {
        Self {
            termination: Termination::Completed,
            dispatched: 0,
            skipped: 0,
            ignored: 0,
        }
    }

    const fn finish(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// True when the list ran to its end.
    #[must_use]
    pub const fn completed(&self) -> bool {
        matches!(self.termination, Termination::Completed)
    }
}

/// Per-execution block bookkeeping.
#[derive(Debug, Default)]
struct Block {
    stack: SmallVec<[String; 4]>,
    skipping: bool,
    skipping_to: String,
    depth: usize,
}

impl Block {
    fn begin_skip(&mut self) -> bool {
        match self.stack.last() {
            Some(top) => {
                self.skipping = true;
                self.skipping_to.clone_from(top);
                self.depth = 0;
                true
            }
            None => false,
        }
    }

    /// Inspect an action while skipping. Returns true when skipping ends and
    /// the action should be dispatched normally.
    fn resumes_at(&mut self, action: &Action, mode: NestedSkip) -> bool {
        if mode == NestedSkip::DepthTracked && action.opens_block(&self.skipping_to) {
            self.depth += 1;
            return false;
        }
        if !action.closes_block(&self.skipping_to) {
            return false;
        }
        if self.depth > 0 {
            self.depth -= 1;
            return false;
        }
        self.skipping = false;
        self.skipping_to.clear();
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionInterpreter {
    nested_skip: NestedSkip,
}

impl ActionInterpreter {
    #[must_use]
    pub const fn new(nested_skip: NestedSkip) -> Self {
        Self { nested_skip }
    }

    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.nested_skip)
    }

    #[must_use]
    pub const fn nested_skip(&self) -> NestedSkip {
        self.nested_skip
    }

    /// Run `actions` against `state`, routing through `navigator`.
    pub fn evaluate(
        &self,
        actions: &[Action],
        state: &mut GameState,
        navigator: &mut dyn Navigator,
    ) -> ExecutionReport {
        let mut block = Block::default();
        let mut report = ExecutionReport::new();

        for (index, action) in actions.iter().enumerate() {
            if block.skipping && !block.resumes_at(action, self.nested_skip) {
                report.skipped += 1;
                continue;
            }

            let Some(token) = action.opcode_token() else {
                log::warn!("action #{index} is empty, ignoring");
                report.ignored += 1;
                continue;
            };
            let Some(opcode) = Opcode::parse(token) else {
                log::debug!("action #{index}: unknown opcode `{token}`, ignoring");
                report.ignored += 1;
                continue;
            };
            if action.operands().len() < opcode.arity() {
                log::warn!(
                    "action #{index}: `{token}` needs {} operand(s), got {}",
                    opcode.arity(),
                    action.operands().len()
                );
                report.ignored += 1;
                continue;
            }

            report.dispatched += 1;
            log::debug!("action #{index}: {:?}", action.0);
            let operand = action.operand(0).unwrap_or_default();

            match opcode {
                Opcode::Route => navigator.change_slide(operand),
                Opcode::AddItem => state.add_item(operand),
                Opcode::RemoveItem => state.remove_item(operand),
                Opcode::SetGameState => {
                    let mode = action.operand(1).and_then(VisibilityMode::parse);
                    match mode {
                        Some(VisibilityMode::Show) => state.set_visibility(operand, true),
                        Some(VisibilityMode::Hide) => state.set_visibility(operand, false),
                        Some(VisibilityMode::Toggle) => state.change_visibility(operand),
                        None => log::debug!("action #{index}: unknown SetGameState mode"),
                    }
                }
                Opcode::RequireItem | Opcode::RequireGameState => {
                    let requirement = Requirement::parse(operand);
                    let observed = if opcode == Opcode::RequireItem {
                        state.check_for_item(requirement.key)
                    } else {
                        state.check_visibility(requirement.key)
                    };
                    if !requirement.holds(observed) && !block.begin_skip() {
                        return report.finish(Termination::RequirementFailed { at: index });
                    }
                }
                Opcode::StartBlock => block.stack.push(operand.to_string()),
                Opcode::EndBlock => {
                    // Pops the top regardless of the operand.
                    if block.stack.pop().is_none() {
                        log::warn!("action #{index}: EndBlock with no open block");
                    }
                }
                Opcode::Exit => return report.finish(Termination::Exited { at: index }),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        routes: Vec<String>,
    }

    impl Navigator for Recorder {
        fn change_slide(&mut self, slide_id: &str) {
            self.routes.push(slide_id.to_string());
        }
    }

    fn actions(list: &[&[&str]]) -> Vec<Action> {
        list.iter().map(|tokens| Action::new(tokens.iter().copied())).collect()
    }

    fn run(list: &[&[&str]], state: &mut GameState) -> (ExecutionReport, Vec<String>) {
        let mut nav = Recorder::default();
        let report = ActionInterpreter::default().evaluate(&actions(list), state, &mut nav);
        (report, nav.routes)
    }

    #[test]
    fn straight_line_actions_all_apply() {
        let mut state = GameState::new();
        state.add_item("old");
        let (report, routes) = run(
            &[
                &["AddItem", "key"],
                &["RemoveItem", "old"],
                &["SetGameState", "hall.door", "true"],
                &["SetGameState", "hall.lamp", "false"],
                &["SetGameState", "hall.rug", "toggle"],
                &["Route", "hall"],
            ],
            &mut state,
        );
        assert!(report.completed());
        assert_eq!(report.dispatched, 6);
        assert!(state.check_for_item("key"));
        assert!(!state.check_for_item("old"));
        assert_eq!(state.visibility("hall.door"), Some(true));
        assert_eq!(state.visibility("hall.lamp"), Some(false));
        assert_eq!(state.visibility("hall.rug"), Some(true));
        assert_eq!(routes, vec!["hall"]);
    }

    #[test]
    fn failed_requirement_skips_to_block_end() {
        let mut state = GameState::new();
        let (report, routes) = run(
            &[
                &["StartBlock", "A"],
                &["RequireItem", "missing"],
                &["Route", "inside"],
                &["EndBlock", "A"],
                &["Route", "after"],
            ],
            &mut state,
        );
        assert_eq!(routes, vec!["after"]);
        assert!(report.completed());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn failed_requirement_without_block_terminates() {
        let mut state = GameState::new();
        let (report, routes) = run(
            &[
                &["AddItem", "before"],
                &["RequireItem", "missing"],
                &["AddItem", "after"],
                &["Route", "never"],
            ],
            &mut state,
        );
        assert_eq!(report.termination, Termination::RequirementFailed { at: 1 });
        assert!(state.check_for_item("before"));
        assert!(!state.check_for_item("after"));
        assert!(routes.is_empty());
    }

    #[test]
    fn negated_requirements_invert_the_check() {
        let mut state = GameState::new();
        state.add_item("torch");
        let (report, _) = run(&[&["RequireItem", "!torch"], &["AddItem", "x"]], &mut state);
        assert_eq!(report.termination, Termination::RequirementFailed { at: 0 });
        assert!(!state.check_for_item("x"));

        let (report, _) = run(&[&["RequireItem", "!rope"], &["AddItem", "y"]], &mut state);
        assert!(report.completed());
        assert!(state.check_for_item("y"));
    }

    #[test]
    fn game_state_requirements_read_flags() {
        let mut state = GameState::new();
        state.add_visibility("hall.door", true);
        let (report, routes) = run(
            &[
                &["RequireGameState", "hall.door"],
                &["RequireGameState", "!hall.secret"],
                &["Route", "hall"],
            ],
            &mut state,
        );
        assert!(report.completed());
        assert_eq!(routes, vec!["hall"]);

        let (report, routes) = run(
            &[&["RequireGameState", "hall.secret"], &["Route", "secret"]],
            &mut state,
        );
        assert_eq!(report.termination, Termination::RequirementFailed { at: 0 });
        assert!(routes.is_empty());
    }

    #[test]
    fn exit_truncates_but_keeps_prior_effects() {
        let mut state = GameState::new();
        let (report, routes) = run(
            &[
                &["AddItem", "coin"],
                &["Route", "shop"],
                &["Exit"],
                &["AddItem", "lost"],
            ],
            &mut state,
        );
        assert_eq!(report.termination, Termination::Exited { at: 2 });
        assert!(state.check_for_item("coin"));
        assert!(!state.check_for_item("lost"));
        assert_eq!(routes, vec!["shop"]);
    }

    #[test]
    fn unknown_opcodes_and_modes_are_ignored() {
        let mut state = GameState::new();
        let (report, routes) = run(
            &[
                &["PlaySound", "chime"],
                &["SetGameState", "a.b", "maybe"],
                &[],
                &["Route"],
                &["Route", "next"],
            ],
            &mut state,
        );
        assert!(report.completed());
        assert_eq!(report.ignored, 3);
        assert_eq!(report.dispatched, 2);
        assert_eq!(state.visibility("a.b"), None);
        assert_eq!(routes, vec!["next"]);
    }

    #[test]
    fn end_block_pops_regardless_of_label() {
        // The mismatched EndBlock closes A, so the failure has nothing to skip to.
        let mut state = GameState::new();
        let (report, _) = run(
            &[
                &["StartBlock", "A"],
                &["EndBlock", "B"],
                &["RequireItem", "missing"],
                &["AddItem", "after"],
            ],
            &mut state,
        );
        assert_eq!(report.termination, Termination::RequirementFailed { at: 2 });
        assert!(!state.check_for_item("after"));
    }

    #[test]
    fn bare_end_block_still_pops() {
        let mut state = GameState::new();
        let (report, _) = run(
            &[
                &["StartBlock", "A"],
                &["EndBlock"],
                &["RequireItem", "missing"],
                &["AddItem", "after"],
                &["EndBlock", "A"],
                &["AddItem", "tail"],
            ],
            &mut state,
        );
        assert_eq!(report.termination, Termination::RequirementFailed { at: 2 });
        assert_eq!(report.ignored, 0);
        assert_eq!(state.item_count(), 0);
    }

    #[test]
    fn skip_targets_innermost_block() {
        let mut state = GameState::new();
        let (_, routes) = run(
            &[
                &["StartBlock", "outer"],
                &["StartBlock", "inner"],
                &["RequireItem", "missing"],
                &["Route", "skipped"],
                &["EndBlock", "inner"],
                &["Route", "outer-tail"],
                &["EndBlock", "outer"],
                &["Route", "end"],
            ],
            &mut state,
        );
        assert_eq!(routes, vec!["outer-tail", "end"]);
    }

    #[test]
    fn label_match_resumes_at_inner_block_with_same_label() {
        let list = actions(&[
            &["StartBlock", "A"],
            &["RequireItem", "missing"],
            &["StartBlock", "A"],
            &["Route", "inner"],
            &["EndBlock", "A"],
            &["Route", "leaked"],
            &["EndBlock", "A"],
            &["Route", "end"],
        ]);

        let mut state = GameState::new();
        let mut nav = Recorder::default();
        ActionInterpreter::new(NestedSkip::LabelMatch).evaluate(&list, &mut state, &mut nav);
        assert_eq!(nav.routes, vec!["leaked", "end"]);

        let mut nav = Recorder::default();
        ActionInterpreter::new(NestedSkip::DepthTracked).evaluate(&list, &mut state, &mut nav);
        assert_eq!(nav.routes, vec!["end"]);
    }

    #[test]
    fn list_may_end_while_skipping() {
        let mut state = GameState::new();
        let (report, routes) = run(
            &[
                &["StartBlock", "A"],
                &["RequireItem", "missing"],
                &["Route", "skipped"],
            ],
            &mut state,
        );
        assert!(report.completed());
        assert_eq!(report.skipped, 1);
        assert!(routes.is_empty());
    }

    #[test]
    fn requirement_after_passed_block_exits_with_empty_stack() {
        let mut state = GameState::new();
        state.add_item("key");
        let (report, routes) = run(
            &[
                &["StartBlock", "A"],
                &["RequireItem", "key"],
                &["Route", "vault"],
                &["EndBlock", "A"],
                &["RequireItem", "gem"],
                &["Route", "treasury"],
            ],
            &mut state,
        );
        assert_eq!(routes, vec!["vault"]);
        assert_eq!(report.termination, Termination::RequirementFailed { at: 4 });
    }
}
