use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use slideweave_game::{
    EngineConfig, SessionError, SessionSnapshot, SlideCatalog, SlideSession, Termination,
};

use crate::script::{Expectations, PlaythroughScript, Step};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub final_slide: String,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SessionSnapshot>,
}

#[derive(Debug, Clone)]
pub struct PlaythroughRunner {
    catalog: Arc<SlideCatalog>,
    config: EngineConfig,
    verbose: bool,
}

impl PlaythroughRunner {
    pub const fn new(catalog: Arc<SlideCatalog>, config: EngineConfig, verbose: bool) -> Self {
        Self {
            catalog,
            config,
            verbose,
        }
    }

    pub fn run_all(&self, scripts: &[PlaythroughScript]) -> Vec<ScenarioResult> {
        scripts.iter().map(|script| self.run(script)).collect()
    }

    /// Replay one script on a fresh session. A failing step stops the replay
    /// and the final-state expectations are not checked.
    pub fn run(&self, script: &PlaythroughScript) -> ScenarioResult {
        let start = Instant::now();
        if self.verbose {
            println!("🧪 Replaying: {}", script.name.bright_white());
        }

        let mut failures = Vec::new();
        let mut steps_run = 0;
        let mut session = match SlideSession::new(Arc::clone(&self.catalog), &self.config) {
            Ok(session) => session,
            Err(err) => {
                return ScenarioResult {
                    scenario_name: script.name.clone(),
                    passed: false,
                    steps_run,
                    steps_total: script.steps.len(),
                    final_slide: String::new(),
                    failures: vec![format!("could not open session: {err}")],
                    duration: start.elapsed(),
                    snapshot: None,
                };
            }
        };

        for (index, step) in script.steps.iter().enumerate() {
            steps_run += 1;
            match apply_step(&mut session, step) {
                Ok(note) => {
                    log::debug!("{} step {}: {step} {note}", script.name, index + 1);
                    if self.verbose {
                        println!(
                            "   {} {} {}",
                            format!("#{}", index + 1).dimmed(),
                            step,
                            note.dimmed()
                        );
                    }
                }
                Err(err) => {
                    log::warn!("{} step {} failed: {err}", script.name, index + 1);
                    failures.push(format!(
                        "step {} ({step}) on `{}`: {err}",
                        index + 1,
                        session.current_slide_id()
                    ));
                    break;
                }
            }
        }

        if failures.is_empty() {
            failures.extend(check_expectations(&script.expect, &session));
        }

        ScenarioResult {
            scenario_name: script.name.clone(),
            passed: failures.is_empty(),
            steps_run,
            steps_total: script.steps.len(),
            final_slide: session.current_slide_id().to_string(),
            failures,
            duration: start.elapsed(),
            snapshot: session.snapshot().ok(),
        }
    }
}

fn apply_step(session: &mut SlideSession, step: &Step) -> Result<String, SessionError> {
    let report = match step {
        Step::Press(button) => session.press_button(button)?,
        Step::Actions(actions) => session.evaluate_actions(actions),
        Step::FinishMinigame(success) => {
            session.finish_minigame(*success)?;
            return Ok(format!("-> {}", session.current_slide_id()));
        }
        Step::Route(slide) => {
            session.go_to(slide)?;
            return Ok(format!("-> {}", session.current_slide_id()));
        }
    };
    let ending = match report.termination {
        Termination::Completed => "completed".to_string(),
        Termination::Exited { at } => format!("exited at #{at}"),
        Termination::RequirementFailed { at } => format!("requirement failed at #{at}"),
    };
    Ok(format!(
        "-> {} ({ending}, {} run, {} skipped)",
        session.current_slide_id(),
        report.dispatched,
        report.skipped
    ))
}

pub fn check_expectations(expect: &Expectations, session: &SlideSession) -> Vec<String> {
    let mut failures = Vec::new();
    let state = session.state();

    if let Some(slide) = &expect.slide
        && slide != session.current_slide_id()
    {
        failures.push(format!(
            "expected slide `{slide}`, ended on `{}`",
            session.current_slide_id()
        ));
    }
    for item in &expect.items {
        if !state.check_for_item(item) {
            failures.push(format!("expected item `{item}` in inventory"));
        }
    }
    for item in &expect.missing_items {
        if state.check_for_item(item) {
            failures.push(format!("expected item `{item}` to be absent"));
        }
    }
    for (key, expected) in &expect.flags {
        let actual = state.check_visibility(key);
        if actual != *expected {
            failures.push(format!("expected flag `{key}` = {expected}, found {actual}"));
        }
    }
    failures
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_micros())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}
