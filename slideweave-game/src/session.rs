use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::action::Action;
use crate::catalog::{CatalogError, SlideCatalog, button_key};
use crate::config::EngineConfig;
use crate::data::SlideDef;
use crate::interpreter::{ActionInterpreter, ExecutionReport};
use crate::navigation::{NavigationController, NavigationError};
use crate::state::GameState;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("slide `{slide}` has no button `{button}`")]
    ButtonNotFound { slide: String, button: String },
    #[error("button `{slide}.{button}` is hidden")]
    ButtonHidden { slide: String, button: String },
}

/// A button as the renderer should show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonView {
    pub name: String,
    pub visible: bool,
}

/// Read model handed to the rendering layer after each interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub slide_id: String,
    pub minigame: bool,
    pub buttons: Vec<ButtonView>,
    pub inventory: Vec<String>,
    pub flags: BTreeMap<String, bool>,
    pub revision: u64,
}

/// One player's run through a slide graph: shared catalog, own game state,
/// own navigation. Every mutation goes through `&mut self`, so executions
/// never overlap.
#[derive(Debug)]
pub struct SlideSession {
    catalog: Arc<SlideCatalog>,
    state: GameState,
    navigation: NavigationController,
    interpreter: ActionInterpreter,
}

impl SlideSession {
    /// Open a session on the catalog's start slide with freshly seeded state.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyCatalog`] if there is no slide to open.
    pub fn new(catalog: Arc<SlideCatalog>, config: &EngineConfig) -> Result<Self, SessionError> {
        let mut state = GameState::new();
        catalog.seed_game_state(&mut state);
        Self::with_state(catalog, state, config)
    }

    /// Open a session on the start slide with an existing state.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyCatalog`] if there is no slide to open.
    pub fn with_state(
        catalog: Arc<SlideCatalog>,
        state: GameState,
        config: &EngineConfig,
    ) -> Result<Self, SessionError> {
        let start = catalog.start_slide_id()?.to_string();
        log::info!("session opened on `{start}`");
        Ok(Self {
            catalog,
            state,
            navigation: NavigationController::new(start),
            interpreter: ActionInterpreter::from_config(config),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &SlideCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply a closure to the mutable game state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    #[must_use]
    pub const fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub const fn navigation_mut(&mut self) -> &mut NavigationController {
        &mut self.navigation
    }

    #[must_use]
    pub fn current_slide_id(&self) -> &str {
        self.navigation.current()
    }

    /// Definition of the current slide.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if a `Route` moved to an unknown slide.
    pub fn current_slide(&self) -> Result<&SlideDef, CatalogError> {
        self.catalog.slide(self.navigation.current())
    }

    /// A button is shown unless its flag exists and is false.
    #[must_use]
    pub fn is_button_visible(&self, button: &str) -> bool {
        let key = button_key(self.navigation.current(), button);
        self.state.visibility(&key).unwrap_or(true)
    }

    /// Run the action list bound to `button` on the current slide.
    ///
    /// # Errors
    ///
    /// Fails if the current slide or the button does not exist, or if the
    /// button is hidden.
    pub fn press_button(&mut self, button: &str) -> Result<ExecutionReport, SessionError> {
        let slide_id = self.navigation.current().to_string();
        if !self.is_button_visible(button) {
            return Err(SessionError::ButtonHidden {
                slide: slide_id,
                button: button.to_string(),
            });
        }
        let slide = self.catalog.slide(&slide_id)?;
        let Some(def) = slide.button(button) else {
            return Err(SessionError::ButtonNotFound {
                slide: slide_id,
                button: button.to_string(),
            });
        };
        log::debug!("button `{slide_id}.{button}` pressed");
        Ok(self
            .interpreter
            .evaluate(&def.actions, &mut self.state, &mut self.navigation))
    }

    /// Run an arbitrary action list, as supplied by the rendering layer.
    pub fn evaluate_actions(&mut self, actions: &[Action]) -> ExecutionReport {
        self.interpreter
            .evaluate(actions, &mut self.state, &mut self.navigation)
    }

    /// Report the end of the current minigame slide.
    ///
    /// # Errors
    ///
    /// Fails if the current slide is unknown or has no fallback.
    pub fn finish_minigame(&mut self, success: bool) -> Result<(), SessionError> {
        self.navigation.finish_minigame(success, &self.catalog)?;
        Ok(())
    }

    /// Jump straight to `slide_id`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the slide does not exist.
    pub fn go_to(&mut self, slide_id: &str) -> Result<(), SessionError> {
        self.catalog.slide(slide_id)?;
        self.navigation.change_slide(slide_id);
        Ok(())
    }

    /// Capture the read model for the current slide.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the current slide is unknown.
    pub fn snapshot(&self) -> Result<SessionSnapshot, CatalogError> {
        let slide = self.current_slide()?;
        let buttons = slide
            .buttons
            .keys()
            .map(|name| ButtonView {
                name: name.clone(),
                visible: self.is_button_visible(name),
            })
            .collect();
        Ok(SessionSnapshot {
            slide_id: self.current_slide_id().to_string(),
            minigame: slide.is_minigame(),
            buttons,
            inventory: self.state.items().map(str::to_string).collect(),
            flags: self
                .state
                .flags()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            revision: self.navigation.revision(),
        })
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }
}
