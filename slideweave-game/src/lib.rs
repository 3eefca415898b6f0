//! Slideweave Game Engine
//!
//! Platform-agnostic core for slide-based games: a JSON slide graph, a
//! per-session game state store, and the action interpreter that turns
//! button presses into state changes and navigation.
//! This crate has no rendering or platform-specific dependencies.

pub mod action;
pub mod catalog;
pub mod config;
pub mod data;
pub mod interpreter;
pub mod loader;
pub mod navigation;
pub mod pointer;
pub mod session;
pub mod state;

use std::sync::Arc;

// Re-export commonly used types
pub use action::{Action, ActionList, Opcode, Requirement, VisibilityMode};
pub use catalog::{CatalogError, CatalogIssue, SlideCatalog, button_key};
pub use config::{EngineConfig, NestedSkip};
pub use data::{ButtonDef, LoadError, SlideData, SlideDef, SlideKind};
pub use interpreter::{ActionInterpreter, ExecutionReport, Navigator, Termination};
#[cfg(feature = "async")]
pub use loader::{load_catalog_from_path, load_slides_from_path, read_catalog_from_path};
pub use loader::{FileSlideSource, JsonSlideSource};
pub use navigation::{NavigationController, NavigationError};
pub use pointer::{MoveThrottle, PointerEvent};
pub use session::{ButtonView, SessionError, SessionSnapshot, SlideSession};
pub use state::GameState;

/// Trait for abstracting slide loading
/// Platform-specific implementations should provide this
pub trait SlideSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the slide graph from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the slides are unreachable or malformed.
    fn load_slides(&self) -> Result<SlideData, Self::Error>;
}

/// Main engine: loads the catalog once and opens sessions against it
pub struct SlideEngine<S>
where
    S: SlideSource,
{
    source: S,
    config: EngineConfig,
}

impl<S> SlideEngine<S>
where
    S: SlideSource,
{
    /// Create a new engine with the provided slide source and config
    pub const fn new(source: S, config: EngineConfig) -> Self {
        Self { source, config }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the slide catalog from the source
    ///
    /// # Errors
    ///
    /// Returns an error if the slides cannot be loaded.
    pub fn load_catalog(&self) -> Result<Arc<SlideCatalog>, S::Error> {
        let data = self.source.load_slides()?;
        Ok(Arc::new(SlideCatalog::from_loaded(data)))
    }

    /// Load the catalog and open a session on its start slide
    ///
    /// # Errors
    ///
    /// Returns an error if the slides cannot be loaded or the catalog is empty.
    pub fn create_session(&self) -> Result<SlideSession, anyhow::Error> {
        let catalog = self.load_catalog()?;
        Ok(self.open_session(catalog)?)
    }

    /// Open a session against an already loaded catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is empty.
    pub fn open_session(&self, catalog: Arc<SlideCatalog>) -> Result<SlideSession, SessionError> {
        SlideSession::new(catalog, &self.config)
    }
}
