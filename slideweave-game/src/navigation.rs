//! Current-slide tracking and minigame completion routing.
use std::fmt;
use thiserror::Error;

use crate::catalog::{CatalogError, SlideCatalog};
use crate::interpreter::Navigator;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("slide `{0}` has no fallback slide")]
    MissingFallback(String),
}

type SlideListener = Box<dyn FnMut(&str) + Send>;

/// Holds the current slide id and tells listeners when it changes.
pub struct NavigationController {
    current: String,
    revision: u64,
    listeners: Vec<SlideListener>,
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("current", &self.current)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NavigationController {
    #[must_use]
    pub fn new(start_slide: impl Into<String>) -> Self {
        Self {
            current: start_slide.into(),
            revision: 0,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Bumped on every slide change, so a renderer can poll for refreshes.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a callback invoked with the new slide id after each change.
    pub fn subscribe(&mut self, listener: impl FnMut(&str) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Switch to `slide_id`. The id is not checked against the catalog; an
    /// unknown id surfaces when the slide is next looked up.
    pub fn change_slide(&mut self, slide_id: &str) {
        log::info!("slide change: {} -> {slide_id}", self.current);
        slide_id.clone_into(&mut self.current);
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(&self.current);
        }
    }

    /// Leave the current minigame slide for its fallback. Success and failure
    /// currently route to the same place.
    ///
    /// # Errors
    ///
    /// Returns an error if the current slide is unknown or has no fallback.
    pub fn finish_minigame(
        &mut self,
        success: bool,
        catalog: &SlideCatalog,
    ) -> Result<(), NavigationError> {
        let slide = catalog.slide(&self.current)?;
        let fallback = slide
            .fallback_slide
            .clone()
            .ok_or_else(|| NavigationError::MissingFallback(self.current.clone()))?;
        log::debug!("minigame on `{}` finished (success: {success})", self.current);
        self.change_slide(&fallback);
        Ok(())
    }
}

impl Navigator for NavigationController {
    fn change_slide(&mut self, slide_id: &str) {
        Self::change_slide(self, slide_id);
    }
}
