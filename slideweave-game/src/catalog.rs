//! Slide catalog: id lookup, identity reverse lookup and state seeding.
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::SlideSource;
use crate::action::Opcode;
use crate::data::{SlideData, SlideDef};
use crate::state::GameState;

/// Lookup failures. These point at authoring bugs and are never defaulted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no slide with id `{0}` found")]
    SlideNotFound(String),
    #[error("no id corresponds to the given slide")]
    UnregisteredSlide,
    #[error("slide catalog is empty")]
    EmptyCatalog,
}

impl CatalogError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::SlideNotFound(_) | Self::UnregisteredSlide)
    }
}

/// Authoring problem found by [`SlideCatalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    DanglingFallback {
        slide: String,
        target: String,
    },
    DanglingRoute {
        slide: String,
        button: String,
        target: String,
    },
    MissingFallback {
        slide: String,
    },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingFallback { slide, target } => {
                write!(f, "slide `{slide}` falls back to unknown slide `{target}`")
            }
            Self::DanglingRoute {
                slide,
                button,
                target,
            } => write!(
                f,
                "button `{slide}.{button}` routes to unknown slide `{target}`"
            ),
            Self::MissingFallback { slide } => {
                write!(f, "minigame slide `{slide}` has no fallback slide")
            }
        }
    }
}

/// Composite game-state key for a button's visibility flag.
#[must_use]
pub fn button_key(slide_id: &str, button: &str) -> String {
    format!("{slide_id}.{button}")
}

/// Immutable slide graph. Slides are individually allocated so the reverse
/// map can key on instance identity rather than structural equality.
#[derive(Debug, Clone, Default)]
pub struct SlideCatalog {
    slides: IndexMap<String, Arc<SlideDef>>,
    inverse: HashMap<usize, String>,
}

fn identity(slide: &SlideDef) -> usize {
    std::ptr::from_ref(slide).addr()
}

impl SlideCatalog {
    /// Build the forward and reverse maps, keeping source order.
    #[must_use]
    pub fn from_data(data: SlideData) -> Self {
        let mut slides = IndexMap::with_capacity(data.slides.len());
        let mut inverse = HashMap::with_capacity(data.slides.len());
        for (id, slide) in data.slides {
            let slide = Arc::new(slide);
            inverse.insert(identity(&slide), id.clone());
            slides.insert(id, slide);
        }
        Self { slides, inverse }
    }

    /// Load slides from `source`, build the catalog and seed `state`.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the slides are unreachable or malformed;
    /// no catalog is produced in that case.
    pub fn load<S>(source: &S, state: &mut GameState) -> Result<Self, S::Error>
    where
        S: SlideSource,
    {
        let data = source.load_slides()?;
        Ok(Self::from_loaded(data).seeded(state))
    }

    /// Build a catalog from freshly loaded data and log its size.
    pub(crate) fn from_loaded(data: SlideData) -> Self {
        let catalog = Self::from_data(data);
        log::info!("loaded {} slides", catalog.len());
        catalog
    }

    /// Seed `state` from this catalog and hand the catalog back.
    #[must_use]
    pub fn seeded(self, state: &mut GameState) -> Self {
        let seeded = self.seed_game_state(state);
        log::info!("seeded {seeded} visibility flags");
        self
    }

    /// Look up a slide by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::SlideNotFound`] if no slide has that id.
    pub fn slide(&self, id: &str) -> Result<&SlideDef, CatalogError> {
        self.slides
            .get(id)
            .map(|slide| &**slide)
            .ok_or_else(|| CatalogError::SlideNotFound(id.to_string()))
    }

    /// Shared handle to a slide, for callers that outlive the borrow.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::SlideNotFound`] if no slide has that id.
    pub fn slide_handle(&self, id: &str) -> Result<Arc<SlideDef>, CatalogError> {
        self.slides
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::SlideNotFound(id.to_string()))
    }

    /// Reverse lookup by instance identity. A structurally equal copy of a
    /// registered slide is not found.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnregisteredSlide`] for slides this catalog
    /// never registered.
    pub fn slide_id(&self, slide: &SlideDef) -> Result<&str, CatalogError> {
        self.inverse
            .get(&identity(slide))
            .map(String::as_str)
            .ok_or(CatalogError::UnregisteredSlide)
    }

    /// First slide in source order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyCatalog`] when there are no slides.
    pub fn start_slide_id(&self) -> Result<&str, CatalogError> {
        self.slides
            .keys()
            .next()
            .map(String::as_str)
            .ok_or(CatalogError::EmptyCatalog)
    }

    /// Seed one flag per declared button visibility on ordinary slides.
    /// Returns the number of flags written.
    pub fn seed_game_state(&self, state: &mut GameState) -> usize {
        let mut seeded = 0;
        for (slide_id, slide) in &self.slides {
            if slide.is_minigame() {
                continue;
            }
            for (button, def) in &slide.buttons {
                if let Some(visible) = def.visible {
                    state.add_visibility(&button_key(slide_id, button), visible);
                    seeded += 1;
                }
            }
        }
        seeded
    }

    /// Report fallback and route targets that point at unknown slides.
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        for (slide_id, slide) in &self.slides {
            match slide.fallback_slide.as_deref() {
                Some(target) if !self.contains(target) => {
                    issues.push(CatalogIssue::DanglingFallback {
                        slide: slide_id.clone(),
                        target: target.to_string(),
                    });
                }
                None if slide.is_minigame() => {
                    issues.push(CatalogIssue::MissingFallback {
                        slide: slide_id.clone(),
                    });
                }
                _ => {}
            }
            for (button, def) in &slide.buttons {
                let routes = def
                    .actions
                    .iter()
                    .filter(|action| action.opcode_token() == Some(Opcode::Route.name()))
                    .filter_map(|action| action.operand(0));
                for target in routes {
                    if !self.contains(target) {
                        issues.push(CatalogIssue::DanglingRoute {
                            slide: slide_id.clone(),
                            button: button.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        issues
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.slides.contains_key(id)
    }

    pub fn slide_ids(&self) -> impl Iterator<Item = &str> {
        self.slides.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlideDef)> {
        self.slides
            .iter()
            .map(|(id, slide)| (id.as_str(), &**slide))
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
