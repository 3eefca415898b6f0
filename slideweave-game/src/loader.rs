//! Slide sources: in-memory JSON, files on disk, and async file loading.
use std::path::{Path, PathBuf};

use crate::SlideSource;
use crate::data::{LoadError, SlideData};

/// Slide JSON already held in memory (embedded assets, tests).
#[derive(Debug, Clone)]
pub struct JsonSlideSource {
    origin: String,
    json: String,
}

impl JsonSlideSource {
    #[must_use]
    pub fn new(origin: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            json: json.into(),
        }
    }
}

impl SlideSource for JsonSlideSource {
    type Error = LoadError;

    fn load_slides(&self) -> Result<SlideData, Self::Error> {
        parse_slides(&self.origin, &self.json)
    }
}

/// Slide JSON read from a file each time it is loaded.
#[derive(Debug, Clone)]
pub struct FileSlideSource {
    path: PathBuf,
}

impl FileSlideSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlideSource for FileSlideSource {
    type Error = LoadError;

    fn load_slides(&self) -> Result<SlideData, Self::Error> {
        let origin = self.path.display().to_string();
        let json = std::fs::read_to_string(&self.path)
            .map_err(|source| LoadError::Unreachable {
                origin: origin.clone(),
                source,
            })?;
        parse_slides(&origin, &json)
    }
}

fn parse_slides(origin: &str, json: &str) -> Result<SlideData, LoadError> {
    SlideData::from_json(json).map_err(|source| LoadError::Malformed {
        origin: origin.to_string(),
        source,
    })
}

/// Read and parse a slide file without blocking the runtime.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed.
#[cfg(feature = "async")]
pub async fn load_slides_from_path(path: impl AsRef<Path>) -> Result<SlideData, LoadError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Unreachable {
            origin: origin.clone(),
            source,
        })?;
    parse_slides(&origin, &json)
}

/// Load a catalog from disk without touching any game state.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed.
#[cfg(feature = "async")]
pub async fn read_catalog_from_path(
    path: impl AsRef<Path>,
) -> Result<crate::catalog::SlideCatalog, LoadError> {
    let data = load_slides_from_path(path).await?;
    Ok(crate::catalog::SlideCatalog::from_loaded(data))
}

/// Load a catalog from disk and seed `state`, awaiting the file read.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed.
#[cfg(feature = "async")]
pub async fn load_catalog_from_path(
    path: impl AsRef<Path>,
    state: &mut crate::state::GameState,
) -> Result<crate::catalog::SlideCatalog, LoadError> {
    Ok(read_catalog_from_path(path).await?.seeded(state))
}
