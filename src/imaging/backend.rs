//! Image validation backend trait and the local-disk implementation.
//!
//! The [`ImageValidator`] trait answers one question about a stored file:
//! is it a readable image, and if so, how big is it. The projector only
//! needs dimensions, never pixels.
//!
//! [`LocalImageProbe`] maps `public://` URIs onto a directory on disk and
//! reads dimensions from the file header with `image::image_dimensions`.

use super::styles::split_uri;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported stream wrapper: {0}")]
    UnsupportedScheme(String),
    #[error("path leaves the public files directory: {0}")]
    OutsideRoot(String),
    #[error("failed to read dimensions: {0}")]
    Decode(String),
}

/// Result of probing an image file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageProbe {
    pub valid: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageProbe {
    pub fn valid(width: u32, height: u32) -> Self {
        Self {
            valid: true,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    /// Dimensions, when the probe succeeded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.valid, self.width, self.height) {
            (true, Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

/// Image validation service.
pub trait ImageValidator {
    /// Probe the image stored at a stream-wrapper URI.
    fn probe(&self, uri: &str) -> ImageProbe;
}

/// [`ImageValidator`] reading `public://` files from a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageProbe {
    public_root: PathBuf,
}

impl LocalImageProbe {
    pub fn new(public_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
        }
    }

    /// Local path for a `public://` URI.
    pub fn local_path(&self, uri: &str) -> Result<PathBuf, ProbeError> {
        let (scheme, target) = split_uri(uri);
        if scheme != "public" {
            return Err(ProbeError::UnsupportedScheme(scheme.to_string()));
        }
        let relative = Path::new(target);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ProbeError::OutsideRoot(uri.to_string()));
        }
        Ok(self.public_root.join(relative))
    }

    fn identify(&self, uri: &str) -> Result<(u32, u32), ProbeError> {
        let path = self.local_path(uri)?;
        read_dimensions(&path)
    }
}

fn read_dimensions(path: &Path) -> Result<(u32, u32), ProbeError> {
    if !path.exists() {
        return Err(ProbeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    image::image_dimensions(path).map_err(|e| ProbeError::Decode(e.to_string()))
}

impl ImageValidator for LocalImageProbe {
    fn probe(&self, uri: &str) -> ImageProbe {
        match self.identify(uri) {
            Ok((width, height)) => ImageProbe::valid(width, height),
            Err(e) => {
                warn!(uri, error = %e, "image could not be validated");
                ImageProbe::invalid()
            }
        }
    }
}
