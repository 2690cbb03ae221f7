use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    error::{RemixelError, RemixelResult},
    state::CAMERA_SENTINEL,
    surface::RasterSurface,
};

pub mod decode;
pub mod gallery;

/// Classified image reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// `http://` or `https://` URL.
    Url(String),
    /// `data:image/...;base64,...` URI.
    DataUri(String),
    /// Local file path.
    File(PathBuf),
    /// The live-camera sentinel; frames arrive over the bus, not here.
    Camera,
}

impl ImageSource {
    pub fn from_ref(image_ref: &str) -> Self {
        if image_ref == CAMERA_SENTINEL {
            Self::Camera
        } else if image_ref.starts_with("data:") {
            Self::DataUri(image_ref.to_string())
        } else if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            Self::Url(image_ref.to_string())
        } else {
            Self::File(PathBuf::from(image_ref))
        }
    }
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        Self::from_ref(s)
    }
}

/// Fetch and decode an image source into a premultiplied surface.
///
/// Loading is synchronous; the caller treats the surface as unusable until
/// this returns. Camera sources have no bytes to fetch and are rejected.
pub fn resolve_image(
    client: &reqwest::blocking::Client,
    source: &ImageSource,
) -> RemixelResult<RasterSurface> {
    let bytes = match source {
        ImageSource::Url(url) => {
            let resp = client
                .get(url)
                .send()
                .with_context(|| format!("fetch image '{url}'"))?;
            let resp = resp
                .error_for_status()
                .with_context(|| format!("fetch image '{url}'"))?;
            resp.bytes().context("read image body")?.to_vec()
        }
        ImageSource::DataUri(uri) => decode::decode_data_uri(uri)?,
        ImageSource::File(path) => std::fs::read(path)
            .with_context(|| format!("read image file '{}'", path.display()))?,
        ImageSource::Camera => {
            return Err(RemixelError::validation(
                "live camera frames arrive via the bus, not by fetch",
            ));
        }
    };
    decode::decode_image(&bytes)
}
