use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    config::SessionConfig,
    error::{RemixelError, RemixelResult},
};

/// One entry from the gallery list endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssetEntry {
    pub asset_type: String,
    pub unique_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssetList {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

/// Client for the remote asset gallery.
///
/// Lists come from `GET {base}/list/{category}?count=&random=`; individual
/// images are addressed by convention at `{base}/image/{asset_type}/{unique_id}`.
/// A CORS-proxy prefix and a local JSON fixture are supported for
/// offline/dev use.
#[derive(Debug)]
pub struct GalleryClient {
    base_url: String,
    proxy_prefix: Option<String>,
    fixture: Option<PathBuf>,
    client: reqwest::blocking::Client,
}

impl GalleryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy_prefix: None,
            fixture: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Apply the session's `proxy` / `dataurl` query overrides.
    pub fn from_config(base_url: impl Into<String>, cfg: &SessionConfig) -> Self {
        let mut c = Self::new(base_url);
        c.proxy_prefix = cfg.proxy.clone();
        c.fixture = cfg.dataurl.clone().map(PathBuf::from);
        c
    }

    pub fn with_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.proxy_prefix = Some(prefix.into());
        self
    }

    pub fn with_fixture(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture = Some(path.into());
        self
    }

    /// Fetch the asset list for a category.
    ///
    /// Failures are logged and returned as errors; a failed fetch never
    /// masquerades as an asset payload.
    #[tracing::instrument(skip(self))]
    pub fn list(&self, category: &str, count: u32, random: bool) -> RemixelResult<AssetList> {
        if let Some(path) = &self.fixture {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read gallery fixture '{}'", path.display()))?;
            return serde_json::from_str(&raw)
                .map_err(|e| RemixelError::serde(format!("parse gallery fixture: {e}")));
        }

        let url = self.prefixed(&format!(
            "{}/list/{}?count={}&random={}",
            self.base_url.trim_end_matches('/'),
            category,
            count,
            random
        ));

        let result = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<AssetList>());

        match result {
            Ok(list) => Ok(list),
            Err(err) => {
                tracing::warn!(category, error = %err, "gallery list fetch failed");
                Err(RemixelError::fetch(format!(
                    "gallery list '{category}' failed: {err}"
                )))
            }
        }
    }

    /// URL of an asset's image, by endpoint convention.
    pub fn image_url(&self, entry: &AssetEntry) -> String {
        self.prefixed(&format!(
            "{}/image/{}/{}",
            self.base_url.trim_end_matches('/'),
            entry.asset_type,
            entry.unique_id
        ))
    }

    /// Pick one random asset from a category and return its image URL.
    pub fn random_image_url(&self, category: &str) -> RemixelResult<String> {
        let list = self.list(category, 1, true)?;
        let entry = list
            .assets
            .first()
            .ok_or_else(|| RemixelError::fetch(format!("gallery category '{category}' is empty")))?;
        Ok(self.image_url(entry))
    }

    fn prefixed(&self, url: &str) -> String {
        match &self.proxy_prefix {
            Some(prefix) => format!("{prefix}{url}"),
            None => url.to_string(),
        }
    }
}
