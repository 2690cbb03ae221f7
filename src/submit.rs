use anyhow::Context as _;

use crate::{
    bus::{Detail, EventBus, events},
    compose,
    error::RemixelResult,
    surface::RasterSurface,
};

/// Destination of the post-upload hard redirect.
pub const SUBMIT_REDIRECT_URL: &str = "https://halftone.example.com/gallery";

/// Fixed message shown when an upload fails.
pub const SUPPORT_ALERT: &str =
    "Something went wrong uploading your photo. Please find a staff member for help.";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitMetadata {
    pub first_name: String,
    pub last_initial: String,
    pub age: u32,
}

/// Transport seam for the submission service.
///
/// The real transport performs one multipart POST; tests substitute fakes.
pub trait SubmitTransport {
    fn post_composite(
        &mut self,
        jpeg: &[u8],
        meta: &SubmitMetadata,
    ) -> RemixelResult<serde_json::Value>;
}

/// Hard-navigation collaborator (browser redirect in the original host).
pub trait Navigator {
    fn redirect(&mut self, url: &str);
}

/// Blocking user-alert collaborator.
pub trait UserPrompt {
    fn alert(&mut self, message: &str);
}

/// HTTP transport against the submission service.
#[derive(Debug)]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl SubmitTransport for HttpTransport {
    fn post_composite(
        &mut self,
        jpeg: &[u8],
        meta: &SubmitMetadata,
    ) -> RemixelResult<serde_json::Value> {
        let image = reqwest::blocking::multipart::Part::bytes(jpeg.to_vec())
            .file_name("halftone.jpg")
            .mime_str("image/jpeg")
            .context("build image part")?;

        let form = reqwest::blocking::multipart::Form::new()
            .part("image", image)
            .text("first_name", meta.first_name.clone())
            .text("last_initial", meta.last_initial.clone())
            .text("age", meta.age.to_string());

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .context("post composite")?;
        let resp = resp.error_for_status().context("post composite")?;
        let body = resp.json().context("parse submit response")?;
        Ok(body)
    }
}

/// Encode the composite as JPEG and submit it once.
///
/// Success broadcasts `upload-complete` and hard-navigates away. Any failure
/// (network unreachable, non-2xx, malformed response) collapses to a single
/// `upload-failed` broadcast plus one blocking alert; no retry, no
/// navigation. Returns the service body on success, `None` on the handled
/// failure path.
#[tracing::instrument(skip_all, fields(age = meta.age))]
pub fn upload_composite(
    raster: &RasterSurface,
    meta: &SubmitMetadata,
    transport: &mut dyn SubmitTransport,
    bus: &mut EventBus,
    nav: &mut dyn Navigator,
    prompt: &mut dyn UserPrompt,
) -> RemixelResult<Option<serde_json::Value>> {
    let jpeg = compose::encode_jpeg_blob(raster)?;

    match transport.post_composite(&jpeg, meta) {
        Ok(body) => {
            bus.publish(events::UPLOAD_COMPLETE, &body);
            nav.redirect(SUBMIT_REDIRECT_URL);
            Ok(Some(body))
        }
        Err(err) => {
            tracing::warn!(error = %err, "composite upload failed");
            bus.publish(events::UPLOAD_FAILED, &Detail::Null);
            prompt.alert(SUPPORT_ALERT);
            Ok(None)
        }
    }
}
