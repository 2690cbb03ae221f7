use crate::surface::RasterSurface;

/// The pinned background raster.
///
/// Fetched backgrounds are decoded into an owned surface as soon as their URL
/// resolves, rather than lazily at export time, so a later export can never
/// be blocked by the source having become unreadable. The surface is owned
/// exclusively by the composite root; other components only read it.
#[derive(Debug, Default)]
pub struct BackgroundCapture {
    state: CaptureState,
    pins: u64,
}

#[derive(Debug, Default)]
enum CaptureState {
    #[default]
    Empty,
    Pending {
        url: String,
    },
    Ready {
        url: String,
        surface: RasterSurface,
    },
}

impl BackgroundCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pinning `url`. Returns false (and does nothing) when that URL is
    /// already pinned or still decoding, so each distinct assignment pins at
    /// most once.
    pub fn begin_pin(&mut self, url: &str) -> bool {
        let already_pinned = matches!(
            &self.state,
            CaptureState::Pending { url: current } | CaptureState::Ready { url: current, .. }
                if current == url
        );
        if already_pinned {
            return false;
        }
        self.state = CaptureState::Pending {
            url: url.to_string(),
        };
        true
    }

    /// Decode-complete callback. Only applies when `url` is still the one
    /// being decoded; completions for a background that has since been
    /// replaced are dropped.
    pub fn complete(&mut self, url: &str, surface: RasterSurface) -> bool {
        let still_current =
            matches!(&self.state, CaptureState::Pending { url: current } if current == url);
        if !still_current {
            tracing::warn!(url, "dropping stale background decode completion");
            return false;
        }
        self.state = CaptureState::Ready {
            url: url.to_string(),
            surface,
        };
        self.pins += 1;
        true
    }

    /// The pinned surface, once the decode has fully completed.
    pub fn surface(&self) -> Option<&RasterSurface> {
        match &self.state {
            CaptureState::Ready { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, CaptureState::Pending { .. })
    }

    pub fn current_url(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Empty => None,
            CaptureState::Pending { url } | CaptureState::Ready { url, .. } => Some(url),
        }
    }

    /// Number of completed pins over the capture's lifetime.
    pub fn pin_count(&self) -> u64 {
        self.pins
    }
}
