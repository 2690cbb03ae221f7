use crate::{
    capture::BackgroundCapture,
    compose,
    error::{RemixelError, RemixelResult},
    overlay::OverlayGeometry,
    state::{Action, Layer, RenderState},
    surface::RasterSurface,
};

/// The composite root: single writer of [`RenderState`] and exclusive owner
/// of the background capture.
///
/// Wizard steps raise [`Action`]s; the root applies each one and then
/// requests a redraw as a separate, visible step. Mutations land in dispatch
/// order and are never coalesced: one dispatch, one redraw request.
#[derive(Debug, Default)]
pub struct CompositeRoot {
    state: RenderState,
    capture: BackgroundCapture,
    redraw_requests: u64,
}

impl CompositeRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn capture(&self) -> &BackgroundCapture {
        &self.capture
    }

    pub fn redraw_requests(&self) -> u64 {
        self.redraw_requests
    }

    /// Apply one semantic change, then request a redraw.
    ///
    /// A background image change additionally starts the eager pin of the
    /// new background into the owned capture surface.
    #[tracing::instrument(skip(self))]
    pub fn dispatch(&mut self, action: Action) {
        self.state.apply(&action);

        if let Action::ImageChange {
            layer: Layer::Background,
            image,
        } = &action
        {
            self.capture.begin_pin(image);
        }

        self.request_redraw();
    }

    /// Decode-complete callback for a background pin started by `dispatch`.
    /// Stale completions (the background has since changed) are ignored.
    pub fn complete_background_decode(&mut self, url: &str, surface: RasterSurface) -> bool {
        let applied = self.capture.complete(url, surface);
        if applied {
            self.request_redraw();
        }
        applied
    }

    /// Flatten the current composite for export.
    ///
    /// Refuses while the background capture is absent or still decoding; the
    /// pin must fully complete before any export reads it.
    pub fn export(&self, overlay: &OverlayGeometry) -> RemixelResult<RasterSurface> {
        let background = self.capture.surface().ok_or_else(|| {
            RemixelError::composite("background capture is not ready for export")
        })?;
        compose::composite_to_raster(overlay, background, self.state.blend)
    }

    fn request_redraw(&mut self) {
        self.redraw_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blend::BlendMode, halftone::ShapeType};

    fn bg_surface() -> RasterSurface {
        let mut s = RasterSurface::new(8, 8).unwrap();
        s.fill([120, 130, 140, 255]);
        s
    }

    fn overlay() -> OverlayGeometry {
        crate::halftone::generate(
            &crate::halftone::HalftoneParams {
                shape: ShapeType::Hexagons,
                fill: "#00FF00".to_string(),
                distance: 10.0,
                width: 8.0,
                height: 8.0,
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn each_dispatch_requests_exactly_one_redraw() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ShapeChange {
            shape: ShapeType::Circles,
        });
        assert_eq!(root.redraw_requests(), 1);
        root.dispatch(Action::BlendChange {
            blend: BlendMode::Multiply,
        });
        assert_eq!(root.redraw_requests(), 2);
        assert_eq!(root.state().version, 2);
    }

    #[test]
    fn background_change_starts_eager_pin() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "bg.png".to_string(),
        });
        assert!(root.capture().is_pending());
        assert_eq!(root.capture().current_url(), Some("bg.png"));
    }

    #[test]
    fn foreground_change_does_not_touch_capture() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Foreground,
            image: "fg.png".to_string(),
        });
        assert!(!root.capture().is_pending());
        assert!(root.capture().current_url().is_none());
    }

    #[test]
    fn export_blocked_while_background_decodes() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "slow.png".to_string(),
        });

        // Decode still in flight: export must refuse rather than read a
        // half-initialized surface.
        assert!(root.export(&overlay()).is_err());

        assert!(root.complete_background_decode("slow.png", bg_surface()));
        let out = root.export(&overlay()).unwrap();
        assert_eq!((out.width(), out.height()), (8, 8));
    }

    #[test]
    fn decode_completion_triggers_redraw() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "bg.png".to_string(),
        });
        let before = root.redraw_requests();
        root.complete_background_decode("bg.png", bg_surface());
        assert_eq!(root.redraw_requests(), before + 1);
    }

    #[test]
    fn stale_decode_completion_is_ignored() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "a.png".to_string(),
        });
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "b.png".to_string(),
        });

        let before = root.redraw_requests();
        assert!(!root.complete_background_decode("a.png", bg_surface()));
        assert_eq!(root.redraw_requests(), before);
        assert!(root.export(&overlay()).is_err());
    }

    #[test]
    fn export_uses_current_blend_mode() {
        let mut root = CompositeRoot::new();
        root.dispatch(Action::ImageChange {
            layer: Layer::Background,
            image: "bg.png".to_string(),
        });
        root.complete_background_decode("bg.png", bg_surface());

        let normal = root.export(&overlay()).unwrap();
        root.dispatch(Action::BlendChange {
            blend: BlendMode::Difference,
        });
        let diff = root.export(&overlay()).unwrap();
        assert_ne!(normal, diff);
    }
}
