#![forbid(unsafe_code)]

pub mod assets;
pub mod blend;
pub mod bus;
pub mod capture;
pub mod compose;
pub mod config;
pub mod error;
pub mod fit;
pub mod halftone;
pub mod overlay;
pub mod root;
pub mod state;
pub mod submit;
pub mod surface;

pub use blend::BlendMode;
pub use bus::EventBus;
pub use capture::BackgroundCapture;
pub use compose::{ExportFormat, composite_to_raster, encode_for_download, encode_jpeg_blob};
pub use config::SessionConfig;
pub use error::{RemixelError, RemixelResult};
pub use halftone::{HalftoneParams, ShapeType};
pub use overlay::OverlayGeometry;
pub use root::CompositeRoot;
pub use state::{Action, ForegroundSource, Layer, RenderState};
pub use surface::RasterSurface;
