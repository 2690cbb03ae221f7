use crate::{blend::BlendMode, halftone::ShapeType};

/// Foreground reference value that selects the live camera instead of a
/// static image.
pub const CAMERA_SENTINEL: &str = "camera";

pub const DEFAULT_SHAPE_COLOR: &str = "#00FF00";
pub const DEFAULT_SHAPE_DISTANCE: f64 = 10.0;

/// The active foreground input. Exactly one of a static image or the live
/// camera; the variant itself enforces the exclusivity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForegroundSource {
    Image(String),
    Camera,
}

impl ForegroundSource {
    pub fn from_ref(image_ref: &str) -> Self {
        if image_ref == CAMERA_SENTINEL {
            ForegroundSource::Camera
        } else {
            ForegroundSource::Image(image_ref.to_string())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Background,
    Foreground,
}

/// Semantic change raised by a wizard step, routed to the composite root.
///
/// The wire form is the `{action, ...fields}` tagged union the steps emit,
/// e.g. `{"action":"imagechange","layer":"background","image":"bg.png"}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    #[serde(rename = "imagechange")]
    ImageChange { layer: Layer, image: String },
    #[serde(rename = "shapechange")]
    ShapeChange { shape: ShapeType },
    #[serde(rename = "colorchange")]
    ColorChange { color: String },
    #[serde(rename = "distancechange")]
    DistanceChange { distance: f64 },
    #[serde(rename = "blendchange")]
    BlendChange { blend: BlendMode },
}

/// The authoritative snapshot of what should currently be displayed.
///
/// Mutated only through [`RenderState::apply`]; every mutation rewrites a
/// single named field and bumps `version` so reactive consumers can detect
/// the change. Values are applied as-is; there is no validation or rollback.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderState {
    pub background_image: Option<String>,
    pub foreground: Option<ForegroundSource>,
    pub shape: ShapeType,
    /// Hex RGB, e.g. `#00FF00`.
    pub shape_color: String,
    /// Cell spacing; the UI offers `[5, 20]` but any value is accepted.
    pub shape_distance: f64,
    pub blend: BlendMode,
    pub version: u64,
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            background_image: None,
            foreground: None,
            shape: ShapeType::default(),
            shape_color: DEFAULT_SHAPE_COLOR.to_string(),
            shape_distance: DEFAULT_SHAPE_DISTANCE,
            blend: BlendMode::default(),
            version: 0,
        }
    }

    /// Apply exactly the field the action names and bump the version.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::ImageChange { layer, image } => match layer {
                Layer::Background => self.background_image = Some(image.clone()),
                Layer::Foreground => self.foreground = Some(ForegroundSource::from_ref(image)),
            },
            Action::ShapeChange { shape } => self.shape = *shape,
            Action::ColorChange { color } => self.shape_color = color.clone(),
            Action::DistanceChange { distance } => self.shape_distance = *distance,
            Action::BlendChange { blend } => self.blend = *blend,
        }
        self.version += 1;
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}
