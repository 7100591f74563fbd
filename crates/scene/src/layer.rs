use serde::{Deserialize, Serialize};

/// Which face of a shell is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// What a layer does while its surface map is not (or never) available.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingMap {
    /// Draw with the tint only.
    #[default]
    Unmapped,
    /// Skip the layer entirely.
    Hidden,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Core,
    Clouds,
    InnerAtmosphere,
    OuterAtmosphere,
}

impl LayerKind {
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Core => "core",
            LayerKind::Clouds => "clouds",
            LayerKind::InnerAtmosphere => "inner-atmosphere",
            LayerKind::OuterAtmosphere => "outer-atmosphere",
        }
    }

    pub fn is_atmosphere(self) -> bool {
        matches!(self, LayerKind::InnerAtmosphere | LayerKind::OuterAtmosphere)
    }
}

/// One concentric shell of the globe.
///
/// Everything here is fixed at scene mount; the accumulated rotation lives in
/// [`GlobeAnimation`](crate::GlobeAnimation).
#[derive(Debug, Clone, PartialEq)]
pub struct SphereLayer {
    pub kind: LayerKind,
    pub radius: f64,
    pub segments: u32,
    /// Uri of the surface map, resolved through the texture cache each frame.
    pub surface_uri: Option<String>,
    pub opacity: f32,
    pub side: Side,
    /// Radians per frame.
    pub rotation_speed: f64,
    /// Linear RGB multiplied into the surface (or used alone when unmapped).
    pub tint: [f32; 3],
    pub missing_map: MissingMap,
}

impl SphereLayer {
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}
