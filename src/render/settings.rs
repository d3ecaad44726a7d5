//! Settings for how the scene should look.

/// An RGB color value.
/// Each of the three channels should be in between 0.0 and 1.0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// red
    pub r: f32,

    /// green
    pub g: f32,

    /// blue
    pub b: f32,
}

impl Color {
    /// Creates a color from a r, g, b component
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }

    /// True, if all three channels are finite and within [0.0, 1.0].
    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    /// Multiplies all channels by the given factor, clamped to [0.0, 1.0].
    pub fn shaded(&self, factor: f32) -> Color {
        Color {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
        }
    }

    /// The color as 8-bit channel values.
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const GREY_9: Color = Color::rgb(0.9, 0.9, 0.9);
}

/// Mouse control scheme of the camera.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ViewMode {
    /// Orbit around the focused geometry. Selecting this mode resets the
    /// camera to the front view.
    Arcball,

    /// Free camera. Selecting this mode leaves the pose unchanged.
    Fly,

    /// Like arcball, but inspecting the model from the back view.
    Model,
}

/// Global lighting of the scene.
/// Profiles other than [LightingProfile::Default] dim the point colors.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LightingProfile {
    /// Bright day with sun at +Y.
    Default,

    /// Cloudy day.
    Cloudy,

    /// Night.
    Night,

    /// Custom profile, currently rendered like [LightingProfile::Default].
    Custom,
}

impl LightingProfile {
    /// Brightness factor applied to all point colors.
    pub fn shade(&self) -> f32 {
        match self {
            LightingProfile::Default => 1.0,
            LightingProfile::Cloudy => 0.8,
            LightingProfile::Night => 0.35,
            LightingProfile::Custom => 1.0,
        }
    }
}

/// Settings controlling the look of the rendered frames.
///
/// Mutated only by the worker in response to `Set*` commands and read on
/// every render pass.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Background color.
    pub bg_color: Color,

    /// Size of the rasterized points, in pixels. Must be positive.
    pub point_size: f64,

    /// Color used for points without a per-point color.
    pub point_color: Color,

    /// Lighting profile.
    pub lighting: LightingProfile,

    /// Mouse control scheme.
    pub view_mode: ViewMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            bg_color: Color::WHITE,
            point_size: 3.0,
            point_color: Color::GREY_9,
            lighting: LightingProfile::Default,
            view_mode: ViewMode::Arcball,
        }
    }
}
