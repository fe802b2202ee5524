use crate::SceneError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A handle referencing a material registered with the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// sRGB color with components in 0..=1.
///
/// Serializes as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub fn from_rgb_u32(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Result<Self, SceneError> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| SceneError::InvalidColor(hex.to_string()))?;
        let rgb = u32::from_str_radix(digits, 16)
            .map_err(|_| SceneError::InvalidColor(hex.to_string()))?;
        Ok(Self::from_rgb_u32(rgb))
    }

    /// Linear-light components for shading.
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    pub fn to_hex(self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Color {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = SceneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Which faces of a mesh are shaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Metallic-roughness surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub side: Side,
}

impl StandardMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            roughness: 1.0,
            metalness: 0.0,
            side: Side::Front,
        }
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        let c = Color::from_hex("#7E41D9").unwrap();
        assert_eq!(c, Color::from_rgb_u32(0x7E41D9));
        assert_eq!(c.to_hex(), "#7E41D9");
        assert_eq!("#ffffff".parse::<Color>().unwrap(), Color::WHITE);
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["7E41D9", "#7E41D", "#7E41D9FF", "#GGGGGG", ""] {
            assert!(
                matches!(Color::from_hex(bad), Err(SceneError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        for c in Color::WHITE.to_linear() {
            assert!((c - 1.0).abs() < 1e-6);
        }
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let mid = Color::new(0.5, 0.5, 0.5).to_linear();
        assert!(mid[0] > 0.2 && mid[0] < 0.22);
    }

    #[test]
    fn material_builder_clamps() {
        let m = StandardMaterial::new(Color::WHITE)
            .roughness(1.5)
            .metalness(-0.2)
            .side(Side::Double);
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.metalness, 0.0);
        assert_eq!(m.side, Side::Double);
    }

    #[test]
    fn color_converts_through_hex_strings() {
        let s = String::from(Color::from_rgb_u32(0x47C83E));
        assert_eq!(s, "#47C83E");
        assert_eq!(Color::try_from(s).unwrap(), Color::from_rgb_u32(0x47C83E));
    }
}
