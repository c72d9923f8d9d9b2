//! Construction-time overlay settings.
//!
//! All configs deserialize from partial documents: missing fields take the
//! [`Default`] values, which match the stock overlay look.

use debugviz_common::{
    Color, ConfigError, Transform, ensure_finite, ensure_positive, ensure_segments,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Settings for [`WireGridOverlay`](crate::WireGridOverlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGridConfig {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub color: Color,
    pub axis_length: f32,
    /// Height of the axis origins above the grid position.
    pub axis_lift: f32,
    pub transform: Transform,
    pub visible: bool,
}

impl Default for WireGridConfig {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            width_segments: 1,
            height_segments: 1,
            color: Color::WHITE,
            axis_length: 150.0,
            axis_lift: 2.0,
            transform: Transform::flat(),
            visible: true,
        }
    }
}

impl WireGridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        ensure_segments("width_segments", self.width_segments)?;
        ensure_segments("height_segments", self.height_segments)?;
        ensure_positive("axis_length", self.axis_length)?;
        ensure_finite("axis_lift", self.axis_lift)?;
        Ok(())
    }
}

/// Settings for [`FilledGridOverlay`](crate::FilledGridOverlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilledGridConfig {
    pub width: f32,
    pub height: f32,
    /// Cell counts of the fill plane; the line mesh uses `line_density`
    /// times as many.
    pub width_segments: u32,
    pub height_segments: u32,
    pub line_density: u32,
    pub fill_color: Color,
    pub line_color: Color,
    /// Minor line width; major lines are five times wider.
    pub stroke_width: f32,
    pub transform: Transform,
    pub visible: bool,
}

impl Default for FilledGridConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            width_segments: 10,
            height_segments: 10,
            line_density: 5,
            fill_color: Color::from_rgb8(0xdd, 0xdd, 0xdd),
            line_color: Color::from_rgb8(0x88, 0x88, 0x88),
            stroke_width: 0.4,
            transform: Transform::flat().with_position(Vec3::new(0.0, -0.1, 0.0)),
            visible: true,
        }
    }
}

impl FilledGridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        ensure_segments("width_segments", self.width_segments)?;
        ensure_segments("height_segments", self.height_segments)?;
        ensure_segments("line_density", self.line_density)?;
        ensure_positive("stroke_width", self.stroke_width)?;
        Ok(())
    }

    /// Segment counts passed to the line-mesh builder.
    pub fn line_segments(&self) -> (u32, u32) {
        (
            self.width_segments.saturating_mul(self.line_density),
            self.height_segments.saturating_mul(self.line_density),
        )
    }
}

/// Settings for [`NormalOverlay`](crate::NormalOverlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalConfig {
    pub line_length: f32,
    /// Distance the dots sit above the surface, along the normal.
    pub dot_offset: f32,
    /// Dot diameter in pixels.
    pub dot_size: f32,
    pub line_color: Color,
    pub visible: bool,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            line_length: 20.0,
            dot_offset: 3.0,
            dot_size: 6.0,
            line_color: Color::YELLOW,
            visible: true,
        }
    }
}

impl NormalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("line_length", self.line_length)?;
        ensure_finite("dot_offset", self.dot_offset)?;
        ensure_positive("dot_size", self.dot_size)?;
        Ok(())
    }
}

/// Every overlay setting of a demo scene, loadable from one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub wire_grid: WireGridConfig,
    pub filled_grid: FilledGridConfig,
    pub normals: NormalConfig,
    /// Edge length of the cube the normal overlay annotates.
    pub target_size: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            wire_grid: WireGridConfig::default(),
            filled_grid: FilledGridConfig::default(),
            normals: NormalConfig::default(),
            target_size: 50.0,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wire_grid.validate()?;
        self.filled_grid.validate()?;
        self.normals.validate()?;
        ensure_positive("target_size", self.target_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        WireGridConfig::default().validate().unwrap();
        FilledGridConfig::default().validate().unwrap();
        NormalConfig::default().validate().unwrap();
    }

    #[test]
    fn filled_defaults_match_stock_look() {
        let config = FilledGridConfig::default();
        assert_eq!(config.fill_color.to_hex(), "#dddddd");
        assert_eq!(config.line_color.to_hex(), "#888888");
        assert_eq!(config.line_segments(), (50, 50));
        assert_eq!(config.transform.position.y, -0.1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: WireGridConfig =
            serde_json::from_str(r##"{ "width": 40, "color": "#ff0000" }"##).unwrap();
        assert_eq!(config.width, 40.0);
        assert_eq!(config.height, 100.0);
        assert_eq!(config.color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(config.axis_length, 150.0);
    }

    #[test]
    fn normal_config_accepts_rgb_triples() {
        let config: NormalConfig =
            serde_json::from_str(r#"{ "line_color": [0.0, 1.0, 0.0], "line_length": 5 }"#)
                .unwrap();
        assert_eq!(config.line_color, Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(config.line_length, 5.0);
        assert_eq!(config.dot_offset, 3.0);
    }

    #[test]
    fn rejects_bad_values() {
        let config = WireGridConfig {
            width_segments: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroSegments {
                name: "width_segments"
            })
        );
        let config = NormalConfig {
            line_length: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = NormalConfig {
            dot_offset: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn scene_config_accepts_partial_documents() {
        let scene: SceneConfig =
            serde_json::from_str(r#"{"normals": {"line_length": 5.0}, "target_size": 20}"#).unwrap();
        assert_eq!(scene.normals.line_length, 5.0);
        assert_eq!(scene.target_size, 20.0);
        assert_eq!(scene.filled_grid, FilledGridConfig::default());
        scene.validate().unwrap();

        let bad: SceneConfig = serde_json::from_str(r#"{"target_size": 0}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
