use crate::render::{CameraController, Projection};
use glam::Vec3;
use std::path::Path;

pub const CONFIG_ENV_VAR: &str = "SCENARIO_DESIGNER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Interaction tuning. Every field has a default, so a config file only needs
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignerConfig {
    /// Radians of yaw/pitch per dragged pixel.
    pub look_sensitivity: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Pixels a press may move on either axis and still count as a click.
    pub drag_threshold_px: f32,
    pub ground_height: f32,
    /// Minimum camera height above the ground.
    pub eye_offset: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub camera_start: [f32; 3],
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.005,
            move_speed: 6.0,
            drag_threshold_px: 5.0,
            ground_height: 0.0,
            eye_offset: 0.5,
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_start: [0.0, 5.0, 10.0],
        }
    }
}

impl DesignerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads the file named by `SCENARIO_DESIGNER_CONFIG`, falling back to
    /// defaults when it is unset or unusable.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded designer config from {}", Path::new(&path).display());
                config
            }
            Err(err) => {
                log::warn!("{err}; using default designer config");
                Self::default()
            }
        }
    }

    pub fn min_camera_height(&self) -> f32 {
        self.ground_height + self.eye_offset
    }

    pub fn initial_camera(&self) -> CameraController {
        CameraController::new(Vec3::from_array(self.camera_start), 0.0, 0.0).with_projection(
            Projection {
                fov_y_deg: self.fov_y_deg,
                near: self.near,
                far: self.far,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("designer.json");
        std::fs::write(&path, r#"{"moveSpeed": 12.0, "cameraStart": [1.0, 2.0, 3.0]}"#).unwrap();
        let config = DesignerConfig::load(&path).unwrap();
        assert_eq!(config.move_speed, 12.0);
        assert_eq!(config.camera_start, [1.0, 2.0, 3.0]);
        assert_eq!(config.drag_threshold_px, 5.0);
        assert_eq!(config.initial_camera().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn broken_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("designer.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DesignerConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            DesignerConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
