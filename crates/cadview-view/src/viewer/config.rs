use std::path::Path;
use std::time::Duration;

use cadview_base::{Error, ensure_positive};
use cadview_math::DEFAULT_TRACKBALL_RADIUS;
use serde::{Deserialize, Serialize};

use super::input::{ButtonMask, KeyCode};
use crate::error::Result;

/// How a window point becomes an eye-space ray for seeking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickRay {
    /// Window-plane construction from the field of view.
    #[default]
    Window,
    /// Near/far unprojection through the projection matrix.
    Unproject,
}

/// Viewer bindings and tuning. Partial JSON files fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub rotate_buttons: ButtonMask,
    pub translate_buttons: ButtonMask,
    pub scale_buttons: ButtonMask,
    pub seek_buttons: ButtonMask,
    pub viewing_key: KeyCode,
    pub seeking_key: KeyCode,
    pub modelview_key: KeyCode,
    /// Pixels the pointer must travel in the last step to start a spin.
    pub spin_tolerance: i32,
    pub spin_interval_ms: u64,
    pub trackball_radius: f64,
    /// Pan distance per pixel for cameras without a field of view.
    pub translate_factor: f64,
    pub pick_ray: PickRay,
    pub start_viewing: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            rotate_buttons: ButtonMask::LEFT,
            translate_buttons: ButtonMask::RIGHT,
            scale_buttons: ButtonMask::LEFT | ButtonMask::RIGHT,
            seek_buttons: ButtonMask::LEFT,
            viewing_key: KeyCode::from_char('v'),
            seeking_key: KeyCode::from_char('s'),
            modelview_key: KeyCode::from_char('m'),
            spin_tolerance: 2,
            spin_interval_ms: 1,
            trackball_radius: DEFAULT_TRACKBALL_RADIUS,
            translate_factor: 0.01,
            pick_ray: PickRay::Window,
            start_viewing: true,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn spin_interval(&self) -> Duration {
        Duration::from_millis(self.spin_interval_ms)
    }

    pub fn validate(&self) -> cadview_base::Result<()> {
        for (name, mask) in [
            ("rotate_buttons", self.rotate_buttons),
            ("translate_buttons", self.translate_buttons),
            ("scale_buttons", self.scale_buttons),
            ("seek_buttons", self.seek_buttons),
        ] {
            if mask.is_empty() {
                return Err(Error::InvalidParameter(format!("{name} must not be empty")));
            }
        }
        let keys = [self.viewing_key, self.seeking_key, self.modelview_key];
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            return Err(Error::InvalidParameter(
                "viewing, seeking and modelview keys must differ".to_string(),
            ));
        }
        if self.spin_tolerance < 0 {
            return Err(Error::InvalidParameter(
                "spin_tolerance must be >= 0".to_string(),
            ));
        }
        if self.spin_interval_ms == 0 {
            return Err(Error::InvalidParameter(
                "spin_interval_ms must be > 0".to_string(),
            ));
        }
        ensure_positive("trackball_radius", self.trackball_radius)?;
        ensure_positive("translate_factor", self.translate_factor)?;
        Ok(())
    }
}
