// Emulation types: viewport, devices, geolocation

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Page viewport dimensions and device characteristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale")]
    pub device_scale_factor: f64,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub has_touch: bool,
    #[serde(default)]
    pub is_landscape: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
            is_landscape: false,
        }
    }

    pub fn device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    pub fn mobile(mut self, is_mobile: bool) -> Self {
        self.is_mobile = is_mobile;
        self
    }

    pub fn touch(mut self, has_touch: bool) -> Self {
        self.has_touch = has_touch;
        self
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Device profile applied as one unit by [`crate::Page::emulate`]
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub name: String,
    pub user_agent: String,
    pub viewport: Viewport,
}

impl DeviceDescriptor {
    pub fn new(
        name: impl Into<String>,
        user_agent: impl Into<String>,
        viewport: Viewport,
    ) -> Self {
        Self {
            name: name.into(),
            user_agent: user_agent.into(),
            viewport,
        }
    }
}

/// Geolocation override
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geolocation {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Geolocation {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            accuracy: None,
        }
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidArgument(format!(
                "invalid longitude {}: precondition -180 <= LONGITUDE <= 180 failed",
                self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidArgument(format!(
                "invalid latitude {}: precondition -90 <= LATITUDE <= 90 failed",
                self.latitude
            )));
        }
        if let Some(accuracy) = self.accuracy {
            if accuracy < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "invalid accuracy {accuracy}: precondition 0 <= ACCURACY failed"
                )));
            }
        }
        Ok(())
    }
}
