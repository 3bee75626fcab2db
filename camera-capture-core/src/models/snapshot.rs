use serde::{Deserialize, Serialize};

use super::media::{DevicePosition, DeviceSettings, Point};

/// Immutable snapshot of the camera's observable state.
///
/// Every listener notification carries one. Changes go through
/// [`CapturerStateBuilder`], which produces a new snapshot; an existing
/// snapshot can never be mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturerState {
    is_running: bool,
    device_position: DevicePosition,
    zoom_factor: f64,
    flash_supported: bool,
    torch_supported: bool,
    flash_active: bool,
    torch_active: bool,
    night_mode_active: bool,
    low_light_condition: bool,
    adjusting_exposure: bool,
    exposure_point: Option<Point>,
    focus_point: Option<Point>,
}

impl CapturerState {
    pub fn builder() -> CapturerStateBuilder {
        CapturerStateBuilder::new()
    }

    /// Starts a builder seeded with this snapshot's values.
    pub fn to_builder(&self) -> CapturerStateBuilder {
        CapturerStateBuilder {
            state: self.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn device_position(&self) -> DevicePosition {
        self.device_position
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn flash_supported(&self) -> bool {
        self.flash_supported
    }

    pub fn torch_supported(&self) -> bool {
        self.torch_supported
    }

    pub fn flash_active(&self) -> bool {
        self.flash_active
    }

    pub fn torch_active(&self) -> bool {
        self.torch_active
    }

    pub fn night_mode_active(&self) -> bool {
        self.night_mode_active
    }

    pub fn low_light_condition(&self) -> bool {
        self.low_light_condition
    }

    pub fn adjusting_exposure(&self) -> bool {
        self.adjusting_exposure
    }

    pub fn exposure_point(&self) -> Option<Point> {
        self.exposure_point
    }

    pub fn focus_point(&self) -> Option<Point> {
        self.focus_point
    }

    /// The hardware-facing subset of this snapshot.
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            zoom_factor: self.zoom_factor,
            flash_active: self.flash_active,
            torch_active: self.torch_active,
            night_mode_active: self.night_mode_active,
            exposure_point: self.exposure_point,
            focus_point: self.focus_point,
        }
    }
}

impl Default for CapturerState {
    fn default() -> Self {
        Self {
            is_running: false,
            device_position: DevicePosition::default(),
            zoom_factor: 1.0,
            flash_supported: false,
            torch_supported: false,
            flash_active: false,
            torch_active: false,
            night_mode_active: false,
            low_light_condition: false,
            adjusting_exposure: false,
            exposure_point: None,
            focus_point: None,
        }
    }
}

/// Builds [`CapturerState`] snapshots.
#[derive(Debug, Clone, Default)]
pub struct CapturerStateBuilder {
    state: CapturerState,
}

impl CapturerStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(mut self, value: bool) -> Self {
        self.state.is_running = value;
        self
    }

    pub fn device_position(mut self, value: DevicePosition) -> Self {
        self.state.device_position = value;
        self
    }

    pub fn zoom_factor(mut self, value: f64) -> Self {
        self.state.zoom_factor = value;
        self
    }

    pub fn flash_supported(mut self, value: bool) -> Self {
        self.state.flash_supported = value;
        self
    }

    pub fn torch_supported(mut self, value: bool) -> Self {
        self.state.torch_supported = value;
        self
    }

    pub fn flash_active(mut self, value: bool) -> Self {
        self.state.flash_active = value;
        self
    }

    pub fn torch_active(mut self, value: bool) -> Self {
        self.state.torch_active = value;
        self
    }

    pub fn night_mode_active(mut self, value: bool) -> Self {
        self.state.night_mode_active = value;
        self
    }

    pub fn low_light_condition(mut self, value: bool) -> Self {
        self.state.low_light_condition = value;
        self
    }

    pub fn adjusting_exposure(mut self, value: bool) -> Self {
        self.state.adjusting_exposure = value;
        self
    }

    pub fn exposure_point(mut self, value: Option<Point>) -> Self {
        self.state.exposure_point = value;
        self
    }

    pub fn focus_point(mut self, value: Option<Point>) -> Self {
        self.state.focus_point = value;
        self
    }

    pub fn build(self) -> CapturerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_leaves_source_snapshot_untouched() {
        let original = CapturerState::builder()
            .device_position(DevicePosition::Front)
            .zoom_factor(2.0)
            .build();

        let updated = original.to_builder().flash_active(true).build();

        assert!(!original.flash_active());
        assert!(updated.flash_active());
        assert_eq!(updated.device_position(), DevicePosition::Front);
        assert_eq!(updated.zoom_factor(), 2.0);
    }

    #[test]
    fn default_snapshot_is_stopped_at_unit_zoom() {
        let state = CapturerState::default();
        assert!(!state.is_running());
        assert_eq!(state.zoom_factor(), 1.0);
        assert_eq!(state.device_settings().exposure_point, None);
    }
}
