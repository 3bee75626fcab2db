//! The cameras a virtual rig pretends to have.

use camera_capture_core::models::media::{DeviceInfo, DevicePosition, InputSource};

/// Capabilities reported for a camera at `position`.
///
/// Modeled loosely on a phone: the front camera has no flash or torch but
/// supports night mode, the back cameras have both, the dual camera reaches
/// further.
pub fn device_info(position: DevicePosition) -> DeviceInfo {
    let (max_zoom_factor, flash, night_mode) = match position {
        DevicePosition::Front => (5.0, false, true),
        DevicePosition::Back => (10.0, true, false),
        DevicePosition::BackDualCamera => (16.0, true, false),
    };
    DeviceInfo {
        position,
        name: format!("Virtual {} Camera", label(position)),
        min_zoom_factor: 1.0,
        max_zoom_factor,
        flash_supported: flash,
        torch_supported: flash,
        night_mode_supported: night_mode,
    }
}

/// Capabilities reported when frames are replayed from a file.
pub fn file_device_info() -> DeviceInfo {
    DeviceInfo {
        position: DevicePosition::Back,
        name: "Virtual File Input".into(),
        min_zoom_factor: 1.0,
        max_zoom_factor: 1.0,
        flash_supported: false,
        torch_supported: false,
        night_mode_supported: false,
    }
}

pub fn describe(source: &InputSource) -> DeviceInfo {
    match source {
        InputSource::Camera(position) => device_info(*position),
        InputSource::File(_) => file_device_info(),
    }
}

fn label(position: DevicePosition) -> &'static str {
    match position {
        DevicePosition::Front => "Front",
        DevicePosition::Back => "Back",
        DevicePosition::BackDualCamera => "Back Dual",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_camera_has_no_flash() {
        let info = device_info(DevicePosition::Front);
        assert!(!info.flash_supported);
        assert!(!info.torch_supported);
        assert!(info.night_mode_supported);
        assert_eq!(info.name, "Virtual Front Camera");
    }

    #[test]
    fn file_input_cannot_zoom() {
        let info = describe(&InputSource::File("/tmp/frames.mov".into()));
        approx::assert_relative_eq!(info.min_zoom_factor, info.max_zoom_factor);
    }
}
