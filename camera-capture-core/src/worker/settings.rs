use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media::{CapacityReport, DeviceInfo, DevicePosition, InputSource, SettingsChange};
use crate::models::snapshot::CapturerState;
use crate::resource::resource::CaptureResource;
use crate::traits::capture_listener::CaptureListener;

/// Apply one configuration change and commit it to the hardware.
///
/// Nothing is changed when the device does not support the setting or the
/// commit fails.
pub fn apply_settings(
    resource: &mut CaptureResource,
    change: SettingsChange,
) -> Result<Arc<CapturerState>, CaptureError> {
    let Some(device) = resource.device.clone() else {
        return Err(CaptureError::ConfigurationFailed("no device configured".into()));
    };
    let current = resource.state();

    let builder = match change {
        SettingsChange::ZoomFactor(zoom) => {
            if !zoom.is_finite() {
                return Err(CaptureError::ConfigurationFailed(format!("invalid zoom factor: {}", zoom)));
            }
            current
                .to_builder()
                .zoom_factor(zoom.clamp(device.min_zoom_factor, device.max_zoom_factor))
        }
        SettingsChange::FlashActive(active) => {
            if active && !device.flash_supported {
                return Err(CaptureError::ConfigurationFailed("flash not supported".into()));
            }
            current.to_builder().flash_active(active)
        }
        SettingsChange::TorchActive(active) => {
            if active && !device.torch_supported {
                return Err(CaptureError::ConfigurationFailed("torch not supported".into()));
            }
            current.to_builder().torch_active(active)
        }
        SettingsChange::NightModeActive(active) => {
            if active && !device.night_mode_supported {
                return Err(CaptureError::ConfigurationFailed("night mode not supported".into()));
            }
            current.to_builder().night_mode_active(active)
        }
        SettingsChange::ExposurePoint(point) => current.to_builder().exposure_point(Some(point.clamped())),
        SettingsChange::FocusPoint(point) => current.to_builder().focus_point(Some(point.clamped())),
        SettingsChange::DevicePosition(position) => return switch_device(resource, position),
    };

    let next = builder.build();
    commit(resource, &next)?;
    resource.state = Arc::new(next);
    announce_changes(resource, &current);
    Ok(resource.state())
}

fn switch_device(
    resource: &mut CaptureResource,
    position: DevicePosition,
) -> Result<Arc<CapturerState>, CaptureError> {
    let current = resource.state();
    if current.device_position() == position {
        return Ok(current);
    }
    if !resource.hardware.is_available(position) {
        return Err(CaptureError::DeviceNotAvailable);
    }

    let device = resource.hardware.configure_input(&InputSource::Camera(position))?;
    log::info!("[CaptureWorker] Switched to {} ({})", device.position, device.name);
    let next = current
        .to_builder()
        .device_position(device.position)
        .zoom_factor(device.min_zoom_factor.max(1.0).min(device.max_zoom_factor))
        .flash_supported(device.flash_supported)
        .torch_supported(device.torch_supported)
        .flash_active(current.flash_active() && device.flash_supported)
        .torch_active(current.torch_active() && device.torch_supported)
        .night_mode_active(current.night_mode_active() && device.night_mode_supported)
        .exposure_point(None)
        .focus_point(None)
        .build();
    if let Err(error) = commit(resource, &next) {
        restore_device(resource, &current, device);
        return Err(error);
    }
    resource.device = Some(device);
    resource.state = Arc::new(next);
    announce_changes(resource, &current);
    Ok(resource.state())
}

/// Put the previous camera back after a switch whose commit failed. If the
/// hardware refuses, the resource follows the camera the hardware kept.
fn restore_device(resource: &mut CaptureResource, previous: &Arc<CapturerState>, switched: DeviceInfo) {
    let position = previous.device_position();
    match resource.hardware.configure_input(&InputSource::Camera(position)) {
        Ok(device) => {
            log::warn!("[CaptureWorker] Switch rolled back to {} ({})", device.position, device.name);
            resource.device = Some(device);
        }
        Err(e) => {
            log::error!(
                "[CaptureWorker] Could not return to {}: {}, staying on {}",
                position,
                e,
                switched.position
            );
            resource.state = Arc::new(
                previous
                    .to_builder()
                    .device_position(switched.position)
                    .zoom_factor(switched.min_zoom_factor.max(1.0).min(switched.max_zoom_factor))
                    .flash_supported(switched.flash_supported)
                    .torch_supported(switched.torch_supported)
                    .flash_active(false)
                    .torch_active(false)
                    .night_mode_active(false)
                    .exposure_point(None)
                    .focus_point(None)
                    .build(),
            );
            resource.device = Some(switched);
            announce_changes(resource, previous);
        }
    }
}

/// Fold an analyzer observation into the snapshot. Suggested points are
/// committed to the hardware like regular settings.
pub fn apply_capacity_report(
    resource: &mut CaptureResource,
    report: &CapacityReport,
) -> Result<Arc<CapturerState>, CaptureError> {
    let current = resource.state();
    let mut builder = current
        .to_builder()
        .low_light_condition(report.low_light_condition)
        .adjusting_exposure(report.adjusting_exposure);
    let moves_points = report.suggested_exposure_point.is_some() || report.suggested_focus_point.is_some();
    if let Some(point) = report.suggested_exposure_point {
        builder = builder.exposure_point(Some(point.clamped()));
    }
    if let Some(point) = report.suggested_focus_point {
        builder = builder.focus_point(Some(point.clamped()));
    }
    let next = builder.build();
    if next == *current {
        return Ok(current);
    }

    if moves_points && resource.device.is_some() {
        commit(resource, &next)?;
    }
    resource.state = Arc::new(next);
    announce_changes(resource, &current);
    Ok(resource.state())
}

fn commit(resource: &mut CaptureResource, next: &CapturerState) -> Result<(), CaptureError> {
    resource.anomaly(|d| d.session_will_commit_configuration());
    let result = resource.hardware.commit_configuration(&next.device_settings());
    resource.anomaly(|d| d.session_did_commit_configuration());
    if let Err(e) = &result {
        log::error!("[CaptureWorker] Failed to commit configuration: {}", e);
    }
    result
}

type Notification = fn(&dyn CaptureListener, &CapturerState);

/// Announce one notification per changed field, then `did_change_state`.
fn announce_changes(resource: &mut CaptureResource, previous: &CapturerState) {
    let next = resource.state();
    if *previous == *next {
        return;
    }

    let mut changed: Vec<Notification> = Vec::new();
    if previous.zoom_factor() != next.zoom_factor() {
        changed.push(|l, s| l.did_change_zoom_factor(s));
    }
    if previous.flash_active() != next.flash_active() {
        changed.push(|l, s| l.did_change_flash_active(s));
    }
    if previous.torch_active() != next.torch_active() {
        changed.push(|l, s| l.did_change_torch_active(s));
    }
    if previous.night_mode_active() != next.night_mode_active() {
        changed.push(|l, s| l.did_change_night_mode_active(s));
    }
    if previous.device_position() != next.device_position() {
        changed.push(|l, s| l.did_change_capture_device_position(s));
    }
    if previous.low_light_condition() != next.low_light_condition() {
        changed.push(|l, s| l.did_change_low_light_condition(s));
    }
    if previous.adjusting_exposure() != next.adjusting_exposure() {
        changed.push(|l, s| l.did_change_adjusting_exposure(s));
    }
    let exposure = next.exposure_point().filter(|p| previous.exposure_point() != Some(*p));
    let focus = next.focus_point().filter(|p| previous.focus_point() != Some(*p));

    resource.announce(move |l| {
        for notify in &changed {
            notify(l, &next);
        }
        if let Some(point) = exposure {
            l.did_change_exposure_point(point);
        }
        if let Some(point) = focus {
            l.did_change_focus_point(point);
        }
        l.did_change_state(&next);
    });
}
