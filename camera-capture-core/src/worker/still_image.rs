use chrono::Utc;

use crate::models::error::CaptureError;
use crate::models::media::{CapturedImage, StillImageRequest};
use crate::resource::resource::CaptureResource;
use crate::traits::capture_hardware::HardwareCompletion;

/// Video frames are preferred while recording (a photo capture would glitch
/// the recording) and while the device moves (a photo would blur).
pub fn should_capture_image_from_video(resource: &CaptureResource) -> bool {
    if resource.video_recording {
        return true;
    }
    resource
        .device_motion
        .as_ref()
        .is_some_and(|provider| provider.is_under_device_motion())
}

/// Announce the capture and hand the request to the hardware. Feed the
/// outcome of `on_captured` back with [`did_capture_still_image`].
pub fn capture_still_image(
    resource: &mut CaptureResource,
    aspect_ratio: Option<f64>,
    capture_session_id: &str,
    on_captured: HardwareCompletion<CapturedImage>,
) -> Result<StillImageRequest, CaptureError> {
    if let Some(ratio) = aspect_ratio {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(CaptureError::StillImageFailed(format!("invalid aspect ratio: {}", ratio)));
        }
    }
    if resource.still_image_capturing {
        return Err(CaptureError::StillImageFailed("a capture is already in flight".into()));
    }

    let request = StillImageRequest {
        aspect_ratio,
        capture_session_id: capture_session_id.to_string(),
        from_video: should_capture_image_from_video(resource),
    };
    resource.still_image_capturing = true;
    log::info!(
        "[CaptureWorker] Capturing still image (from_video={}, session={})",
        request.from_video,
        request.capture_session_id
    );

    let state = resource.state();
    resource.announce(move |l| l.will_capture_photo(&state));
    resource.hardware.capture_still_image(&request, on_captured);
    Ok(request)
}

pub fn did_capture_still_image(
    resource: &mut CaptureResource,
    request: &StillImageRequest,
    result: Result<CapturedImage, CaptureError>,
) -> Result<CapturedImage, CaptureError> {
    resource.still_image_capturing = false;
    let mut image = match result {
        Ok(image) => image,
        Err(error) => {
            log::error!("[CaptureWorker] Still image failed: {}", error);
            let state = resource.state();
            let reported = error.clone();
            resource.announce(move |l| l.did_get_error(&reported, &state));
            return Err(error);
        }
    };

    let state = resource.state();
    image
        .metadata
        .insert("capture_session_id".into(), request.capture_session_id.clone());
    image.metadata.insert(
        "source".into(),
        if request.from_video { "video" } else { "photo" }.into(),
    );
    image
        .metadata
        .insert("device_position".into(), state.device_position().to_string());
    image
        .metadata
        .insert("zoom_factor".into(), format!("{:.2}", state.zoom_factor()));
    image.metadata.insert("captured_at".into(), Utc::now().to_rfc3339());
    if let Some(active) = &resource.active_recording {
        image
            .metadata
            .insert("recording_session_id".into(), active.info.session_id.to_string());
    }

    resource.still_images_captured += 1;
    log::info!(
        "[CaptureWorker] Captured {}x{} still image",
        image.width,
        image.height
    );
    resource.announce(move |l| l.did_capture_photo(&state));
    Ok(image)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{scripted_resource, FixedMotion};

    #[test]
    fn prefers_video_frames_while_recording_or_moving() {
        let (resource, _script) = scripted_resource();
        assert!(!should_capture_image_from_video(&resource));

        let mut resource = resource.with_device_motion_provider(Arc::new(FixedMotion(true)));
        assert!(should_capture_image_from_video(&resource));

        resource.device_motion = Some(Arc::new(FixedMotion(false)));
        resource.video_recording = true;
        assert!(should_capture_image_from_video(&resource));
    }

    #[test]
    fn rejects_bad_aspect_ratio() {
        let (mut resource, _script) = scripted_resource();
        let result = capture_still_image(&mut resource, Some(0.0), "s", Box::new(|_| {}));
        assert!(matches!(result, Err(CaptureError::StillImageFailed(_))));
        assert!(!resource.still_image_capturing);
    }

    #[test]
    fn metadata_describes_the_capture() {
        let (mut resource, _script) = scripted_resource();
        let request = capture_still_image(&mut resource, Some(0.75), "session-9", Box::new(|_| {})).unwrap();
        assert!(resource.still_image_capturing);

        let image = CapturedImage {
            width: 64,
            height: 48,
            data: vec![0; 16],
            metadata: Default::default(),
        };
        let image = did_capture_still_image(&mut resource, &request, Ok(image)).unwrap();
        assert_eq!(image.metadata["capture_session_id"], "session-9");
        assert_eq!(image.metadata["source"], "photo");
        assert_eq!(image.metadata["device_position"], "back");
        assert!(image.metadata.contains_key("captured_at"));
        assert_eq!(resource.still_images_captured, 1);
        assert!(!resource.still_image_capturing);
    }
}
