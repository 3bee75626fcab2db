use std::sync::Arc;

use crate::models::config::ScanConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::ScanResult;
use crate::resource::resource::CaptureResource;
use crate::traits::capture_hardware::ScanResultSink;

/// Start decoding frames. Hits are delivered to the configuration's handler
/// on the callback dispatcher.
pub fn start_scan(resource: &mut CaptureResource, config: &ScanConfiguration) -> Result<(), CaptureError> {
    config.validate().map_err(CaptureError::ScanFailed)?;
    if resource.scanning {
        return Err(CaptureError::ScanFailed("already scanning".into()));
    }

    let dispatcher = Arc::clone(&resource.dispatcher);
    let handler = Arc::clone(&config.results_handler);
    let sink: ScanResultSink = Arc::new(move |result: ScanResult| {
        let handler = Arc::clone(&handler);
        dispatcher.dispatch(Box::new(move || handler(&result)));
    });

    resource.hardware.start_scan(&config.scan_types, sink).map_err(|e| {
        log::error!("[CaptureWorker] Failed to start scan: {}", e);
        e
    })?;
    resource.scanning = true;
    log::info!("[CaptureWorker] Scanning for {:?}", config.scan_types);
    Ok(())
}

pub fn stop_scan(resource: &mut CaptureResource) -> Result<(), CaptureError> {
    if !resource.scanning {
        return Ok(());
    }
    resource.scanning = false;
    resource.hardware.stop_scan().map_err(|e| {
        log::error!("[CaptureWorker] Failed to stop scan: {}", e);
        e
    })?;
    log::info!("[CaptureWorker] Scan stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::models::config::ScanType;
    use crate::test_support::scripted_resource;

    #[test]
    fn results_reach_the_handler() {
        let (mut resource, script) = scripted_resource();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = ScanConfiguration::new(
            vec![ScanType::Qr],
            Arc::new(move |result: &ScanResult| sink.lock().push(result.payload.clone())),
        );

        start_scan(&mut resource, &config).unwrap();
        assert!(resource.scanning);
        script.lock().emit_scan(ScanResult {
            scan_type: ScanType::Qr,
            payload: "hello".into(),
        });
        assert_eq!(*seen.lock(), vec!["hello".to_string()]);

        stop_scan(&mut resource).unwrap();
        assert!(!resource.scanning);
    }

    #[test]
    fn empty_scan_types_fail() {
        let (mut resource, _script) = scripted_resource();
        let config = ScanConfiguration::new(Vec::new(), Arc::new(|_: &ScanResult| {}));
        assert!(matches!(start_scan(&mut resource, &config), Err(CaptureError::ScanFailed(_))));
        assert!(!resource.scanning);
    }
}
