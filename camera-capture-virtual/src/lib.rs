//! # camera-capture-virtual
//!
//! Software camera backend for camera-capture-core.
//!
//! Provides:
//! - `VirtualCamera`: `CaptureHardware` with per-operation latency on its own thread
//! - `VirtualCameraControl`: fault injection, scan results and counters
//! - `device_catalog`: the cameras a virtual rig reports
//!
//! ## Usage
//! ```ignore
//! use camera_capture_core::{CaptureConfiguration, StateMachineContext};
//! use camera_capture_virtual::{VirtualCamera, VirtualCameraOptions};
//!
//! let camera = VirtualCamera::new(VirtualCameraOptions::default())?;
//! let control = camera.control();
//! let machine = StateMachineContext::with_hardware(camera, CaptureConfiguration::default())?;
//! ```

pub mod control;
pub mod device_catalog;
mod hardware_thread;
pub mod virtual_camera;

pub use control::{VirtualCameraControl, VirtualCameraStats};
pub use virtual_camera::{VirtualCamera, VirtualCameraOptions};
