pub mod config;
pub mod error;
pub mod media;
pub mod session_info;
pub mod snapshot;
pub mod state;
