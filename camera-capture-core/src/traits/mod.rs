pub mod callback_dispatcher;
pub mod capture_hardware;
pub mod capture_listener;
pub mod collaborators;
