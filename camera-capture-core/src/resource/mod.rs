pub(crate) mod announcer;
#[allow(clippy::module_inception)]
pub mod resource;
pub mod token;
