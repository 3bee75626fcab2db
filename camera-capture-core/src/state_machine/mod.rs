pub mod book_keeper;
pub mod context;
pub(crate) mod payload;
pub(crate) mod request;
mod states;
