pub mod comments;
pub mod handlers;
pub mod store;
pub mod token;
