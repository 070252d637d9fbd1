pub mod resume;
pub mod review;
pub mod support;
pub mod user;
