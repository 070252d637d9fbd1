pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod document;
pub mod errors;
pub mod mailer;
pub mod models;
pub mod rate_limit;
pub mod render;
pub mod resumes;
pub mod reviews;
pub mod routes;
pub mod state;
pub mod storage;
pub mod support;
pub mod upload;
