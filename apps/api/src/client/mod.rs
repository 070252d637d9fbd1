//! Editor-side plumbing: the HTTP client, the debounced autosave, the local
//! preference store and the comment poller.

pub mod api;
pub mod autosave;
pub mod comment_poller;
pub mod local_store;
