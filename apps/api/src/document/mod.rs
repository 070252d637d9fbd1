pub mod assembler;
pub mod config;
pub mod defaults;
pub mod model;
pub mod order;
pub mod sanitize;
pub mod sections;
pub mod validation;
