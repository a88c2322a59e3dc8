//! Utility modules for the site builder.

pub mod mime;
pub mod minify;
