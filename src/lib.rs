//! Lander - build, verify and preview a static landing site.
//!
//! - [`build`]: flatten `<load>` includes and CSS `@import` chains into `dist/`
//! - [`cache`]: the versioned runtime cache controller shipped with the site
//! - [`check`]: install the cache controller against the build output
//! - [`serve`]: preview server with a contact endpoint stand-in

pub mod build;
pub mod cache;
pub mod check;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod contact;
pub mod logger;
pub mod serve;
pub mod utils;
