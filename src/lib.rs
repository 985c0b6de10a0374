//! Formulaic - formula deviation detection for Homeric epic
//!
//! Learns how often each character is introduced with each of their
//! confirmed epithets and formulaic phrases, then scores every mention by
//! its surprisal under that model. Mentions that break the usual pattern,
//! a rare formula or a bare name where a formula is expected, come out on top.

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod reporters;

pub use error::{FormulaicError, Result};
