//! Utility modules for the content engine.

pub mod html;
pub mod script;
