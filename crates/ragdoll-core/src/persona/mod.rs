//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: caller-facing `PersonaConfig` and validated `Persona`
//! - `preset`: documented defaults (the Arthas persona)

mod model;
pub mod preset;

pub use model::{Persona, PersonaConfig};
