//! Data layer - Static tables and constants
//!
//! This module contains the static data the attribute engine and the table
//! grammar consult: doctypes, built-in attributes, attribute sets with
//! special inheritance rules and cell style letters.

pub mod constants;

// Re-export commonly used items
pub use constants::{style_name, BASELINE_DOCTYPE, DOCTYPES, STYLE_LETTERS};
