pub mod gpo_settings;

pub use gpo_settings::*;
