pub mod registry;
pub mod setting;
pub mod validation;

pub use registry::*;
pub use setting::*;
pub use validation::*;
