pub mod gpo_management;
pub mod memory_store;
pub mod policy_store;

pub use gpo_management::*;
pub use memory_store::*;
pub use policy_store::*;
