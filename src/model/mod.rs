pub mod ingredient;
pub mod purchase;
pub mod recipe;

pub use ingredient::*;
pub use purchase::*;
pub use recipe::*;

/// Surrogate key assigned by the store
pub type Id = i64;
