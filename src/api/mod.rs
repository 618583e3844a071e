pub mod error;
pub mod extract;
pub mod handlers;
pub mod purchase_handlers;
pub mod recipe_handlers;
pub mod routes;

pub use error::*;
pub use extract::*;
pub use handlers::*;
pub use purchase_handlers::*;
pub use recipe_handlers::*;
pub use routes::*;
