pub mod store;
pub mod repository;

pub use store::*;
pub use repository::*;
