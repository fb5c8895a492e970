pub mod models;
pub mod features;
pub mod seed;
pub mod weights;

pub use models::*;
pub use features::*;
pub use seed::*;
pub use weights::*;
