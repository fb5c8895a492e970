pub mod events;
pub mod predictions;
pub mod ledger;
pub mod league;
pub mod market;
pub mod workers;
pub mod error;

pub use events::*;
pub use predictions::*;
pub use ledger::*;
pub use league::*;
pub use market::*;
pub use workers::*;
pub use error::*;
