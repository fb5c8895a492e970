pub mod adapters;
pub mod registry;
pub mod cache;
pub mod workers;
pub mod pipeline;
pub mod reconciler;
pub mod metrics;

pub use adapters::{EspnAdapter, FootballDataAdapter, SourceAdapter, TheSportsDbAdapter};
pub use registry::*;
pub use cache::*;
pub use workers::*;
pub use pipeline::*;
pub use reconciler::*;
pub use metrics::*;
