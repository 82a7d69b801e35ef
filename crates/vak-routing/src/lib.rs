pub mod config;
pub mod editor;
pub mod prune;

pub use config::{Cluster, Route, RoutingConfig};
pub use editor::apply_unit;
pub use prune::prune;
