pub mod deployment;
pub mod error;
pub mod topology;

pub use deployment::{DeploymentUnit, ResourceProfile};
pub use error::Error;
pub use topology::{CpuSpec, GpuSpec, Topology, TopologyEntry};
