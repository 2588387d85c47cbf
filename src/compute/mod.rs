pub mod adapter;
pub mod model;
pub mod service;

pub use adapter::ComputeServiceAdapter;
pub use service::{ComputeService, ComputeServiceBuilder};
