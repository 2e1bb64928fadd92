pub mod adjustment;
#[cfg(feature = "scenarios")]
pub mod scenario;
#[cfg(feature = "scenarios")]
pub mod sensitivity;

#[cfg(feature = "scenarios")]
pub use scenario::compare_scenarios;
#[cfg(feature = "scenarios")]
pub use sensitivity::{run_sensitivity, two_way_sensitivity};
