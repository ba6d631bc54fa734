pub mod brightness;
pub mod capture_gate;
pub mod classifier;
pub mod guidance;
pub mod verdict;
