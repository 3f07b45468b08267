pub mod applications;
pub mod performance;
