//! Numerical feature scaling.

mod standard;

pub use standard::{FittedStandardScaler, StandardScaler};
