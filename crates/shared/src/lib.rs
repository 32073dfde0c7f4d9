//! Wire schema shared by the panel client and the simulated controller.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod scale;
