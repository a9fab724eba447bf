//! Device binding entities.

pub mod binding;
pub mod platform;

pub use binding::{DeviceBinding, DeviceContext};
pub use platform::Platform;
