//! Vulkan physical device selection and logical device creation.
//!
//! ```text
//! Instance ── Surface
//!    │
//!    └─ DeviceSelector ──> PhysicalDevice ──> Device (graphics + present queues)
//! ```
//!
//! The selector reads everything through [`query::CapabilityQuery`], which
//! [`instance::Instance`] implements over the driver. `Surface` and `Device`
//! hold an `Arc<Instance>`, so the instance is destroyed last.

pub mod device;
pub mod extensions;
pub mod instance;
pub mod physical_device;
pub mod query;
pub mod queue_family;
pub mod requirements;
pub mod selector;
pub mod surface;

#[cfg(test)]
mod testing;

pub use ash;
