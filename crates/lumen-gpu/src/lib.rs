//! Vulkan device and queue selection layer for the Lumen renderer.
//!
//! This crate provides:
//! - Vulkan instance bootstrap with validation-layer negotiation
//! - Capability verification (extensions, layers, features, API version)
//! - Queue family selection with shared/dedicated role assignment
//! - Physical device ranking and logical device construction

pub mod candidate;
pub mod capabilities;
pub mod device;
pub mod error;
pub mod features;
pub mod instance;
pub mod ops;
pub mod queue_family;
pub mod surface;

pub use candidate::DeviceCandidate;
pub use capabilities::{DeviceReport, DeviceRequirements, GpuVendor};
pub use device::{Device, DeviceBuilder, Queue};
pub use error::{GpuError, Result};
pub use features::DeviceFeatures;
pub use instance::{InstanceConfig, InstanceContext};
pub use ops::{Operations, QueueRequest};
pub use queue_family::{
    AsyncAssignment, GraphicsAssignment, PresentAssignment, QueueFamilyDescriptor, QueueFamilySet,
};
pub use surface::SurfaceQuery;
