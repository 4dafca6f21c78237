//! Logical device construction.
//!
//! The builder walks every physical device, gates each one through the
//! capability verifier and the queue family selector, ranks the survivors,
//! and turns the winner into a [`Device`] with ready-to-use queue handles.

use ash::vk;
use std::ffi::CString;

use crate::candidate::{select_candidate, DeviceCandidate};
use crate::capabilities::{DeviceReport, DeviceRequirements};
use crate::error::{GpuError, Result};
use crate::features::DeviceFeatures;
use crate::instance::InstanceContext;
use crate::ops::{Operations, QueueRequest};
use crate::queue_family::{QueueFamilyDescriptor, QueueFamilySet};
use crate::surface::SurfaceQuery;

/// A queue handle bound to one role.
///
/// Non-owning: queues live and die with their [`Device`]. Two `Queue`
/// values alias the same native handle when their roles resolved to the
/// same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queue {
    handle: vk::Queue,
    family: u32,
    ops: Operations,
}

impl Queue {
    /// Get the raw queue handle.
    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    /// Queue family the queue belongs to.
    pub fn family(&self) -> u32 {
        self.family
    }

    /// Role set this queue was built to serve.
    pub fn ops(&self) -> Operations {
        self.ops
    }
}

/// Builder for creating a logical device.
///
/// Plain configuration; `build` borrows it, so one builder can produce any
/// number of independent devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceBuilder {
    request: QueueRequest,
    requirements: DeviceRequirements,
}

impl DeviceBuilder {
    /// Create a new builder with an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles that must resolve to some queue family (sharing allowed).
    pub fn supported(mut self, ops: Operations) -> Self {
        self.request.supported = ops;
        self
    }

    /// Roles that must get a queue family of their own.
    pub fn dedicated(mut self, ops: Operations) -> Self {
        self.request.dedicated = ops;
        self
    }

    /// Require a device extension.
    pub fn extension(mut self, name: impl Into<String>) -> Self {
        self.requirements.extensions.push(name.into());
        self
    }

    /// Require a validation layer to be enabled on the instance.
    pub fn layer(mut self, name: impl Into<String>) -> Self {
        self.requirements.layers.push(name.into());
        self
    }

    /// Require a set of device features.
    pub fn features(mut self, features: DeviceFeatures) -> Self {
        self.requirements.features = features;
        self
    }

    /// Require a minimum API version (packed major/minor/patch).
    pub fn api_version(mut self, version: u32) -> Self {
        self.requirements.api_version = version;
        self
    }

    /// Select a physical device and build the logical device.
    ///
    /// Candidates that fail any capability or queue-family check are
    /// skipped; only the aggregate "no suitable device" is reported.
    pub fn build(
        &self,
        instance: &InstanceContext,
        surface: Option<&SurfaceQuery>,
    ) -> Result<Device> {
        let request = effective_request(self.request, surface.is_none() || instance.headless());

        let physical_devices = unsafe { instance.handle().enumerate_physical_devices()? };

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            let report = unsafe {
                DeviceReport::query(instance.handle(), physical_device, instance.enabled_layers())
            };

            if !self.requirements.verify(&report, instance.enabled_layers()) {
                continue;
            }

            let families = gather_queue_families(instance, physical_device, surface);
            let queue_families = QueueFamilySet::select(&families, request);
            if !queue_families.verify_support(request) {
                tracing::debug!(
                    "{}: no viable queue family configuration",
                    report.device_name
                );
                continue;
            }

            candidates.push(DeviceCandidate {
                physical_device,
                report,
                queue_families,
            });
        }

        let winner = select_candidate(candidates).ok_or(GpuError::NoSuitableDevice)?;
        tracing::info!("Selected GPU: {}", winner.report.summary());

        unsafe { create_device(instance, winner, request, &self.requirements) }
    }
}

/// Presentation cannot be satisfied without a surface; drop it from the
/// request instead of failing every candidate.
fn effective_request(mut request: QueueRequest, headless: bool) -> QueueRequest {
    if headless {
        request.supported.remove(Operations::PRESENTATION);
        request.dedicated.remove(Operations::PRESENTATION);
    }
    request
}

/// Describe every queue family of a device, including the presentation bit
/// for the target surface.
fn gather_queue_families(
    instance: &InstanceContext,
    physical_device: vk::PhysicalDevice,
    surface: Option<&SurfaceQuery>,
) -> Vec<QueueFamilyDescriptor> {
    let properties = unsafe {
        instance
            .handle()
            .get_physical_device_queue_family_properties(physical_device)
    };

    properties
        .iter()
        .enumerate()
        .map(|(index, props)| {
            let index = index as u32;
            let present = surface.is_some_and(|s| {
                s.supports_present(physical_device, index).unwrap_or(false)
            });
            QueueFamilyDescriptor::from_vk(index, props, present)
        })
        .collect()
}

/// Create the logical device for the winning candidate and fetch one native
/// queue per unique family.
///
/// # Safety
/// The instance and the candidate's physical device must be valid.
unsafe fn create_device(
    instance: &InstanceContext,
    winner: DeviceCandidate,
    request: QueueRequest,
    requirements: &DeviceRequirements,
) -> Result<Device> {
    let set = winner.queue_families;

    // One queue-create-info per unique family across the role assignments.
    let queue_priority = 1.0_f32;
    let unique_families = set.unique_families();
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
        .iter()
        .map(|&(family, _)| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(std::slice::from_ref(&queue_priority))
        })
        .collect();

    let extension_cstrings = to_cstrings(&requirements.extensions)?;
    let extension_names: Vec<*const i8> =
        extension_cstrings.iter().map(|e| e.as_ptr()).collect();
    let layer_cstrings = to_cstrings(&requirements.layers)?;
    let layer_names: Vec<*const i8> = layer_cstrings.iter().map(|l| l.as_ptr()).collect();

    let features = requirements.features.to_vk();

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .enabled_features(&features);

    let device = instance
        .handle()
        .create_device(winner.physical_device, &create_info, None)?;

    // One native handle per family; role wrappers alias them.
    let mut handles: Vec<(u32, vk::Queue)> = Vec::with_capacity(unique_families.len());
    for &(family, _) in &unique_families {
        handles.push((family, device.get_device_queue(family, 0)));
    }
    let queue_for = |family: Option<u32>, ops: Operations| -> Option<Queue> {
        let family = family?;
        handles
            .iter()
            .find(|&&(f, _)| f == family)
            .map(|&(_, handle)| Queue {
                handle,
                family,
                ops,
            })
    };

    let graphics_queue = queue_for(set.graphics.family, Operations::GRAPHICS);
    let present_queue = queue_for(set.present.family, Operations::PRESENTATION);
    let compute_queue = queue_for(set.compute.family, Operations::COMPUTE);
    let transfer_queue = queue_for(set.transfer.family, Operations::TRANSFER);

    debug_assert!(
        !request.requested().has(Operations::GRAPHICS) || graphics_queue.is_some(),
        "verified assignment lost its graphics family"
    );

    Ok(Device {
        device,
        physical_device: winner.physical_device,
        report: winner.report,
        queue_families: set,
        graphics_queue,
        present_queue,
        compute_queue,
        transfer_queue,
    })
}

fn to_cstrings(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|e| GpuError::InvalidState(e.to_string()))
        })
        .collect()
}

/// A constructed logical device with its role queues.
///
/// Owns the native device handle and destroys it on drop; all queues are
/// implicitly destroyed with it.
pub struct Device {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    report: DeviceReport,
    queue_families: QueueFamilySet,
    graphics_queue: Option<Queue>,
    present_queue: Option<Queue>,
    compute_queue: Option<Queue>,
    transfer_queue: Option<Queue>,
}

impl Device {
    /// Get the Vulkan device handle.
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Capability report of the selected device.
    pub fn report(&self) -> &DeviceReport {
        &self.report
    }

    /// The queue family assignment the device was built with.
    pub fn queue_families(&self) -> &QueueFamilySet {
        &self.queue_families
    }

    /// Graphics queue, if graphics was requested.
    pub fn graphics_queue(&self) -> Option<&Queue> {
        self.graphics_queue.as_ref()
    }

    /// Presentation queue; may alias the graphics queue.
    pub fn present_queue(&self) -> Option<&Queue> {
        self.present_queue.as_ref()
    }

    /// Compute queue; aliases the graphics queue when sharing synchronously.
    pub fn compute_queue(&self) -> Option<&Queue> {
        self.compute_queue.as_ref()
    }

    /// Compute queue only when it runs on a family distinct from graphics.
    pub fn async_compute_queue(&self) -> Option<&Queue> {
        if self.queue_families.compute.asynchronous {
            self.compute_queue.as_ref()
        } else {
            None
        }
    }

    /// Transfer queue; aliases the graphics queue when sharing synchronously.
    pub fn transfer_queue(&self) -> Option<&Queue> {
        self.transfer_queue.as_ref()
    }

    /// Transfer queue only when it runs on a family distinct from graphics.
    pub fn async_transfer_queue(&self) -> Option<&Queue> {
        if self.queue_families.transfer.asynchronous {
            self.transfer_queue.as_ref()
        } else {
            None
        }
    }

    /// Wait for the device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_strips_presentation_from_request() {
        let request = QueueRequest {
            supported: Operations::GRAPHICS | Operations::PRESENTATION,
            dedicated: Operations::PRESENTATION,
        };
        let effective = effective_request(request, true);

        assert_eq!(effective.supported, Operations::GRAPHICS);
        assert!(effective.dedicated.is_empty());

        let unchanged = effective_request(request, false);
        assert_eq!(unchanged, request);
    }

    #[test]
    fn builder_accumulates_requirements() {
        let builder = DeviceBuilder::new()
            .supported(Operations::GRAPHICS | Operations::COMPUTE)
            .dedicated(Operations::COMPUTE)
            .extension("VK_KHR_swapchain")
            .layer("VK_LAYER_KHRONOS_validation")
            .api_version(vk::make_api_version(0, 1, 3, 0));

        assert_eq!(
            builder.request.supported,
            Operations::GRAPHICS | Operations::COMPUTE
        );
        assert_eq!(builder.request.dedicated, Operations::COMPUTE);
        assert_eq!(builder.requirements.extensions, vec!["VK_KHR_swapchain"]);
        assert_eq!(
            builder.requirements.layers,
            vec!["VK_LAYER_KHRONOS_validation"]
        );
        assert_eq!(
            builder.requirements.api_version,
            vk::make_api_version(0, 1, 3, 0)
        );
    }
}
