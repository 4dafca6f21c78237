//! Device capability reporting and verification.

use ash::vk;
use std::collections::HashSet;
use std::ffi::{CStr, CString};

use crate::features::DeviceFeatures;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Read-only capability report for one physical device.
///
/// Mirrors what the driver reports; nothing here is negotiated or filtered.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    /// Device name.
    pub device_name: String,
    /// GPU vendor.
    pub vendor: GpuVendor,
    /// Device type (discrete, integrated, ...).
    pub device_type: vk::PhysicalDeviceType,
    /// Supported Vulkan API version (packed major/minor/patch).
    pub api_version: u32,
    /// Driver version.
    pub driver_version: u32,
    /// Device limits, verbatim from the driver.
    pub limits: vk::PhysicalDeviceLimits,
    /// Extensions the device reports, plus those contributed by enabled
    /// layers.
    pub available_extensions: HashSet<String>,
    /// Core feature flags the device supports.
    pub features: DeviceFeatures,
}

impl DeviceReport {
    /// Query a report from a physical device.
    ///
    /// The extension set is the union of what the device reports and what
    /// each enabled layer contributes on top.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        enabled_layers: &[String],
    ) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);
        let features = instance.get_physical_device_features(physical_device);

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();

        let mut available_extensions: HashSet<String> =
            extension_names(&extensions).collect();

        for layer in enabled_layers {
            let Ok(layer_name) = CString::new(layer.as_str()) else {
                continue;
            };
            match enumerate_layer_device_extensions(instance, physical_device, &layer_name) {
                Ok(layer_extensions) => {
                    available_extensions.extend(extension_names(&layer_extensions));
                }
                Err(e) => {
                    tracing::debug!("Layer {} extension query failed: {}", layer, e);
                }
            }
        }

        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        Self {
            device_name,
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            limits: properties.limits,
            available_extensions,
            features: DeviceFeatures::from_vk(&features),
        }
    }

    /// Get a human-readable summary of the device.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}) - Vulkan {}.{}.{}",
            self.device_name,
            self.vendor,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

/// Parse NUL-padded extension name fields into owned strings.
fn extension_names(props: &[vk::ExtensionProperties]) -> impl Iterator<Item = String> + '_ {
    props.iter().filter_map(|ext| {
        ext.extension_name_as_c_str()
            .ok()
            .and_then(|name| name.to_str().ok())
            .map(String::from)
    })
}

/// Enumerate the device extensions a single layer provides.
///
/// `ash` only wraps the NULL-layer form of the call, so this goes through
/// the raw function pointer with the layer name filled in.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn enumerate_layer_device_extensions(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    layer_name: &CStr,
) -> std::result::Result<Vec<vk::ExtensionProperties>, vk::Result> {
    let fp = instance.fp_v1_0().enumerate_device_extension_properties;

    let mut count = 0u32;
    (fp)(
        physical_device,
        layer_name.as_ptr(),
        &mut count,
        std::ptr::null_mut(),
    )
    .result()?;

    let mut properties = vec![vk::ExtensionProperties::default(); count as usize];
    (fp)(
        physical_device,
        layer_name.as_ptr(),
        &mut count,
        properties.as_mut_ptr(),
    )
    .result()?;
    properties.truncate(count as usize);

    Ok(properties)
}

/// What the application requires from a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceRequirements {
    /// Device extensions that must all be available.
    pub extensions: Vec<String>,
    /// Validation layers that must all be enabled on the instance.
    pub layers: Vec<String>,
    /// Feature flags that must all be supported.
    pub features: DeviceFeatures,
    /// Minimum API version (packed major/minor/patch).
    pub api_version: u32,
}

impl DeviceRequirements {
    /// Check a candidate report against these requirements.
    ///
    /// Pure predicate: all-or-nothing, no partial enablement. A single
    /// missing extension, layer, or feature flag rejects the device.
    pub fn verify(&self, report: &DeviceReport, enabled_layers: &[String]) -> bool {
        for extension in &self.extensions {
            if !report.available_extensions.contains(extension) {
                tracing::debug!(
                    "{}: missing extension {}",
                    report.device_name,
                    extension
                );
                return false;
            }
        }

        for layer in &self.layers {
            if !enabled_layers.contains(layer) {
                tracing::debug!("{}: layer {} not enabled", report.device_name, layer);
                return false;
            }
        }

        // Packed encodings order correctly under numeric comparison.
        if report.api_version < self.api_version {
            tracing::debug!(
                "{}: API version {} below requested {}",
                report.device_name,
                report.api_version,
                self.api_version
            );
            return false;
        }

        if !report.features.contains(self.features) {
            tracing::debug!("{}: missing requested features", report.device_name);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DeviceReport {
        DeviceReport {
            device_name: "Test GPU".to_string(),
            vendor: GpuVendor::Nvidia,
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::make_api_version(0, 1, 3, 0),
            driver_version: 1,
            limits: vk::PhysicalDeviceLimits::default(),
            available_extensions: ["VK_KHR_swapchain", "VK_KHR_maintenance4"]
                .into_iter()
                .map(String::from)
                .collect(),
            features: DeviceFeatures {
                sampler_anisotropy: true,
                ..Default::default()
            },
        }
    }

    fn named_extension(name: &str) -> vk::ExtensionProperties {
        let mut ext = vk::ExtensionProperties::default();
        for (i, byte) in name.bytes().enumerate() {
            ext.extension_name[i] = byte as std::ffi::c_char;
        }
        ext
    }

    #[test]
    fn vendor_identification() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
    }

    #[test]
    fn all_requirements_met_passes() {
        let requirements = DeviceRequirements {
            extensions: vec!["VK_KHR_swapchain".to_string()],
            layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            features: DeviceFeatures {
                sampler_anisotropy: true,
                ..Default::default()
            },
            api_version: vk::make_api_version(0, 1, 2, 0),
        };
        let enabled = vec!["VK_LAYER_KHRONOS_validation".to_string()];
        assert!(requirements.verify(&report(), &enabled));
    }

    #[test]
    fn one_missing_extension_rejects_device() {
        let requirements = DeviceRequirements {
            extensions: vec![
                "VK_KHR_swapchain".to_string(),
                "VK_KHR_ray_tracing_pipeline".to_string(),
            ],
            ..Default::default()
        };
        assert!(!requirements.verify(&report(), &[]));
    }

    #[test]
    fn version_comparison_is_numeric_on_packed_encoding() {
        let requirements = DeviceRequirements {
            api_version: vk::make_api_version(0, 1, 3, 100),
            ..Default::default()
        };
        assert!(!requirements.verify(&report(), &[]));

        let requirements = DeviceRequirements {
            api_version: vk::make_api_version(0, 1, 3, 0),
            ..Default::default()
        };
        assert!(requirements.verify(&report(), &[]));
    }

    #[test]
    fn layer_extensions_join_the_available_set() {
        // An extension provided only by an enabled layer must count as
        // available, exactly like a device-reported one.
        let device_extensions = [named_extension("VK_KHR_swapchain")];
        let layer_extensions = [named_extension("VK_EXT_debug_marker")];

        let mut available: std::collections::HashSet<String> =
            extension_names(&device_extensions).collect();
        available.extend(extension_names(&layer_extensions));

        let mut report = report();
        report.available_extensions = available;

        let requirements = DeviceRequirements {
            extensions: vec![
                "VK_KHR_swapchain".to_string(),
                "VK_EXT_debug_marker".to_string(),
            ],
            ..Default::default()
        };
        assert!(requirements.verify(&report, &[]));
    }

    #[test]
    fn missing_feature_rejects_device() {
        let requirements = DeviceRequirements {
            features: DeviceFeatures {
                sampler_anisotropy: true,
                geometry_shader: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!requirements.verify(&report(), &[]));
    }
}
