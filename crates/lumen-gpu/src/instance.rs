//! Vulkan instance creation.

use ash::vk;
use std::ffi::{CStr, CString};

use crate::error::{GpuError, Result};

/// Instance configuration.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Enable validation layers.
    pub validation: bool,
    /// Skip all presentation-related instance extensions.
    pub headless: bool,
    /// Target API version (packed major/minor/patch).
    pub api_version: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            app_name: "Lumen".to_string(),
            validation: cfg!(debug_assertions),
            headless: false,
            api_version: vk::API_VERSION_1_3,
        }
    }
}

/// Required instance extensions.
pub fn required_instance_extensions(headless: bool) -> Vec<&'static CStr> {
    if headless {
        return vec![
            #[cfg(target_os = "macos")]
            ash::khr::portability_enumeration::NAME,
        ];
    }

    vec![
        ash::khr::surface::NAME,
        #[cfg(target_os = "windows")]
        ash::khr::win32_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::xlib_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::wayland_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::ext::metal_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::khr::portability_enumeration::NAME,
    ]
}

/// Validation layers to enable in debug builds.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// A loaded Vulkan entry point plus the created instance.
///
/// Reports the negotiated runtime version and the extension/layer sets that
/// were actually enabled, so downstream selection never has to re-derive
/// them.
pub struct InstanceContext {
    // Entry must be kept alive for the lifetime of the instance
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
    api_version: u32,
    enabled_extensions: Vec<String>,
    enabled_layers: Vec<String>,
    headless: bool,
}

impl InstanceContext {
    /// Load the Vulkan entry point and create an instance.
    ///
    /// Failure to resolve the loader is fatal for the whole build attempt.
    pub fn new(config: &InstanceConfig) -> Result<Self> {
        let entry =
            unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        let runtime_version = unsafe { entry.try_enumerate_instance_version()? }
            .unwrap_or(vk::API_VERSION_1_0);
        let api_version = config.api_version.min(runtime_version);

        let app_name = CString::new(config.app_name.as_str())
            .map_err(|e| GpuError::InvalidState(e.to_string()))?;
        let engine_name = CString::new("Lumen")
            .map_err(|e| GpuError::InvalidState(e.to_string()))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(api_version);

        let extensions = required_instance_extensions(config.headless);
        let extension_names: Vec<*const i8> = extensions.iter().map(|ext| ext.as_ptr()).collect();

        // Check that requested layers are available; missing ones are
        // dropped with a warning rather than failing instance creation.
        let mut layers = if config.validation {
            validation_layers()
        } else {
            vec![]
        };
        let available_layers = unsafe { entry.enumerate_instance_layer_properties()? };
        layers.retain(|layer| {
            let found = available_layers.iter().any(|props| {
                let name = unsafe { CStr::from_ptr(props.layer_name.as_ptr()) };
                name == *layer
            });
            if !found {
                tracing::warn!("Validation layer {:?} not available", layer);
            }
            found
        });

        let layer_names: Vec<*const i8> = layers.iter().map(|l| l.as_ptr()).collect();

        // Required for MoltenVK on macOS
        #[cfg(target_os = "macos")]
        let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        #[cfg(not(target_os = "macos"))]
        let create_flags = vk::InstanceCreateFlags::empty();

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names)
            .flags(create_flags);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        tracing::debug!(
            "Created instance: Vulkan {}.{}.{}, {} extension(s), {} layer(s)",
            vk::api_version_major(api_version),
            vk::api_version_minor(api_version),
            vk::api_version_patch(api_version),
            extensions.len(),
            layers.len(),
        );

        Ok(Self {
            entry,
            instance,
            api_version,
            enabled_extensions: extensions
                .iter()
                .map(|ext| ext.to_string_lossy().into_owned())
                .collect(),
            enabled_layers: layers
                .iter()
                .map(|l| l.to_string_lossy().into_owned())
                .collect(),
            headless: config.headless,
        })
    }

    /// Get the raw entry point.
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Get the instance handle.
    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// Negotiated API version (the lower of requested and runtime).
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Instance extensions that were enabled.
    pub fn enabled_extensions(&self) -> &[String] {
        &self.enabled_extensions
    }

    /// Layers that were enabled.
    pub fn enabled_layers(&self) -> &[String] {
        &self.enabled_layers
    }

    /// Whether the instance was created without presentation support.
    pub fn headless(&self) -> bool {
        self.headless
    }
}

impl Drop for InstanceContext {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}
