//! Physical device feature flags.
//!
//! Mirrors `vk::PhysicalDeviceFeatures` as plain booleans so requests and
//! reports can be compared field by field without touching `vk::Bool32`.

use ash::vk;

macro_rules! device_features {
    ($($field:ident),+ $(,)?) => {
        /// Boolean view of the core physical device feature block.
        ///
        /// Used both as a feature *request* (which flags the application
        /// needs) and as a feature *report* (which flags a device supports).
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        #[allow(missing_docs)]
        pub struct DeviceFeatures {
            $(pub $field: bool,)+
        }

        impl DeviceFeatures {
            /// Convert from the raw Vulkan feature block.
            pub fn from_vk(features: &vk::PhysicalDeviceFeatures) -> Self {
                Self {
                    $($field: features.$field == vk::TRUE,)+
                }
            }

            /// Convert back to the raw Vulkan feature block, for device creation.
            pub fn to_vk(self) -> vk::PhysicalDeviceFeatures {
                vk::PhysicalDeviceFeatures {
                    $($field: vk::Bool32::from(self.$field),)+
                    ..Default::default()
                }
            }

            /// Whether every flag set in `requested` is also set in `self`.
            ///
            /// Flags the application did not request are never checked.
            pub fn contains(self, requested: Self) -> bool {
                $((!requested.$field || self.$field))&&+
            }
        }
    };
}

device_features! {
    robust_buffer_access,
    full_draw_index_uint32,
    image_cube_array,
    independent_blend,
    geometry_shader,
    tessellation_shader,
    sample_rate_shading,
    dual_src_blend,
    logic_op,
    multi_draw_indirect,
    draw_indirect_first_instance,
    depth_clamp,
    depth_bias_clamp,
    fill_mode_non_solid,
    depth_bounds,
    wide_lines,
    large_points,
    alpha_to_one,
    multi_viewport,
    sampler_anisotropy,
    texture_compression_etc2,
    texture_compression_astc_ldr,
    texture_compression_bc,
    occlusion_query_precise,
    pipeline_statistics_query,
    vertex_pipeline_stores_and_atomics,
    fragment_stores_and_atomics,
    shader_tessellation_and_geometry_point_size,
    shader_image_gather_extended,
    shader_storage_image_extended_formats,
    shader_storage_image_multisample,
    shader_storage_image_read_without_format,
    shader_storage_image_write_without_format,
    shader_uniform_buffer_array_dynamic_indexing,
    shader_sampled_image_array_dynamic_indexing,
    shader_storage_buffer_array_dynamic_indexing,
    shader_storage_image_array_dynamic_indexing,
    shader_clip_distance,
    shader_cull_distance,
    shader_float64,
    shader_int64,
    shader_int16,
    shader_resource_residency,
    shader_resource_min_lod,
    sparse_binding,
    sparse_residency_buffer,
    sparse_residency_image2_d,
    sparse_residency_image3_d,
    sparse_residency2_samples,
    sparse_residency4_samples,
    sparse_residency8_samples,
    sparse_residency16_samples,
    sparse_residency_aliased,
    variable_multisample_rate,
    inherited_queries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_always_satisfied() {
        let report = DeviceFeatures::default();
        assert!(report.contains(DeviceFeatures::default()));
    }

    #[test]
    fn single_missing_flag_fails() {
        let request = DeviceFeatures {
            sampler_anisotropy: true,
            geometry_shader: true,
            ..Default::default()
        };
        let report = DeviceFeatures {
            sampler_anisotropy: true,
            ..Default::default()
        };
        assert!(!report.contains(request));
    }

    #[test]
    fn unrequested_flags_are_ignored() {
        let request = DeviceFeatures {
            shader_int64: true,
            ..Default::default()
        };
        let report = DeviceFeatures {
            shader_int64: true,
            sparse_binding: true,
            wide_lines: true,
            ..Default::default()
        };
        assert!(report.contains(request));
    }

    #[test]
    fn vk_round_trip_preserves_flags() {
        let features = DeviceFeatures {
            geometry_shader: true,
            shader_float64: true,
            ..Default::default()
        };
        let raw = features.to_vk();
        assert_eq!(raw.geometry_shader, vk::TRUE);
        assert_eq!(raw.tessellation_shader, vk::FALSE);
        assert_eq!(DeviceFeatures::from_vk(&raw), features);
    }
}
