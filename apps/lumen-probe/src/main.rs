//! Headless device selection probe.
//!
//! Bootstraps a Vulkan instance without a surface, runs device selection
//! with a graphics + compute + transfer request, and logs the winning
//! device report and queue family assignment.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p lumen-probe
//! ```

use anyhow::Context;
use ash::vk;
use tracing_subscriber::EnvFilter;

use lumen_gpu::{DeviceBuilder, InstanceConfig, InstanceContext, Operations};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let instance = InstanceContext::new(&InstanceConfig {
        app_name: "lumen-probe".to_string(),
        headless: true,
        ..Default::default()
    })
    .context("instance creation failed")?;

    tracing::info!(
        "Instance up: Vulkan {}.{}.{}",
        vk::api_version_major(instance.api_version()),
        vk::api_version_minor(instance.api_version()),
        vk::api_version_patch(instance.api_version()),
    );

    let device = DeviceBuilder::new()
        .supported(Operations::GRAPHICS | Operations::COMPUTE | Operations::TRANSFER)
        .api_version(vk::API_VERSION_1_1)
        .build(&instance, None)
        .context("device selection failed")?;

    let report = device.report();
    tracing::info!("Device: {}", report.summary());
    tracing::info!(
        "Limits: max image 2D {}, max bound descriptor sets {}",
        report.limits.max_image_dimension2_d,
        report.limits.max_bound_descriptor_sets,
    );

    let families = device.queue_families();
    tracing::info!("Graphics family: {:?}", families.graphics.family);
    tracing::info!(
        "Compute family:  {:?} (async: {})",
        families.compute.family,
        families.compute.asynchronous,
    );
    tracing::info!(
        "Transfer family: {:?} (async: {})",
        families.transfer.family,
        families.transfer.asynchronous,
    );

    device.wait_idle()?;
    Ok(())
}
