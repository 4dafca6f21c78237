//! Physical device ranking.

use ash::vk;

use crate::capabilities::DeviceReport;
use crate::queue_family::QueueFamilySet;

/// A physical device that survived capability and queue-family checks.
///
/// Transient: only the winning candidate's data is carried into the built
/// device.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    /// Raw physical device handle.
    pub physical_device: vk::PhysicalDevice,
    /// Capability report.
    pub report: DeviceReport,
    /// Queue family assignment computed for this device.
    pub queue_families: QueueFamilySet,
}

impl DeviceCandidate {
    /// Rank by device type. Discrete parts beat integrated beat software.
    pub fn rank(&self) -> u32 {
        match self.report.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
            vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
            vk::PhysicalDeviceType::VIRTUAL_GPU | vk::PhysicalDeviceType::CPU => 10,
            _ => 0,
        }
    }
}

/// Pick the best candidate from the viable set.
///
/// The first strictly-higher-ranking candidate wins, so enumeration order
/// breaks ties. Returns `None` when every candidate ranks zero.
pub fn select_candidate(candidates: Vec<DeviceCandidate>) -> Option<DeviceCandidate> {
    let mut best: Option<(DeviceCandidate, u32)> = None;
    for candidate in candidates {
        let rank = candidate.rank();
        if rank > best.as_ref().map_or(0, |&(_, r)| r) {
            best = Some((candidate, rank));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::GpuVendor;
    use crate::features::DeviceFeatures;

    fn candidate(name: &str, device_type: vk::PhysicalDeviceType) -> DeviceCandidate {
        DeviceCandidate {
            physical_device: vk::PhysicalDevice::null(),
            report: DeviceReport {
                device_name: name.to_string(),
                vendor: GpuVendor::Other(0),
                device_type,
                api_version: vk::make_api_version(0, 1, 3, 0),
                driver_version: 1,
                limits: vk::PhysicalDeviceLimits::default(),
                available_extensions: Default::default(),
                features: DeviceFeatures::default(),
            },
            queue_families: QueueFamilySet::default(),
        }
    }

    #[test]
    fn discrete_beats_integrated_regardless_of_order() {
        let winner = select_candidate(vec![
            candidate("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU),
            candidate("discrete", vk::PhysicalDeviceType::DISCRETE_GPU),
        ])
        .unwrap();
        assert_eq!(winner.report.device_name, "discrete");
    }

    #[test]
    fn earliest_enumerated_wins_ties() {
        let winner = select_candidate(vec![
            candidate("first", vk::PhysicalDeviceType::DISCRETE_GPU),
            candidate("second", vk::PhysicalDeviceType::DISCRETE_GPU),
        ])
        .unwrap();
        assert_eq!(winner.report.device_name, "first");
    }

    #[test]
    fn zero_ranked_candidates_are_rejected() {
        assert!(select_candidate(vec![candidate("other", vk::PhysicalDeviceType::OTHER)]).is_none());
        assert!(select_candidate(Vec::new()).is_none());
    }

    #[test]
    fn software_devices_rank_lowest_but_nonzero() {
        let winner = select_candidate(vec![
            candidate("cpu", vk::PhysicalDeviceType::CPU),
            candidate("other", vk::PhysicalDeviceType::OTHER),
        ])
        .unwrap();
        assert_eq!(winner.report.device_name, "cpu");
    }
}
