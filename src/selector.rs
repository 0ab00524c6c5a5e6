//! Physical device selection.
//!
//! [`DeviceSelector`] filters candidates in enumeration order. A candidate
//! is rejected at the first check it fails and is not queried further:
//!
//! 1. queue families must cover graphics and presentation,
//! 2. every required device extension must be available,
//! 3. the surface must offer at least one format and one present mode.
//!
//! Which of the surviving candidates wins is up to the [`SelectionPolicy`].

use std::fmt;

use ash::{prelude::VkResult, vk};
use thiserror::Error;

use crate::{
    extensions,
    physical_device::PhysicalDevice,
    query::CapabilityQuery,
    queue_family::{QueueFamilies, QueueFamilyIndices},
    requirements::RequirementSet,
    surface::SurfaceCapabilities,
};

#[derive(Debug, Error)]
pub enum SelectDeviceError {
    #[error("Failed to find GPUs with Vulkan support")]
    NoDevicesEnumerated,
    #[error("Failed to find a suitable GPU among {candidates} device(s)")]
    NoSuitableDevice { candidates: usize },
    #[error("Vulkan error while selecting a physical device: {0}")]
    Vulkan(#[from] vk::Result),
}

/// Why a candidate was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    IncompleteQueueFamilies,
    MissingExtensions,
    InadequateSurface,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::IncompleteQueueFamilies => "no graphics or no present queue family",
            Rejection::MissingExtensions => "required device extensions missing",
            Rejection::InadequateSurface => "no surface formats or present modes",
        })
    }
}

/// A device that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub handle: vk::PhysicalDevice,
    pub queue_families: QueueFamilies,
}

/// Picks one device out of the suitable candidates.
///
/// `suitable` is lazy: candidates are only evaluated as the policy pulls
/// them, so a policy that stops early leaves later devices untouched.
pub trait SelectionPolicy {
    fn choose<Q, I>(&self, query: &Q, suitable: I) -> VkResult<Option<Candidate>>
    where
        Q: CapabilityQuery + ?Sized,
        I: Iterator<Item = VkResult<Candidate>>;
}

/// Takes the first suitable device in enumeration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstMatch;

impl SelectionPolicy for FirstMatch {
    fn choose<Q, I>(&self, _query: &Q, mut suitable: I) -> VkResult<Option<Candidate>>
    where
        Q: CapabilityQuery + ?Sized,
        I: Iterator<Item = VkResult<Candidate>>,
    {
        suitable.next().transpose()
    }
}

/// Evaluates every suitable device and takes the highest [`rate`]d one.
/// Ties go to the later device; a best score of zero selects nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RatedMatch;

/// Zero without geometry shader support, otherwise the maximum 2D image
/// dimension plus 1000 for a discrete GPU.
pub fn rate(
    properties: &vk::PhysicalDeviceProperties,
    features: &vk::PhysicalDeviceFeatures,
) -> u32 {
    if features.geometry_shader == vk::FALSE {
        return 0;
    }

    let mut score = properties.limits.max_image_dimension2_d;
    if properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        score = score.saturating_add(1000);
    }
    score
}

impl SelectionPolicy for RatedMatch {
    fn choose<Q, I>(&self, query: &Q, suitable: I) -> VkResult<Option<Candidate>>
    where
        Q: CapabilityQuery + ?Sized,
        I: Iterator<Item = VkResult<Candidate>>,
    {
        let mut best: Option<(u32, Candidate)> = None;
        for candidate in suitable {
            let candidate = candidate?;
            let score = rate(
                &query.properties(candidate.handle),
                &query.features(candidate.handle),
            );
            tracing::debug!("Physical device {:?} scored {}", candidate.handle, score);
            if best.map_or(true, |(best_score, _)| score >= best_score) {
                best = Some((score, candidate));
            }
        }

        Ok(best
            .filter(|&(score, _)| score > 0)
            .map(|(_, candidate)| candidate))
    }
}

pub struct DeviceSelector<'a, P = FirstMatch> {
    requirements: &'a RequirementSet,
    policy: P,
}

impl<'a> DeviceSelector<'a> {
    pub fn new(requirements: &'a RequirementSet) -> Self {
        Self {
            requirements,
            policy: FirstMatch,
        }
    }
}

impl<'a, P: SelectionPolicy> DeviceSelector<'a, P> {
    pub fn with_policy<R: SelectionPolicy>(self, policy: R) -> DeviceSelector<'a, R> {
        DeviceSelector {
            requirements: self.requirements,
            policy,
        }
    }

    /// Runs the three checks against one device, stopping at the first
    /// failure.
    pub fn evaluate<Q: CapabilityQuery + ?Sized>(
        &self,
        query: &Q,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Result<Candidate, Rejection>> {
        let Some(queue_families) =
            QueueFamilyIndices::resolve(query, physical_device, surface)?.complete()
        else {
            return Ok(Err(Rejection::IncompleteQueueFamilies));
        };

        let available = query.device_extension_properties(physical_device)?;
        if !extensions::is_subset(self.requirements.device_extensions(), &available) {
            return Ok(Err(Rejection::MissingExtensions));
        }

        if !SurfaceCapabilities::query(query, physical_device, surface)?.is_adequate() {
            return Ok(Err(Rejection::InadequateSurface));
        }

        Ok(Ok(Candidate {
            handle: physical_device,
            queue_families,
        }))
    }

    pub fn select<Q: CapabilityQuery + ?Sized>(
        &self,
        query: &Q,
        surface: vk::SurfaceKHR,
    ) -> Result<PhysicalDevice, SelectDeviceError> {
        let devices = query.enumerate_physical_devices()?;
        if devices.is_empty() {
            return Err(SelectDeviceError::NoDevicesEnumerated);
        }

        let suitable = devices.iter().filter_map(|&physical_device| {
            match self.evaluate(query, physical_device, surface) {
                Ok(Ok(candidate)) => Some(Ok(candidate)),
                Ok(Err(rejection)) => {
                    tracing::debug!(
                        "Rejected physical device {:?}: {}",
                        physical_device,
                        rejection
                    );
                    None
                }
                Err(e) => Some(Err(e)),
            }
        });

        let candidate = self
            .policy
            .choose(query, suitable)?
            .ok_or(SelectDeviceError::NoSuitableDevice {
                candidates: devices.len(),
            })?;

        let physical_device = PhysicalDevice::new(
            candidate.handle,
            query.properties(candidate.handle),
            candidate.queue_families,
        );
        tracing::info!(
            "Selected physical device {} ({:?}), queue families {:?}",
            physical_device.name,
            physical_device.properties.device_type,
            physical_device.queue_families
        );
        Ok(physical_device)
    }
}
