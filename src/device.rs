use std::{collections::BTreeSet, ffi::c_char, sync::Arc};

use ash::vk;
use thiserror::Error;

use crate::{
    instance::Instance,
    physical_device::PhysicalDevice,
    query::CapabilityQuery,
    queue_family::{QueueFamilies, QueueRole},
    requirements::RequirementSet,
};

static QUEUE_PRIORITIES: [f32; 1] = [1.0];

#[derive(Debug, Error)]
pub enum CreateDeviceError {
    #[error("Failed to create logical device: {0}")]
    Creation(#[from] vk::Result),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queue {
    pub handle: vk::Queue,
    pub family_index: u32,
}

/// One queue-creation request: a single queue from one family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub priorities: &'static [f32],
}

/// One request per distinct family. Roles sharing a family share a
/// request, so graphics and present on the same family yield one entry.
pub fn queue_requests(queue_families: &QueueFamilies) -> Vec<QueueRequest> {
    [queue_families.graphics, queue_families.present]
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|family_index| QueueRequest {
            family_index,
            priorities: &QUEUE_PRIORITIES,
        })
        .collect()
}

/// Everything `vkCreateDevice` is given for one physical device.
///
/// Name pointers refer to `'static` strings and queue priorities to a
/// static array, so the plan stays valid for as long as it is held.
#[derive(Debug, Clone)]
pub struct DeviceCreatePlan {
    pub queue_create_infos: Vec<vk::DeviceQueueCreateInfo>,
    pub features: vk::PhysicalDeviceFeatures,
    pub enabled_extension_names: Vec<*const c_char>,
    /// Mirrors the instance layers when validation is on, empty otherwise.
    pub enabled_layer_names: Vec<*const c_char>,
}

impl DeviceCreatePlan {
    /// Features are taken exactly as the device reports them.
    pub fn new<Q: CapabilityQuery + ?Sized>(
        query: &Q,
        physical_device: &PhysicalDevice,
        requirements: &RequirementSet,
    ) -> Self {
        let queue_create_infos = queue_requests(&physical_device.queue_families)
            .iter()
            .map(|request| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(request.family_index)
                    .queue_priorities(request.priorities)
                    .build()
            })
            .collect();

        let enabled_extension_names = requirements
            .device_extensions()
            .iter()
            .map(|name| name.as_ptr())
            .collect();
        let enabled_layer_names = if requirements.validation() {
            requirements
                .validation_layers()
                .iter()
                .map(|name| name.as_ptr())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            queue_create_infos,
            features: query.features(physical_device.handle),
            enabled_extension_names,
            enabled_layer_names,
        }
    }
}

/// A logical device and the queues it was created with.
///
/// Holds the instance alive, so the device is always destroyed first.
pub struct Device {
    pub handle: ash::Device,
    pub instance: Arc<Instance>,
    pub physical_device: PhysicalDevice,
    graphics_queue: Queue,
    present_queue: Queue,
}

impl Device {
    /// Creates the logical device for a selected physical device from its
    /// [`DeviceCreatePlan`].
    pub fn new(
        instance: Arc<Instance>,
        physical_device: PhysicalDevice,
        requirements: &RequirementSet,
    ) -> Result<Self, CreateDeviceError> {
        let plan = DeviceCreatePlan::new(instance.as_ref(), &physical_device, requirements);

        // Device layers are deprecated but still honoured by older loaders.
        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&plan.queue_create_infos)
            .enabled_features(&plan.features)
            .enabled_extension_names(&plan.enabled_extension_names)
            .enabled_layer_names(&plan.enabled_layer_names);

        let handle = unsafe {
            instance
                .handle
                .create_device(physical_device.handle, &create_info, None)?
        };

        let queue = |role: QueueRole| {
            let family_index = physical_device.queue_families.index(role);
            Queue {
                handle: unsafe { handle.get_device_queue(family_index, 0) },
                family_index,
            }
        };
        let graphics_queue = queue(QueueRole::Graphics);
        let present_queue = queue(QueueRole::Present);

        tracing::info!(
            "Created logical device {:?} on {} with {} queue(s)",
            handle.handle(),
            physical_device.name,
            plan.queue_create_infos.len()
        );

        Ok(Self {
            handle,
            instance,
            physical_device,
            graphics_queue,
            present_queue,
        })
    }

    /// The queue bound to `role`. Both roles return the same queue when
    /// they share a family.
    pub fn queue(&self, role: QueueRole) -> Queue {
        match role {
            QueueRole::Graphics => self.graphics_queue,
            QueueRole::Present => self.present_queue,
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        tracing::debug!("Dropping device {:?}", self.handle.handle());
        unsafe { self.handle.destroy_device(None) };
    }
}
