use ash::vk;

use crate::{extensions::fixed_name, queue_family::QueueFamilies};

/// The physical device chosen for logical device creation, together with
/// the queue families it was accepted for.
///
/// Only [`DeviceSelector`](crate::selector::DeviceSelector) produces these.
#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_families: QueueFamilies,
}

impl PhysicalDevice {
    pub(crate) fn new(
        handle: vk::PhysicalDevice,
        properties: vk::PhysicalDeviceProperties,
        queue_families: QueueFamilies,
    ) -> Self {
        let name = device_name(&properties);
        Self {
            handle,
            name,
            properties,
            queue_families,
        }
    }
}

/// An unterminated name reads as empty.
pub fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    fixed_name(&properties.device_name)
        .to_string_lossy()
        .into_owned()
}
