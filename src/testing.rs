//! In-memory driver for exercising negotiation without a GPU.

use std::{cell::RefCell, ffi::c_char};

use ash::{
    prelude::VkResult,
    vk::{self, Handle},
};

use crate::query::CapabilityQuery;

pub fn extension(name: &str) -> vk::ExtensionProperties {
    let mut property = vk::ExtensionProperties::default();
    copy_name(&mut property.extension_name, name);
    property
}

pub fn layer(name: &str) -> vk::LayerProperties {
    let mut property = vk::LayerProperties::default();
    copy_name(&mut property.layer_name, name);
    property
}

fn copy_name(dst: &mut [c_char], name: &str) {
    assert!(name.len() < dst.len());
    for (dst, byte) in dst.iter_mut().zip(name.bytes()) {
        *dst = byte as c_char;
    }
}

pub fn handle(index: usize) -> vk::PhysicalDevice {
    vk::PhysicalDevice::from_raw(index as u64 + 1)
}

pub fn surface() -> vk::SurfaceKHR {
    vk::SurfaceKHR::from_raw(0xdead)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Enumerate,
    Properties(vk::PhysicalDevice),
    Features(vk::PhysicalDevice),
    QueueFamilies(vk::PhysicalDevice),
    Extensions(vk::PhysicalDevice),
    SurfaceSupport(vk::PhysicalDevice, u32),
    SurfaceCapabilities(vk::PhysicalDevice),
    SurfaceFormats(vk::PhysicalDevice),
    PresentModes(vk::PhysicalDevice),
}

impl Call {
    pub fn device(&self) -> Option<vk::PhysicalDevice> {
        match *self {
            Call::Enumerate => None,
            Call::Properties(device)
            | Call::Features(device)
            | Call::QueueFamilies(device)
            | Call::Extensions(device)
            | Call::SurfaceSupport(device, _)
            | Call::SurfaceCapabilities(device)
            | Call::SurfaceFormats(device)
            | Call::PresentModes(device) => Some(device),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub name: &'static str,
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    /// (capabilities, can present to the test surface)
    pub families: Vec<(vk::QueueFlags, bool)>,
    pub extensions: Vec<&'static str>,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub extension_query_fails: bool,
}

impl FakeDevice {
    /// A device with one graphics+present family that meets the default
    /// requirements.
    pub fn suitable(name: &'static str) -> Self {
        Self {
            name,
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            max_image_dimension_2d: 4096,
            geometry_shader: true,
            families: vec![(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, true)],
            extensions: vec!["VK_KHR_swapchain"],
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            extension_query_fails: false,
        }
    }

    pub fn families(mut self, families: Vec<(vk::QueueFlags, bool)>) -> Self {
        self.families = families;
        self
    }

    pub fn extensions(mut self, extensions: Vec<&'static str>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.formats = formats;
        self
    }

    pub fn present_modes(mut self, present_modes: Vec<vk::PresentModeKHR>) -> Self {
        self.present_modes = present_modes;
        self
    }

    pub fn discrete(mut self, max_image_dimension_2d: u32) -> Self {
        self.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
        self.max_image_dimension_2d = max_image_dimension_2d;
        self
    }

    pub fn failing_extension_query(mut self) -> Self {
        self.extension_query_fails = true;
        self
    }

    pub fn without_geometry_shader(mut self) -> Self {
        self.geometry_shader = false;
        self
    }
}

/// Serves [`FakeDevice`]s through [`CapabilityQuery`] and records every
/// call in order.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub devices: Vec<FakeDevice>,
    calls: RefCell<Vec<Call>>,
}

impl FakeDriver {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            calls: RefCell::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_for(&self, index: usize) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .copied()
            .filter(|call| call.device() == Some(handle(index)))
            .collect()
    }

    fn device(&self, physical_device: vk::PhysicalDevice) -> &FakeDevice {
        &self.devices[physical_device.as_raw() as usize - 1]
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl CapabilityQuery for FakeDriver {
    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.record(Call::Enumerate);
        Ok((0..self.devices.len()).map(handle).collect())
    }

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        self.record(Call::Properties(physical_device));
        let device = self.device(physical_device);
        let mut properties = vk::PhysicalDeviceProperties {
            device_type: device.device_type,
            ..Default::default()
        };
        properties.limits.max_image_dimension2_d = device.max_image_dimension_2d;
        copy_name(&mut properties.device_name, device.name);
        properties
    }

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        self.record(Call::Features(physical_device));
        vk::PhysicalDeviceFeatures {
            geometry_shader: self.device(physical_device).geometry_shader.into(),
            ..Default::default()
        }
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.record(Call::QueueFamilies(physical_device));
        self.device(physical_device)
            .families
            .iter()
            .map(|&(queue_flags, _)| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect()
    }

    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        self.record(Call::Extensions(physical_device));
        if self.device(physical_device).extension_query_fails {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        Ok(self
            .device(physical_device)
            .extensions
            .iter()
            .map(|name| extension(name))
            .collect())
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        self.record(Call::SurfaceSupport(physical_device, queue_family_index));
        Ok(self.device(physical_device).families[queue_family_index as usize].1)
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        self.record(Call::SurfaceCapabilities(physical_device));
        Ok(vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            ..Default::default()
        })
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        self.record(Call::SurfaceFormats(physical_device));
        Ok(self.device(physical_device).formats.clone())
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        self.record(Call::PresentModes(physical_device));
        Ok(self.device(physical_device).present_modes.clone())
    }
}
