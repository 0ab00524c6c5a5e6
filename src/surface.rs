use std::{ffi::c_void, sync::Arc};

use ash::{extensions::khr, prelude::VkResult, vk};
use raw_window_handle::{
    HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle,
};
use thiserror::Error;

use crate::{instance::Instance, query::CapabilityQuery};

#[derive(Debug, Error)]
pub enum CreateSurfaceError {
    #[error("Couldn't get display handle: {0}")]
    InvalidDisplayHandle(HandleError),
    #[error("Couldn't get window handle: {0}")]
    InvalidWindowHandle(HandleError),
    #[error("Window handle carries no display connection")]
    MissingDisplayConnection,
    #[error("Surface creation is not supported for this window system")]
    UnsupportedPlatform,
    #[error("Vulkan error creating surface: {0}")]
    Vulkan(#[from] vk::Result),
}

/// A presentation surface for a window.
///
/// The window must outlive the surface.
pub struct Surface {
    pub handle: vk::SurfaceKHR,
    pub instance: Arc<Instance>,
}

impl Surface {
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        instance: &Arc<Instance>,
    ) -> Result<Self, CreateSurfaceError> {
        let display = window
            .display_handle()
            .map_err(CreateSurfaceError::InvalidDisplayHandle)?
            .as_raw();
        let window = window
            .window_handle()
            .map_err(CreateSurfaceError::InvalidWindowHandle)?
            .as_raw();

        let (entry, handle) = (&instance.entry, &instance.handle);
        let surface = match (display, window) {
            (RawDisplayHandle::Windows(_), RawWindowHandle::Win32(window_handle)) => {
                let hinstance = window_handle.hinstance.map_or(0, |h| h.get()) as *const c_void;
                let hwnd = window_handle.hwnd.get() as *const c_void;
                unsafe {
                    khr::Win32Surface::new(entry, handle).create_win32_surface(
                        &vk::Win32SurfaceCreateInfoKHR::builder()
                            .hinstance(hinstance)
                            .hwnd(hwnd),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xlib(display_handle), RawWindowHandle::Xlib(window_handle)) => {
                let dpy = display_handle
                    .display
                    .ok_or(CreateSurfaceError::MissingDisplayConnection)?;
                unsafe {
                    khr::XlibSurface::new(entry, handle).create_xlib_surface(
                        &vk::XlibSurfaceCreateInfoKHR::builder()
                            .dpy(dpy.as_ptr().cast())
                            .window(window_handle.window),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xcb(display_handle), RawWindowHandle::Xcb(window_handle)) => {
                let connection = display_handle
                    .connection
                    .ok_or(CreateSurfaceError::MissingDisplayConnection)?;
                unsafe {
                    khr::XcbSurface::new(entry, handle).create_xcb_surface(
                        &vk::XcbSurfaceCreateInfoKHR::builder()
                            .connection(connection.as_ptr())
                            .window(window_handle.window.get()),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Wayland(display_handle), RawWindowHandle::Wayland(window_handle)) => unsafe {
                khr::WaylandSurface::new(entry, handle).create_wayland_surface(
                    &vk::WaylandSurfaceCreateInfoKHR::builder()
                        .display(display_handle.display.as_ptr())
                        .surface(window_handle.surface.as_ptr()),
                    None,
                )?
            },
            _ => return Err(CreateSurfaceError::UnsupportedPlatform),
        };

        Ok(Self {
            handle: surface,
            instance: instance.clone(),
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        tracing::debug!("Dropping surface {:?}", self.handle);
        unsafe {
            self.instance
                .surface_functions
                .destroy_surface(self.handle, None)
        };
    }
}

/// What a device can offer when presenting to one surface.
///
/// Read fresh for each (device, surface) pair; choosing among the formats
/// and present modes is left to swapchain construction.
#[derive(Debug, Clone, Default)]
pub struct SurfaceCapabilities {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceCapabilities {
    pub fn query<Q: CapabilityQuery + ?Sized>(
        query: &Q,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Self> {
        Ok(Self {
            capabilities: query.surface_capabilities(physical_device, surface)?,
            formats: query.surface_formats(physical_device, surface)?,
            present_modes: query.surface_present_modes(physical_device, surface)?,
        })
    }

    /// At least one format and one present mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

// vk structs don't implement PartialEq, so compare field by field.
impl PartialEq for SurfaceCapabilities {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.capabilities, &other.capabilities);
        a.min_image_count == b.min_image_count
            && a.max_image_count == b.max_image_count
            && extent_eq(a.current_extent, b.current_extent)
            && extent_eq(a.min_image_extent, b.min_image_extent)
            && extent_eq(a.max_image_extent, b.max_image_extent)
            && a.max_image_array_layers == b.max_image_array_layers
            && a.supported_transforms == b.supported_transforms
            && a.current_transform == b.current_transform
            && a.supported_composite_alpha == b.supported_composite_alpha
            && a.supported_usage_flags == b.supported_usage_flags
            && self.formats.len() == other.formats.len()
            && self
                .formats
                .iter()
                .zip(&other.formats)
                .all(|(a, b)| a.format == b.format && a.color_space == b.color_space)
            && self.present_modes == other.present_modes
    }
}

fn extent_eq(a: vk::Extent2D, b: vk::Extent2D) -> bool {
    a.width == b.width && a.height == b.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{handle, surface, Call, FakeDevice, FakeDriver};

    #[test]
    fn reads_every_format_and_present_mode_unfiltered() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let present_modes = vec![vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        let driver = FakeDriver::new(vec![FakeDevice::suitable("gpu")
            .formats(formats)
            .present_modes(present_modes.clone())]);

        let caps = SurfaceCapabilities::query(&driver, handle(0), surface()).unwrap();

        assert_eq!(caps.formats.len(), 2);
        assert_eq!(caps.formats[0].format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(caps.present_modes, present_modes);
        assert_eq!(caps.capabilities.min_image_count, 2);
        assert!(caps.is_adequate());
    }

    #[test]
    fn empty_formats_or_present_modes_are_inadequate() {
        let driver = FakeDriver::new(vec![
            FakeDevice::suitable("no formats").formats(vec![]),
            FakeDevice::suitable("no present modes").present_modes(vec![]),
        ]);

        for index in 0..2 {
            let caps = SurfaceCapabilities::query(&driver, handle(index), surface()).unwrap();
            assert!(!caps.is_adequate());
        }
    }

    #[test]
    fn repeated_queries_agree_and_are_not_cached() {
        let driver = FakeDriver::new(vec![FakeDevice::suitable("gpu")]);

        let first = SurfaceCapabilities::query(&driver, handle(0), surface()).unwrap();
        let second = SurfaceCapabilities::query(&driver, handle(0), surface()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            driver
                .calls()
                .iter()
                .filter(|call| matches!(call, Call::SurfaceFormats(_)))
                .count(),
            2
        );
    }
}
