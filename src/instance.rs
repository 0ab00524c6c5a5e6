use std::{
    borrow::Cow,
    ffi::{c_void, CStr, CString},
};

use ash::{
    extensions::{ext, khr},
    vk,
};
use raw_window_handle::{HandleError, HasDisplayHandle, RawDisplayHandle};
use thiserror::Error;

use crate::{extensions, requirements::RequirementSet};

#[derive(Debug, Error)]
pub enum InstanceCreationError {
    #[error("Could not load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),
    #[error("Validation layers requested, but not available: {0:?}")]
    MissingValidationLayers(Vec<String>),
    #[error("Missing required instance extensions: {0:?}")]
    MissingExtensions(Vec<String>),
    #[error("Couldn't get display handle: {0}")]
    InvalidDisplayHandle(#[from] HandleError),
    #[error("No Vulkan surface extension for this display server")]
    UnsupportedPlatform,
    #[error("Application name contains an interior NUL")]
    InvalidAppName,
    #[error("Vulkan error creating instance: {0}")]
    Vulkan(#[from] vk::Result),
}

/// The loaded Vulkan entry points and instance.
///
/// Also owns the surface extension loader and, when validation is on, the
/// debug messenger. Objects created from an instance keep it alive through
/// an `Arc<Instance>`, so it is always destroyed last.
pub struct Instance {
    pub entry: ash::Entry,
    pub handle: ash::Instance,
    pub surface_functions: khr::Surface,
    debug_messenger: Option<(ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl Instance {
    pub fn new(
        app_name: &str,
        display: &impl HasDisplayHandle,
        requirements: &RequirementSet,
    ) -> Result<Self, InstanceCreationError> {
        let entry = unsafe { ash::Entry::load()? };

        // Layers are checked before anything else so a missing SDK is
        // reported as such and not as a device problem.
        if requirements.validation() {
            let available = entry.enumerate_instance_layer_properties()?;
            let missing = extensions::missing(requirements.validation_layers(), &available);
            if !missing.is_empty() {
                return Err(InstanceCreationError::MissingValidationLayers(missing));
            }
        }

        let mut required_extensions =
            surface_extensions(display.display_handle()?.as_raw())?.to_vec();
        if requirements.validation() {
            required_extensions.push(ext::DebugUtils::name());
        }
        let available = entry.enumerate_instance_extension_properties(None)?;
        let missing = extensions::missing(&required_extensions, &available);
        if !missing.is_empty() {
            return Err(InstanceCreationError::MissingExtensions(missing));
        }

        let application_name =
            CString::new(app_name).map_err(|_| InstanceCreationError::InvalidAppName)?;
        let application_info = vk::ApplicationInfo::builder()
            .application_name(&application_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"vkneg")
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let enabled_layer_names: Vec<_> = requirements
            .validation_layers()
            .iter()
            .map(|name| name.as_ptr())
            .collect();
        let enabled_extension_names: Vec<_> =
            required_extensions.iter().map(|name| name.as_ptr()).collect();

        // Chained into instance creation so create/destroy of the instance
        // itself is covered by validation too.
        let mut instance_debug_info = debug_messenger_info();
        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);
        if requirements.validation() {
            create_info = create_info.push_next(&mut instance_debug_info);
        }

        let handle = unsafe { entry.create_instance(&create_info, None)? };

        let debug_messenger = if requirements.validation() {
            let debug_utils = ext::DebugUtils::new(&entry, &handle);
            match unsafe {
                debug_utils.create_debug_utils_messenger(&debug_messenger_info(), None)
            } {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { handle.destroy_instance(None) };
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let surface_functions = khr::Surface::new(&entry, &handle);

        tracing::debug!(
            "Created instance {:?} (validation: {})",
            handle.handle(),
            requirements.validation()
        );

        Ok(Self {
            entry,
            handle,
            surface_functions,
            debug_messenger,
        })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        tracing::debug!("Dropping instance {:?}", self.handle.handle());
        if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
            unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        }
        unsafe { self.handle.destroy_instance(None) };
    }
}

/// Instance extensions needed to create a surface on this display server.
pub fn surface_extensions(
    display: RawDisplayHandle,
) -> Result<[&'static CStr; 2], InstanceCreationError> {
    let platform = match display {
        RawDisplayHandle::Windows(_) => khr::Win32Surface::name(),
        RawDisplayHandle::Xlib(_) => khr::XlibSurface::name(),
        RawDisplayHandle::Xcb(_) => khr::XcbSurface::name(),
        RawDisplayHandle::Wayland(_) => khr::WaylandSurface::name(),
        _ => return Err(InstanceCreationError::UnsupportedPlatform),
    };
    Ok([khr::Surface::name(), platform])
}

fn debug_messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(validation_callback))
        .build()
}

unsafe extern "system" fn validation_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        Cow::Borrowed("<no message>")
    } else {
        CStr::from_ptr((*p_callback_data).p_message).to_string_lossy()
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: "vkneg::validation", "[{:?}] {}", message_type, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: "vkneg::validation", "[{:?}] {}", message_type, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(target: "vkneg::validation", "[{:?}] {}", message_type, message)
        }
        _ => tracing::trace!(target: "vkneg::validation", "[{:?}] {}", message_type, message),
    }

    vk::FALSE
}
