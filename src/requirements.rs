use std::ffi::CStr;

use ash::extensions::khr;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Hard requirements the application places on the instance and device.
///
/// Built once at startup and only read afterwards. `Default` follows the
/// build mode: debug builds request the Khronos validation layer, release
/// builds request nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSet {
    device_extensions: Vec<&'static CStr>,
    validation_layers: Vec<&'static CStr>,
    validation: bool,
}

impl RequirementSet {
    pub fn new(validation: bool) -> Self {
        let validation_layers = if validation {
            vec![VALIDATION_LAYER]
        } else {
            Vec::new()
        };
        Self {
            device_extensions: vec![khr::Swapchain::name()],
            validation_layers,
            validation,
        }
    }

    pub fn with_device_extension(mut self, name: &'static CStr) -> Self {
        if !self.device_extensions.contains(&name) {
            self.device_extensions.push(name);
        }
        self
    }

    pub fn device_extensions(&self) -> &[&'static CStr] {
        &self.device_extensions
    }

    /// Layer names to enable. Empty when validation is off.
    pub fn validation_layers(&self) -> &[&'static CStr] {
        &self.validation_layers
    }

    pub fn validation(&self) -> bool {
        self.validation
    }
}

impl Default for RequirementSet {
    fn default() -> Self {
        Self::new(cfg!(debug_assertions))
    }
}
