//! Name-list checks for instance layers and device extensions.

use std::ffi::{c_char, CStr};

use ash::vk;

/// A driver-reported property record that carries a fixed-size name.
pub trait NamedProperty {
    fn name(&self) -> &CStr;
}

impl NamedProperty for vk::ExtensionProperties {
    fn name(&self) -> &CStr {
        fixed_name(&self.extension_name)
    }
}

impl NamedProperty for vk::LayerProperties {
    fn name(&self) -> &CStr {
        fixed_name(&self.layer_name)
    }
}

/// Reads a name from a fixed-size driver array, stopping at the array end
/// when no terminator is present.
pub(crate) fn fixed_name(raw: &[c_char]) -> &CStr {
    // SAFETY: c_char and u8 share size and alignment, and the slice covers
    // exactly the original array.
    let bytes = unsafe { std::slice::from_raw_parts(raw.as_ptr().cast::<u8>(), raw.len()) };
    CStr::from_bytes_until_nul(bytes).unwrap_or_default()
}

/// True iff every required name has an exact, case-sensitive match in
/// `available`. An empty requirement list is always satisfied.
pub fn is_subset<P: NamedProperty>(required: &[&CStr], available: &[P]) -> bool {
    required
        .iter()
        .all(|required| available.iter().any(|property| property.name() == *required))
}

/// The required names that have no match in `available`, in request order.
pub fn missing<P: NamedProperty>(required: &[&CStr], available: &[P]) -> Vec<String> {
    required
        .iter()
        .filter(|required| !available.iter().any(|property| property.name() == **required))
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}
