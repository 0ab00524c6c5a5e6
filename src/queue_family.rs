use ash::{prelude::VkResult, vk};

use crate::query::CapabilityQuery;

/// The queue roles the application drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    Graphics,
    Present,
}

/// Per-role queue family indices as found so far on one device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn complete(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }

    /// Walks the device's queue families in index order, keeping the first
    /// graphics-capable and the first present-capable family. Stops as soon
    /// as both roles are filled, so a later family that could serve both is
    /// never preferred over two earlier ones.
    ///
    /// Missing roles are left unset; deciding whether that disqualifies
    /// the device is up to the caller.
    pub fn resolve<Q: CapabilityQuery + ?Sized>(
        query: &Q,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Self> {
        let mut indices = Self::default();

        for (index, family) in (0u32..).zip(query.queue_family_properties(physical_device)) {
            if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics = Some(index);
            }

            if indices.present.is_none()
                && query.surface_support(physical_device, index, surface)?
            {
                indices.present = Some(index);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }
}

/// Fully resolved queue families. Both roles may name the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn index(&self, role: QueueRole) -> u32 {
        match role {
            QueueRole::Graphics => self.graphics,
            QueueRole::Present => self.present,
        }
    }
}
