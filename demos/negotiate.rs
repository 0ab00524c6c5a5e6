use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vkneg::{
    device::Device, instance::Instance, queue_family::QueueRole,
    requirements::RequirementSet, selector::DeviceSelector, surface::Surface,
};
use winit::{
    dpi::LogicalSize,
    event::{Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

struct Context {
    // Field order is drop order: device, then surface, then the instance.
    device: Device,
    _surface: Surface,
}

impl Context {
    fn new(window: &Window) -> anyhow::Result<Self> {
        let requirements = RequirementSet::default();
        let instance = Arc::new(Instance::new("negotiate", window, &requirements)?);
        let surface = Surface::new(window, &instance)?;

        let physical_device =
            DeviceSelector::new(&requirements).select(instance.as_ref(), surface.handle)?;
        let device = Device::new(instance, physical_device, &requirements)?;

        let graphics = device.queue(QueueRole::Graphics);
        let present = device.queue(QueueRole::Present);
        tracing::info!(
            "graphics queue {:?} (family {}), present queue {:?} (family {})",
            graphics.handle,
            graphics.family_index,
            present.handle,
            present.family_index
        );

        Ok(Self {
            device,
            _surface: surface,
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Learning Vulkan")
        .with_inner_size(LogicalSize::new(800, 600))
        .with_resizable(false)
        .build(&event_loop)?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let context = Context::new(&window)?;
    tracing::info!("Running on {}", context.device.physical_device.name);

    let mut context = Some(context);
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        }
        | Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                },
            ..
        } => {
            // Release Vulkan objects while the window is still alive.
            context.take();
            elwt.exit();
        }
        _ => (),
    })?;

    Ok(())
}
