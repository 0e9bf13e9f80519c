use log::{error, info};
use physarum::errors::PhysarumError;
use physarum::settings::{Settings, DEFAULT_SETTINGS_FILE};
use physarum::Simulation;
use std::sync::Arc;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

fn main() -> Result<(), PhysarumError> {
    env_logger::init();

    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = Settings::load_from_file(&settings_path)?;

    let event_loop = EventLoop::new()?;
    let window = {
        let size = LogicalSize::new(settings.width as f64, settings.height as f64);
        Arc::new(
            WindowBuilder::new()
                .with_title("Physarum")
                .with_inner_size(size)
                .with_min_inner_size(size)
                .with_resizable(false)
                .build(&event_loop)?,
        )
    };

    let mut simulation = Simulation::new(settings, Arc::clone(&window))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => elwt.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = simulation.advance_frame() {
                    error!("frame failed: {}", e);
                    elwt.exit();
                }
            }
            _ => (),
        },
        Event::AboutToWait => window.request_redraw(),
        _ => (),
    })?;

    info!("shutting down");
    Ok(())
}
