use anyhow::{Context, Result, bail};
use log::{error, info};
use winit::{
    dpi::PhysicalSize,
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::{State, core::config::AppConfig};

pub fn run() -> Result<()> {
    env_logger::init();

    let Some(font_path) = std::env::args().nth(1) else {
        bail!("usage: sdftext <path of font file>\ne.g. sdftext JupiteroidRegular.ttf");
    };

    info!("Booting sdftext");

    let config = AppConfig::load_or_default("config.json").unwrap_or_else(|err| {
        error!("Falling back to default config: {:?}", err);
        AppConfig::default()
    });

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let window = WindowBuilder::new()
        .with_title("sdftext")
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
        .build(&event_loop)
        .context("failed to create window")?;

    let mut state = State::new(&window, config, &font_path)?;

    event_loop.run(
        move |event, elwt: &winit::event_loop::EventLoopWindowTarget<()>| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                state.handle_window_event(event, elwt)
            }
            Event::AboutToWait => {
                state.handle_wait(elwt);
            }
            _ => (),
        },
    )?;

    Ok(())
}
