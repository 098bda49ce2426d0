pub mod core;
pub mod launcher;
pub mod render;
pub mod text;

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use cgmath::Vector2;
use glam::Vec3;
use log::error;
#[cfg(feature = "tracy")]
use tracy_client::{frame_mark, span};
use wgpu::BindGroup;
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::EventLoopWindowTarget,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::core::config::AppConfig;
use render::{
    pipelines::{GlobalModel, Globals},
    renderer::Renderer,
};
use text::{AtlasId, TextRenderer};

#[derive(Default)]
struct PanInput {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

pub struct State<'a> {
    pub window: &'a Window,
    renderer: Renderer<'a>,
    pub config: AppConfig,
    pub data: GlobalModel,
    pub globals_bind_group: BindGroup,
    text: TextRenderer,
    font: AtlasId,
    pan: PanInput,
    last_frame_time: Instant,
    frame_target: Option<Duration>,
    fps_counter: u32,
    fps_display: u32,
    last_fps_time: Instant,
}

impl<'a> State<'a> {
    pub fn new(window: &'a Window, config: AppConfig, font_path: &str) -> Result<Self> {
        let frame_target = config.target_frame_time();
        let mut renderer = Renderer::new(
            window,
            config.present_mode(),
            config.window.world_units,
            config.graphics.clear_color,
        );

        let data = GlobalModel {
            globals: renderer.create_consts(&[Globals::default()]),
        };
        let globals_bind_group = renderer.bind_globals(&data);

        let mut text = TextRenderer::new(
            &renderer.device,
            &renderer.queue,
            renderer.config.format,
            &renderer.layouts.global.globals,
        );
        let font = text.load_font(font_path)?;

        Ok(Self {
            window,
            renderer,
            config,
            data,
            globals_bind_group,
            text,
            font,
            pan: PanInput::default(),
            last_frame_time: Instant::now(),
            frame_target,
            fps_counter: 0,
            fps_display: 0,
            last_fps_time: Instant::now(),
        })
    }

    pub fn handle_wait(&mut self, _elwt: &EventLoopWindowTarget<()>) {
        self.window.request_redraw();
    }

    pub fn handle_window_event(&mut self, event: WindowEvent, elwt: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => elwt.exit(),

            WindowEvent::Resized(physical_size) => {
                self.renderer.resize(physical_size);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(elwt);
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                match code {
                    KeyCode::Escape if pressed => elwt.exit(),
                    KeyCode::KeyA | KeyCode::ArrowLeft => self.pan.left = pressed,
                    KeyCode::KeyD | KeyCode::ArrowRight => self.pan.right = pressed,
                    KeyCode::KeyW | KeyCode::ArrowUp => self.pan.up = pressed,
                    KeyCode::KeyS | KeyCode::ArrowDown => self.pan.down = pressed,
                    _ => {}
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y.signum() as f32,
                };
                self.renderer.set_zoom(self.renderer.zoom() + steps);
            }

            _ => {}
        }
    }

    fn update(&mut self, dt: Duration) {
        let step = self.config.input.pan_speed * dt.as_secs_f32();
        let mut change = Vector2::new(0.0, 0.0);
        if self.pan.left {
            change.x -= step;
        }
        if self.pan.right {
            change.x += step;
        }
        if self.pan.up {
            change.y += step;
        }
        if self.pan.down {
            change.y -= step;
        }
        self.renderer
            .set_camera_position(self.renderer.camera_position() + change);
    }

    fn draw_scene(&mut self) {
        let white = [1.0, 1.0, 1.0, 1.0];
        let green = [0.0, 1.0, 0.0, 1.0];

        self.text.draw_text(
            self.font,
            "Controls\n\tMove camera:\n\t\twasd/arrowkeys\n\tZoom:\n\t\tscrollwheel",
            Vec3::new(-80.0, 30.0, 0.0),
            2.0,
            white,
            false,
        );
        self.text.draw_text(
            self.font,
            "LEFT aligned",
            Vec3::new(0.0, 10.0, 0.0),
            10.0,
            green,
            false,
        );
        self.text.draw_text(
            self.font,
            "I'm a centered text\nwith several\nrows!",
            Vec3::new(0.0, -20.0, 0.0),
            4.0,
            white,
            true,
        );

        let stress = format!("Render this {} times", self.config.debug.stress_draws);
        for i in 0..self.config.debug.stress_draws {
            self.text.draw_text(
                self.font,
                &stress,
                Vec3::new(0.0, -(i as f32) * 0.1, 0.0),
                10.0,
                white,
                true,
            );
        }

        if self.config.debug.show_fps {
            let fps = format!("{} fps", self.fps_display);
            self.text
                .draw_text(self.font, &fps, Vec3::new(-79.0, 42.0, 0.0), 2.0, green, false);
        }
    }

    fn render_frame(&mut self, elwt: &EventLoopWindowTarget<()>) {
        #[cfg(feature = "tracy")]
        let _span = span!("redraw request");

        let mut now = Instant::now();
        if let Some(target) = self.frame_target {
            let next_frame_time = self.last_frame_time + target;
            if now < next_frame_time {
                thread::sleep(next_frame_time - now);
                now = Instant::now();
            }
        }

        let mut elapsed = now - self.last_frame_time;
        if elapsed.as_secs_f32() > 0.25 {
            elapsed = Duration::from_millis(250);
        }
        self.last_frame_time = now;

        if now - self.last_fps_time >= Duration::from_secs(1) {
            self.fps_display = self.fps_counter;
            self.fps_counter = 0;
            self.last_fps_time = now;
        }

        #[cfg(feature = "tracy")]
        frame_mark();

        self.update(elapsed);

        // Reset batch counts and publish this frame's uniforms, then batch
        // the scene's text and flush one draw call per atlas.
        self.renderer.begin_frame(&mut self.data.globals);
        self.text.begin_frame();
        self.draw_scene();

        match self.renderer.render(&mut self.text, &self.globals_bind_group) {
            Ok(_) => {}
            // Reconfigure the surface if lost
            Err(wgpu::SurfaceError::Lost) => self.renderer.resize(self.renderer.size),
            // The system is out of memory, we should probably quit
            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
            // All other errors (Outdated, Timeout) should be resolved by the next frame
            Err(e) => error!("{:?}", e),
        }

        self.fps_counter += 1;
    }
}
