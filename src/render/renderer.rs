use cgmath::{Matrix4, Vector2, Vector3};
use log::info;
#[cfg(feature = "tracy")]
use tracy_client::span;
use wgpu::BindGroup;
use winit::window::Window as SysWindow;

use super::{
    consts::Consts,
    pipelines::{GlobalModel, Globals, GlobalsLayouts},
};
use crate::text::{TextRenderer, atlas::ATLAS_SIZE, atlas::SDF_PIXEL_RANGE};

pub struct Layouts {
    pub global: GlobalsLayouts,
}

pub struct Renderer<'a> {
    surface: wgpu::Surface<'a>,
    pub device: wgpu::Device,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: &'a SysWindow,
    pub config: wgpu::SurfaceConfiguration,
    pub queue: wgpu::Queue,
    pub layouts: Layouts,
    projection: Matrix4<f32>,
    world_units: Vector2<f32>,
    camera_position: Vector2<f32>,
    zoom: f32,
    clear_color: wgpu::Color,
}

impl<'a> Renderer<'a> {
    pub fn new(
        window: &'a SysWindow,
        present_mode: wgpu::PresentMode,
        world_units: [f32; 2],
        clear_color: [f32; 3],
    ) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // The surface must not outlive the window that created it; State owns
        // the window, so this is fine.
        let surface = instance.create_surface(window).unwrap();

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .unwrap();

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
            },
            None,
        ))
        .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let chosen_present_mode = Self::pick_present_mode(&surface_caps, present_mode);
        // The text shader assumes an sRGB surface; a linear format would wash
        // out the glyph edges.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: chosen_present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 1,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!("Using present mode: {:?}", chosen_present_mode);

        let layouts = Layouts {
            global: GlobalsLayouts::new(&device),
        };

        // World-unit coordinate system with the origin at the screen centre.
        let projection = cgmath::ortho(
            -world_units[0] / 2.0,
            world_units[0] / 2.0,
            -world_units[1] / 2.0,
            world_units[1] / 2.0,
            -1.0,
            1.0,
        );

        let clear_color = wgpu::Color {
            r: clear_color[0] as f64,
            g: clear_color[1] as f64,
            b: clear_color[2] as f64,
            a: 1.0,
        };

        Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            layouts,
            projection,
            world_units: Vector2::new(world_units[0], world_units[1]),
            camera_position: Vector2::new(0.0, 0.0),
            zoom: 1.0,
            clear_color,
        }
    }

    fn pick_present_mode(
        surface_caps: &wgpu::SurfaceCapabilities,
        requested: wgpu::PresentMode,
    ) -> wgpu::PresentMode {
        // Try the lowest-latency mode first while keeping the vsync intent.
        let prefer_vsync = matches!(requested, wgpu::PresentMode::AutoVsync);
        let preference: &[wgpu::PresentMode] = if prefer_vsync {
            &[
                wgpu::PresentMode::Mailbox,
                wgpu::PresentMode::Fifo,
                wgpu::PresentMode::AutoVsync,
            ]
        } else {
            &[
                wgpu::PresentMode::Immediate,
                wgpu::PresentMode::Mailbox,
                wgpu::PresentMode::Fifo,
                wgpu::PresentMode::AutoNoVsync,
            ]
        };

        let supported = &surface_caps.present_modes;
        preference
            .iter()
            .copied()
            .find(|mode| supported.contains(mode))
            .unwrap_or_else(|| {
                surface_caps
                    .present_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::PresentMode::Fifo)
            })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn camera_position(&self) -> Vector2<f32> {
        self.camera_position
    }

    pub fn set_camera_position(&mut self, position: Vector2<f32>) {
        self.camera_position = position;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    /// World units to physical pixels at zoom 1.
    pub fn eu_to_pixel(&self, size: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(
            (self.size.width as f32 / self.world_units.x) * size.x,
            (self.size.height as f32 / self.world_units.y) * size.y,
        )
    }

    pub fn bind_globals(&self, global_model: &GlobalModel) -> BindGroup {
        self.layouts.global.bind(&self.device, global_model)
    }

    pub fn create_consts<T: Copy + bytemuck::Pod>(&mut self, vals: &[T]) -> Consts<T> {
        let mut consts = Consts::new(&self.device, vals.len());
        consts.update(&self.queue, vals, 0);
        consts
    }

    /// Recompute and publish the shared frame uniforms from the current
    /// camera and zoom state.
    pub fn begin_frame(&mut self, globals: &mut Consts<Globals>) {
        #[cfg(feature = "tracy")]
        let _span = span!("update frame globals");

        let camera = Matrix4::from_nonuniform_scale(self.zoom, self.zoom, 1.0)
            * Matrix4::from_translation(Vector3::new(
                self.camera_position.x,
                self.camera_position.y,
                0.0,
            ));
        let view_proj: [[f32; 4]; 4] = (self.projection * camera).into();

        // Batch rendering has no per-letter quad size, so the distance-field
        // range is derived from a nominal 20-unit glyph, as in
        // https://github.com/Chlumsky/msdfgen for 2D rendering.
        let size_in_pixels = self.eu_to_pixel(Vector2::new(20.0, 20.0)) * self.zoom;
        let screen_px_range = (size_in_pixels.x / ATLAS_SIZE as f32) * SDF_PIXEL_RANGE;

        globals.update(
            &self.queue,
            &[Globals::new(view_proj, screen_px_range)],
            0,
        );
    }

    /// Issue one draw call per atlas that batched any glyphs this frame.
    pub fn render(
        &mut self,
        text: &mut TextRenderer,
        globals: &BindGroup,
    ) -> Result<(), wgpu::SurfaceError> {
        #[cfg(feature = "tracy")]
        let _span = span!("render frame");

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for atlas in text.loaded_atlases() {
                text.end_frame(&mut render_pass, globals, atlas);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
