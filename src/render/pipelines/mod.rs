use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, SquareMatrix};
use wgpu::BindGroup;

use super::consts::Consts;

#[repr(C)]
#[derive(Copy, Clone, Debug, Zeroable, Pod)]
pub struct Globals {
    /// World-to-clip transform: orthographic projection times the 2D camera
    /// (zoom then pan).
    view_proj: [[f32; 4]; 4],
    /// x = screen-pixel range fed to the SDF fragment shader, yzw = padding.
    screen_px_range: [f32; 4],
}

impl Globals {
    pub fn new(view_proj: [[f32; 4]; 4], screen_px_range: f32) -> Self {
        Self {
            view_proj,
            screen_px_range: [screen_px_range, 0.0, 0.0, 0.0],
        }
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new(Matrix4::identity().into(), 2.0)
    }
}

// Scene-wide data shared by every text draw call in a frame.
pub struct GlobalModel {
    pub globals: Consts<Globals>,
}

pub struct GlobalsLayouts {
    pub globals: wgpu::BindGroupLayout,
}

impl GlobalsLayouts {
    pub fn base_globals_layout() -> Vec<wgpu::BindGroupLayoutEntry> {
        vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }]
    }

    pub fn new(device: &wgpu::Device) -> Self {
        let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals layout"),
            entries: &Self::base_globals_layout(),
        });

        Self { globals }
    }

    pub fn bind(&self, device: &wgpu::Device, global_model: &GlobalModel) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &self.globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_model.globals.buf().as_entire_binding(),
            }],
        })
    }
}
