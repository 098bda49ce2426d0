use crate::render::buffer::DynamicBuffer;
use bytemuck::Pod;

// Handle to a set of GPU-side values that stay fixed within one render pass.

pub struct Consts<T: Copy + Pod> {
    buf: DynamicBuffer<T>,
}

impl<T: Copy + Pod> Consts<T> {
    pub fn new(device: &wgpu::Device, len: usize) -> Self {
        Self {
            buf: DynamicBuffer::new(device, len, wgpu::BufferUsages::UNIFORM),
        }
    }

    // Update the GPU-side values represented by this handle.
    pub fn update(&mut self, queue: &wgpu::Queue, vals: &[T], offset: usize) {
        self.buf.update(queue, vals, offset)
    }

    pub fn buf(&self) -> &wgpu::Buffer {
        &self.buf.buff
    }
}
