use std::marker::PhantomData;

use bytemuck::Pod;

/// GPU buffer with a fixed element capacity that can be rewritten in place.
pub struct DynamicBuffer<T: Copy + Pod> {
    pub buff: wgpu::Buffer,
    len: usize,
    phantom_data: PhantomData<T>,
}

impl<T: Copy + Pod> DynamicBuffer<T> {
    pub fn new(device: &wgpu::Device, len: usize, usage: wgpu::BufferUsages) -> Self {
        let buff = device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: (len * std::mem::size_of::<T>()) as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buff,
            len,
            phantom_data: PhantomData,
        }
    }

    /// Write `vals` starting at element `offset`. The caller keeps the
    /// capacity invariant; writes past `len` are a wgpu validation error.
    pub fn update(&self, queue: &wgpu::Queue, vals: &[T], offset: usize) {
        if !vals.is_empty() {
            queue.write_buffer(
                &self.buff,
                (offset * std::mem::size_of::<T>()) as u64,
                bytemuck::cast_slice(vals),
            )
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }
}
