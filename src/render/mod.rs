pub mod buffer;
pub mod consts;
pub mod pipelines;
pub mod renderer;

pub trait Vertex: Copy + bytemuck::Pod {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a>;
}
