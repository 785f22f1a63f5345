#![warn(unsafe_op_in_unsafe_fn)]

mod renderer;

pub use renderer::{is_bgra, is_capturable, pick_surface_format, RendererInfo, WgpuRender};
pub use shadetoy_types::QuadLayout;
pub use wgpu::SurfaceError;

/// Compiled shaders of one fullscreen-quad draw.
#[derive(Debug, Clone, Copy)]
pub struct PassDescriptor<'a> {
    pub label: &'a str,
    pub vert: &'a [u32],
    pub frag: &'a [u32],
    pub quad: QuadLayout,
    /// Either stage reads the ShaderToy block at set 0.
    pub uses_uniforms: bool,
    /// Fragment stage reads the previous pass through set 1.
    pub samples_input: bool,
}
