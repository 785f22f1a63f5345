use std::time::Duration;

/// ShaderToy uniform block shared by every demo.
///
/// Laid out per std140 so the buffer can be copied straight into
/// `layout(std140) uniform ShaderToy { vec2 iResolution; vec2 iMouse; float iTime; }`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    _padding: [f32; 3],
}

/// Block members as `(name, glsl type)`, in buffer order.
pub const SHADERTOY_UNIFORMS: [(&str, &str); 3] = [
    ("iResolution", "vec2"),
    ("iMouse", "vec2"),
    ("iTime", "float"),
];

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            resolution: [800., 600.],
            mouse: [0.; 2],
            time: 0.,
            _padding: [0.; 3],
        }
    }
}

impl Uniforms {
    pub fn size() -> u32 {
        std::mem::size_of::<Self>() as _
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl std::fmt::Display for Uniforms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let time = Duration::from_secs_f32(self.time.max(0.));
        write!(
            f,
            "iTime:\t\t{:#.2?}\n\
             iResolution:\t{:?}\n\
             iMouse:\t\t{:.2?}\n",
            time, self.resolution, self.mouse,
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

/// Fullscreen quad, counter-clockwise from the bottom-left corner.
pub const QUAD: [Vertex; 4] = [
    Vertex { pos: [-1.0, -1.0, 0.0] },
    Vertex { pos: [1.0, -1.0, 0.0] },
    Vertex { pos: [1.0, 1.0, 0.0] },
    Vertex { pos: [-1.0, 1.0, 0.0] },
];

// Texture origin is the top-left texel, so `v` runs opposite to the GL layout
// and the sampled image keeps its orientation.
pub const TEXTURED_QUAD: [TexturedVertex; 4] = [
    TexturedVertex { pos: [-1.0, -1.0, 0.0], uv: [0.0, 1.0] },
    TexturedVertex { pos: [1.0, -1.0, 0.0], uv: [1.0, 1.0] },
    TexturedVertex { pos: [1.0, 1.0, 0.0], uv: [1.0, 0.0] },
    TexturedVertex { pos: [-1.0, 1.0, 0.0], uv: [0.0, 0.0] },
];

/// Two triangles covering the quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadLayout {
    /// `layout(location = 0) in vec3`
    Positions,
    /// `layout(location = 0) in vec3` + `layout(location = 1) in vec2`
    PositionsUv,
}

impl QuadLayout {
    pub fn stride(self) -> u64 {
        match self {
            QuadLayout::Positions => std::mem::size_of::<Vertex>() as _,
            QuadLayout::PositionsUv => std::mem::size_of::<TexturedVertex>() as _,
        }
    }

    pub fn vertex_bytes(self) -> &'static [u8] {
        match self {
            QuadLayout::Positions => bytemuck::cast_slice(&QUAD),
            QuadLayout::PositionsUv => bytemuck::cast_slice(&TEXTURED_QUAD),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    pub padded_bytes_per_row: u32,
    pub unpadded_bytes_per_row: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32, align: u32) -> Self {
        let bytes_per_pixel = std::mem::size_of::<[u8; 4]>() as u32;
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let padded_bytes_per_row_padding = (align - unpadded_bytes_per_row % align) % align;
        let padded_bytes_per_row = unpadded_bytes_per_row + padded_bytes_per_row_padding;
        Self {
            width,
            height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
        }
    }

    pub fn linear_size(&self) -> u64 {
        self.padded_bytes_per_row as u64 * self.height as u64
    }
}

/// Pixels read back from the GPU, rows padded to `dimensions.padded_bytes_per_row`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub dimensions: ImageDimensions,
    pub bgra: bool,
}
