mod offscreen;
mod screenshot;

use std::{fmt::Display, ops::Index};

use color_eyre::{eyre::bail, eyre::eyre, Result};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use shadetoy_types::{Frame, QuadLayout, Uniforms, QUAD_INDICES};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Adapter, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, Buffer, Device,
    PrimitiveState, PrimitiveTopology, Queue, RenderPipeline, Surface, TextureFormat, TextureView,
};

use crate::PassDescriptor;
use offscreen::OffscreenTarget;
use screenshot::ScreenshotCtx;

pub use screenshot::{is_bgra, is_capturable};

trait Descriptor<'a, const N: usize> {
    const DESC: [BindGroupLayoutDescriptor<'a>; N];

    fn binding_group(device: &Device) -> [BindGroupLayout; N] {
        Self::DESC.map(|x| device.create_bind_group_layout(&x))
    }
}

#[derive(Debug)]
struct RenderPipelineLayoutInfo;
impl<'a> RenderPipelineLayoutInfo {
    const N: usize = 2;
    const DESC: [BindGroupLayoutDescriptor<'a>; Self::N] = [
        wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniforms Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        },
        wgpu::BindGroupLayoutDescriptor {
            label: Some("Input Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        },
    ];
}

impl<'a> Descriptor<'a, { Self::N }> for RenderPipelineLayoutInfo {
    const DESC: [BindGroupLayoutDescriptor<'a>; Self::N] = Self::DESC;
}

enum Binding {
    Uniforms,
    Texture,
}

impl<const N: usize> Index<Binding> for [BindGroupLayout; N] {
    type Output = BindGroupLayout;

    fn index(&self, index: Binding) -> &Self::Output {
        match index {
            Binding::Uniforms => &self[0],
            Binding::Texture => &self[1],
        }
    }
}

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const TEXTURED_QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

struct Pass {
    pipeline: RenderPipeline,
    quad: QuadLayout,
    binds_uniforms: bool,
    samples_input: bool,
}

/// Leading bind groups a pass declares: set 0 holds the uniforms, set 1 the
/// input texture. Set 1 needs set 0 in the layout even when the block goes
/// unused.
fn bind_group_count(uses_uniforms: bool, samples_input: bool) -> usize {
    match (uses_uniforms, samples_input) {
        (_, true) => 2,
        (true, false) => 1,
        (false, false) => 0,
    }
}

/// Picks an 8-bit RGBA/BGRA surface format, linear before sRGB. Any other
/// format is a last resort and cannot be captured.
pub fn pick_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    const PREFERRED: [TextureFormat; 4] = [
        TextureFormat::Bgra8Unorm,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Rgba8UnormSrgb,
    ];
    PREFERRED
        .into_iter()
        .find(|format| formats.contains(format))
        .or_else(|| formats.first().copied())
}

pub struct WgpuRender {
    adapter: Adapter,
    pub device: Device,
    pub surface: Surface,
    surface_config: wgpu::SurfaceConfiguration,
    queue: Queue,
    format: TextureFormat,

    layouts: [BindGroupLayout; RenderPipelineLayoutInfo::N],
    uniform_buffer: Buffer,
    uniform_bind_group: BindGroup,
    quad_buffer: Buffer,
    textured_quad_buffer: Buffer,
    index_buffer: Buffer,
    sampler: wgpu::Sampler,

    scene: Option<Pass>,
    composite: Option<Pass>,
    offscreen: OffscreenTarget,

    screenshot_ctx: ScreenshotCtx,
}

#[derive(Debug)]
pub struct RendererInfo {
    pub device_name: String,
    pub device_type: String,
    pub vendor_name: String,
    pub backend: String,
}

impl Display for RendererInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Vendor name: {}", self.vendor_name)?;
        writeln!(f, "Device name: {}", self.device_name)?;
        writeln!(f, "Device type: {}", self.device_type)?;
        writeln!(f, "Backend: {}", self.backend)?;
        Ok(())
    }
}

impl WgpuRender {
    pub fn get_info(&self) -> RendererInfo {
        let info = self.adapter.get_info();
        RendererInfo {
            device_name: info.name,
            device_type: self.get_device_type().to_string(),
            vendor_name: self.get_vendor_name().to_string(),
            backend: self.get_backend().to_string(),
        }
    }
    fn get_vendor_name(&self) -> &str {
        match self.adapter.get_info().vendor {
            0x1002 => "AMD",
            0x1010 => "ImgTec",
            0x10DE => "NVIDIA Corporation",
            0x13B5 => "ARM",
            0x5143 => "Qualcomm",
            0x8086 => "INTEL Corporation",
            _ => "Unknown vendor",
        }
    }
    fn get_backend(&self) -> &str {
        match self.adapter.get_info().backend {
            wgpu::Backend::Empty => "Empty",
            wgpu::Backend::Vulkan => "Vulkan",
            wgpu::Backend::Metal => "Metal",
            wgpu::Backend::Dx12 => "Dx12",
            wgpu::Backend::Dx11 => "Dx11",
            wgpu::Backend::Gl => "GL",
            wgpu::Backend::BrowserWebGpu => "Browser WGPU",
        }
    }
    fn get_device_type(&self) -> &str {
        match self.adapter.get_info().device_type {
            wgpu::DeviceType::Other => "Other",
            wgpu::DeviceType::IntegratedGpu => "Integrated GPU",
            wgpu::DeviceType::DiscreteGpu => "Discrete GPU",
            wgpu::DeviceType::VirtualGpu => "Virtual GPU",
            wgpu::DeviceType::Cpu => "CPU",
        }
    }

    pub async fn new(
        window: &(impl HasRawWindowHandle + HasRawDisplayHandle),
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);

        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or_else(|| eyre!("Failed to find an adapter compatible with the window"))?;

        let format = pick_surface_format(&surface.get_supported_formats(&adapter))
            .ok_or_else(|| eyre!("Surface is incompatible with the adapter"))?;
        log::info!("Surface format: {format:?}");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    features: wgpu::Features::empty(),
                    limits: adapter.limits(),
                },
                None,
            )
            .await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
        };
        surface.configure(&device, &surface_config);

        let layouts = RenderPipelineLayoutInfo::binding_group(&device);

        let uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: Uniforms::default().as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms Bind Group"),
            layout: &layouts[Binding::Uniforms],
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let make_vertex_buffer = |label, quad: QuadLayout| {
            device.create_buffer_init(&BufferInitDescriptor {
                label: Some(label),
                contents: quad.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        let quad_buffer = make_vertex_buffer("Quad Vertex Buffer", QuadLayout::Positions);
        let textured_quad_buffer =
            make_vertex_buffer("Textured Quad Vertex Buffer", QuadLayout::PositionsUv);
        let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // GL defaults: linear filtering, repeat wrapping.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let offscreen = OffscreenTarget::new(
            &device,
            &layouts[Binding::Texture],
            &sampler,
            width,
            height,
        );

        let screenshot_ctx = ScreenshotCtx::new(&device, format, width, height);

        Ok(Self {
            adapter,
            device,
            surface,
            surface_config,
            queue,
            format,

            layouts,
            uniform_buffer,
            uniform_bind_group,
            quad_buffer,
            textured_quad_buffer,
            index_buffer,
            sampler,

            scene: None,
            composite: None,
            offscreen,

            screenshot_ctx,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.surface_config.width == width && self.surface_config.height == height {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);

        self.offscreen = OffscreenTarget::new(
            &self.device,
            &self.layouts[Binding::Texture],
            &self.sampler,
            width,
            height,
        );
        self.screenshot_ctx.resize(&self.device, width, height);
    }

    /// Installs the scene pass and, for two-pass demos, the composite pass
    /// that samples the scene's output.
    pub fn set_passes(
        &mut self,
        scene: PassDescriptor,
        composite: Option<PassDescriptor>,
    ) -> Result<()> {
        if scene.samples_input {
            bail!("{}: the scene pass has no previous pass to sample", scene.label);
        }
        let scene_format = match composite {
            Some(_) => OffscreenTarget::FORMAT,
            None => self.format,
        };
        let scene = self.create_pass(&scene, scene_format)?;
        let composite = composite
            .map(|composite| self.create_pass(&composite, self.format))
            .transpose()?;

        self.scene = Some(scene);
        self.composite = composite;

        Ok(())
    }

    pub fn rebuild_scene(&mut self, scene: PassDescriptor) -> Result<()> {
        if scene.samples_input {
            bail!("{}: the scene pass has no previous pass to sample", scene.label);
        }
        let format = match self.composite {
            Some(_) => OffscreenTarget::FORMAT,
            None => self.format,
        };
        self.scene = Some(self.create_pass(&scene, format)?);

        Ok(())
    }

    pub fn rebuild_composite(&mut self, composite: PassDescriptor) -> Result<()> {
        if self.composite.is_none() {
            bail!("{}: this demo has no composite pass", composite.label);
        }
        self.composite = Some(self.create_pass(&composite, self.format)?);

        Ok(())
    }

    fn create_pass(&self, desc: &PassDescriptor, format: TextureFormat) -> Result<Pass> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("VS"),
                source: wgpu::ShaderSource::SpirV(desc.vert.into()),
            });
        let fs_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("FS"),
                source: wgpu::ShaderSource::SpirV(desc.frag.into()),
            });

        let layouts = [
            &self.layouts[Binding::Uniforms],
            &self.layouts[Binding::Texture],
        ];
        let group_count = bind_group_count(desc.uses_uniforms, desc.samples_input);
        let binds_uniforms = group_count > 0;
        let bind_group_layouts = &layouts[..group_count];
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts,
                push_constant_ranges: &[],
            });

        let attributes: &[wgpu::VertexAttribute] = match desc.quad {
            QuadLayout::Positions => &QUAD_ATTRIBUTES,
            QuadLayout::PositionsUv => &TEXTURED_QUAD_ATTRIBUTES,
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vs_module,
                    entry_point: "main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: desc.quad.stride(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes,
                    }],
                },
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fs_module,
                    entry_point: "main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            bail!("Failed to build {}: {err}", desc.label);
        }

        Ok(Pass {
            pipeline,
            quad: desc.quad,
            binds_uniforms,
            samples_input: desc.samples_input,
        })
    }

    fn quad_buffer(&self, quad: QuadLayout) -> &Buffer {
        match quad {
            QuadLayout::Positions => &self.quad_buffer,
            QuadLayout::PositionsUv => &self.textured_quad_buffer,
        }
    }

    fn draw_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        label: &str,
        pass: &'a Pass,
        target: &'a TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });
        render_pass.set_pipeline(&pass.pipeline);
        if pass.binds_uniforms {
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        }
        if pass.samples_input {
            render_pass.set_bind_group(1, &self.offscreen.bind_group, &[]);
        }
        render_pass.set_vertex_buffer(0, self.quad_buffer(pass.quad).slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }

    /// Offscreen pass then composite, or a single pass straight into `target`.
    fn encode_frame(&self, encoder: &mut wgpu::CommandEncoder, target: &TextureView) {
        let Some(scene) = &self.scene else {
            return;
        };
        match &self.composite {
            None => self.draw_pass(encoder, "Scene Pass", scene, target),
            Some(composite) => {
                self.draw_pass(encoder, "Scene Pass", scene, &self.offscreen.view);
                self.draw_pass(encoder, "Composite Pass", composite, target);
            }
        }
    }

    pub fn render(&self, uniforms: &Uniforms) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.uniform_buffer, 0, uniforms.as_bytes());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });
        self.encode_frame(&mut encoder, &view);
        self.queue.submit(Some(encoder.finish()));
        frame.present();

        Ok(())
    }

    /// Draws the frame once more into a copyable texture and reads it back.
    pub fn capture_frame(&self, uniforms: &Uniforms) -> Result<Frame> {
        if !is_capturable(self.format) {
            bail!("Can not capture frames of surface format {:?}", self.format);
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, uniforms.as_bytes());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        self.encode_frame(&mut encoder, &self.screenshot_ctx.view);

        self.screenshot_ctx
            .capture_frame(&self.device, &self.queue, encoder)
    }

    pub fn wait_idle(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_prefers_linear() {
        let formats = [
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Bgra8Unorm,
            TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn surface_format_skips_wide_formats() {
        let formats = [
            TextureFormat::Rgba16Float,
            TextureFormat::Rgb10a2Unorm,
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Bgra8Unorm,
        ];
        let format = pick_surface_format(&formats).unwrap();
        assert_eq!(format, TextureFormat::Bgra8Unorm);
        assert!(is_capturable(format));
        assert_eq!(format.describe().block_size, 4);

        let hdr_or_srgb = [TextureFormat::Rgba16Float, TextureFormat::Rgba8UnormSrgb];
        assert_eq!(
            pick_surface_format(&hdr_or_srgb),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
    }

    #[test]
    fn surface_format_falls_back_to_first() {
        let formats = [TextureFormat::Rgba16Float, TextureFormat::Rgb10a2Unorm];
        assert_eq!(
            pick_surface_format(&formats),
            Some(TextureFormat::Rgba16Float)
        );
        assert!(!is_capturable(TextureFormat::Rgba16Float));
        assert!(!is_capturable(TextureFormat::Rgb10a2Unorm));
        assert_eq!(pick_surface_format(&[]), None);
    }

    #[test]
    fn bind_groups_follow_shader_interface() {
        assert_eq!(bind_group_count(false, false), 0);
        assert_eq!(bind_group_count(true, false), 1);
        assert_eq!(bind_group_count(false, true), 2);
        assert_eq!(bind_group_count(true, true), 2);
    }

    #[test]
    fn channel_order_of_capture() {
        assert!(is_bgra(TextureFormat::Bgra8Unorm));
        assert!(!is_bgra(TextureFormat::Rgba8Unorm));
    }
}
