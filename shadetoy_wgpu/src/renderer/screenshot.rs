use std::num::NonZeroU32;

use color_eyre::{eyre::eyre, Result};
use shadetoy_types::{Frame, ImageDimensions};
use wgpu::{Device, Maintain, MapMode};

/// Copyable render target the frame is redrawn into before reading it back.
pub struct ScreenshotCtx {
    pub image_dimensions: ImageDimensions,
    format: wgpu::TextureFormat,
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    data: wgpu::Buffer,
}

impl ScreenshotCtx {
    pub fn new(device: &Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let image_dimensions =
            ImageDimensions::new(width, height, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let texture = Self::make_texture(device, format, &image_dimensions);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let data = Self::make_buffer(device, &image_dimensions);

        Self {
            image_dimensions,
            format,
            texture,
            view,
            data,
        }
    }

    fn make_texture(
        device: &Device,
        format: wgpu::TextureFormat,
        image_dimensions: &ImageDimensions,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Texture"),
            size: wgpu::Extent3d {
                width: image_dimensions.width,
                height: image_dimensions.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        })
    }

    fn make_buffer(device: &Device, image_dimensions: &ImageDimensions) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen mapped Buffer"),
            size: image_dimensions.linear_size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let new_dims = ImageDimensions::new(width, height, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        if new_dims == self.image_dimensions {
            return;
        }
        if new_dims.linear_size() > self.image_dimensions.linear_size() {
            self.data = Self::make_buffer(device, &new_dims);
        }
        self.texture = Self::make_texture(device, self.format, &new_dims);
        self.view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.image_dimensions = new_dims;
    }

    /// Copies the capture texture into the mapped buffer and reads it back.
    /// Expects the frame to be already encoded into `self.view` by `encoder`.
    pub fn capture_frame(
        &self,
        device: &Device,
        queue: &wgpu::Queue,
        mut encoder: wgpu::CommandEncoder,
    ) -> Result<Frame> {
        let dims = self.image_dimensions;
        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &self.data,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: NonZeroU32::new(dims.padded_bytes_per_row),
                    rows_per_image: NonZeroU32::new(dims.height),
                },
            },
            wgpu::Extent3d {
                width: dims.width,
                height: dims.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        let image_slice = self.data.slice(0..dims.linear_size());
        let (tx, rx) = std::sync::mpsc::channel();
        image_slice.map_async(MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device.poll(Maintain::Wait);
        rx.recv()
            .map_err(|_| eyre!("Capture buffer mapping was dropped"))??;

        let frame = image_slice.get_mapped_range().to_vec();
        self.data.unmap();

        Ok(Frame {
            data: frame,
            dimensions: dims,
            bgra: is_bgra(self.format),
        })
    }
}

pub fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

/// 8-bit four-channel formats the PNG path can read back.
pub fn is_capturable(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Rgba8Unorm
            | wgpu::TextureFormat::Rgba8UnormSrgb
            | wgpu::TextureFormat::Bgra8Unorm
            | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}
