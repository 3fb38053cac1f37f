//! Offscreen capture of the viewport.
//!
//! An export draws the same renderables as the window into an offscreen
//! [`CAPTURE_FORMAT`] target sized for the chosen [`Resolution`], copies it
//! into a mappable buffer and hands back a [`PendingCapture`]. Reading the
//! capture is asynchronous so it can be returned from a flow as a future.

use std::{fmt, io::Cursor, iter, str::FromStr};

use anyhow::Context as _;
use cgmath::{Matrix4, Vector3};

use crate::{
    camera::{self, CameraUniform},
    context::{CAPTURE_FORMAT, Context},
    data_structures::texture::Texture,
    error::ExportError,
    render::{self, Instanced, Render},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    #[default]
    Standard,
    Hd,
    UltraHd,
}

/// Logical size of an export and its pixel density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTarget {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl ExportTarget {
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width * self.scale, self.height * self.scale)
    }
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Standard, Resolution::Hd, Resolution::UltraHd];

    pub fn tag(self) -> &'static str {
        match self {
            Resolution::Standard => "standard",
            Resolution::Hd => "hd",
            Resolution::UltraHd => "4k",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resolution::Standard => "Standard (1280x720)",
            Resolution::Hd => "HD (1920x1080)",
            Resolution::UltraHd => "4K (3840x2160)",
        }
    }

    pub fn target(self) -> ExportTarget {
        match self {
            Resolution::Standard => ExportTarget {
                width: 1280,
                height: 720,
                scale: 1,
            },
            Resolution::Hd => ExportTarget {
                width: 1920,
                height: 1080,
                scale: 1,
            },
            Resolution::UltraHd => ExportTarget {
                width: 3840,
                height: 2160,
                scale: 2,
            },
        }
    }
}

impl FromStr for Resolution {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|resolution| resolution.tag() == s)
            .ok_or_else(|| ExportError::UnknownResolution(s.to_string()))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub fn export_file_name(resolution: Resolution, unix_millis: i64) -> String {
    format!("custom-garment-{}-{}.png", resolution.tag(), unix_millis)
}

/// One offscreen pass of a capture, placed in pixels of the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    /// Clip-space transform that stretches this tile's part of a
    /// `full_width` x `full_height` frame over the whole render target.
    pub fn crop(&self, full_width: u32, full_height: u32) -> Matrix4<f32> {
        let (fw, fh) = (full_width as f32, full_height as f32);
        let left = -1.0 + 2.0 * self.x as f32 / fw;
        let right = -1.0 + 2.0 * (self.x + self.width) as f32 / fw;
        let top = 1.0 - 2.0 * self.y as f32 / fh;
        let bottom = 1.0 - 2.0 * (self.y + self.height) as f32 / fh;

        let scale = Vector3::new(2.0 / (right - left), 2.0 / (top - bottom), 1.0);
        let offset = Vector3::new(
            -(right + left) / (right - left),
            -(top + bottom) / (top - bottom),
            0.0,
        );
        Matrix4::from_translation(offset)
            * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
    }
}

/// Split a `width` x `height` frame into evenly sized tiles no edge of which
/// exceeds `limit`. A frame that fits is a single tile.
pub fn plan_tiles(width: u32, height: u32, limit: u32) -> Vec<Tile> {
    let limit = limit.max(1);
    let tile_width = width.div_ceil(width.div_ceil(limit).max(1));
    let tile_height = height.div_ceil(height.div_ceil(limit).max(1));

    let mut tiles = Vec::new();
    for y in (0..height).step_by(tile_height.max(1) as usize) {
        for x in (0..width).step_by(tile_width.max(1) as usize) {
            tiles.push(Tile {
                x,
                y,
                width: tile_width.min(width - x),
                height: tile_height.min(height - y),
            });
        }
    }
    tiles
}

#[derive(Debug)]
struct TileReadback {
    tile: Tile,
    buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

/// A finished capture waiting in GPU buffers, one per tile.
#[derive(Debug)]
pub struct PendingCapture {
    device: wgpu::Device,
    tiles: Vec<TileReadback>,
    width: u32,
    height: u32,
}

/// Draw `render` into offscreen targets covering `target`'s pixel size.
///
/// The camera keeps its orbit but is re-projected for the export's aspect
/// ratio. Frames larger than the device's texture limit are drawn in tiles
/// and stitched together on read-back.
pub fn capture(
    ctx: &Context,
    render: Render<'_>,
    target: ExportTarget,
    background: wgpu::Color,
) -> anyhow::Result<PendingCapture> {
    capture_tiled(ctx, render, target, background, ctx.max_texture_dimension())
}

/// [`capture`] with tiles no larger than `limit` pixels on either edge.
pub fn capture_tiled(
    ctx: &Context,
    render: Render<'_>,
    target: ExportTarget,
    background: wgpu::Color,
    limit: u32,
) -> anyhow::Result<PendingCapture> {
    let (width, height) = target.pixel_size();
    let limit = limit.min(ctx.max_texture_dimension());
    if limit == 0 {
        return Err(ExportError::TooLarge {
            width,
            height,
            limit,
        }
        .into());
    }

    let mut export_camera = ctx.camera.camera;
    export_camera.resize(width, height);
    let view_proj = export_camera.build_view_projection_matrix();

    let mut draws = Vec::new();
    render.flatten_into(&mut draws);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Export Encoder"),
        });
    let tiles = plan_tiles(width, height, limit)
        .into_iter()
        .map(|tile| {
            let mut uniform = CameraUniform::new();
            uniform.update_view_proj(&export_camera);
            uniform.view_proj = (tile.crop(width, height) * view_proj).into();
            draw_tile(ctx, &mut encoder, &draws, &uniform, tile, background)
        })
        .collect();
    ctx.queue.submit(iter::once(encoder.finish()));

    Ok(PendingCapture {
        device: ctx.device.clone(),
        tiles,
        width,
        height,
    })
}

fn draw_tile(
    ctx: &Context,
    encoder: &mut wgpu::CommandEncoder,
    draws: &[Instanced<'_>],
    uniform: &CameraUniform,
    tile: Tile,
    background: wgpu::Color,
) -> TileReadback {
    let extent = wgpu::Extent3d {
        width: tile.width,
        height: tile.height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Export Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CAPTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(
        &ctx.device,
        [tile.width, tile.height],
        "export_depth_texture",
    );

    let camera_buffer = camera::mk_buffer(&ctx.device, uniform, "Export Camera Buffer");
    let camera_bind_group =
        camera::mk_bind_group(&ctx.device, &ctx.camera.bind_group_layout, &camera_buffer);

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Export Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render::draw(
            ctx,
            &mut render_pass,
            &ctx.pipelines.capture,
            &camera_bind_group,
            draws,
        );
    }

    // rows of a texture copy must be 256-byte aligned
    let padded_bytes_per_row = (tile.width * 4).div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Export Buffer"),
        size: padded_bytes_per_row as wgpu::BufferAddress * tile.height as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(tile.height),
            },
        },
        extent,
    );

    TileReadback {
        tile,
        buffer,
        padded_bytes_per_row,
    }
}

impl PendingCapture {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Map every tile buffer and stitch the rows into one image.
    pub async fn read(self) -> anyhow::Result<image::RgbaImage> {
        // Map first, then poll, then await. Awaiting before the poll freezes
        // the application.
        let mut receivers = Vec::with_capacity(self.tiles.len());
        for readback in &self.tiles {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            readback
                .buffer
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |result| {
                    let _ = tx.send(result);
                });
            receivers.push(rx);
        }
        #[cfg(target_arch = "wasm32")]
        self.device.poll(wgpu::PollType::Poll)?;
        #[cfg(not(target_arch = "wasm32"))]
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(10)),
        })?;

        let stride = (self.width * 4) as usize;
        let mut pixels = vec![0u8; stride * self.height as usize];
        for (readback, rx) in self.tiles.iter().zip(receivers) {
            rx.receive()
                .await
                .context("export buffer was dropped before it was mapped")??;

            let Tile { x, y, width, height } = readback.tile;
            let row = (width * 4) as usize;
            {
                let data = readback.buffer.slice(..).get_mapped_range();
                for (line, padded) in data
                    .chunks_exact(readback.padded_bytes_per_row as usize)
                    .take(height as usize)
                    .enumerate()
                {
                    let start = (y as usize + line) * stride + x as usize * 4;
                    pixels[start..start + row].copy_from_slice(&padded[..row]);
                }
            }
            readback.buffer.unmap();
        }

        image::RgbaImage::from_raw(self.width, self.height, pixels)
            .context("export buffer does not match the capture size")
    }
}

pub fn encode_png(image: &image::RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn targets() {
        assert_eq!(Resolution::Hd.target().pixel_size(), (1920, 1080));
        assert_eq!(Resolution::Standard.target().pixel_size(), (1280, 720));
        let uhd = Resolution::UltraHd.target();
        assert_eq!((uhd.width, uhd.height, uhd.scale), (3840, 2160, 2));
        assert_eq!(uhd.pixel_size(), (7680, 4320));
    }

    #[test]
    fn tags_parse_back() {
        for resolution in Resolution::ALL {
            assert_eq!(resolution.tag().parse::<Resolution>(), Ok(resolution));
        }
        assert_eq!(
            "8k".parse::<Resolution>(),
            Err(ExportError::UnknownResolution("8k".to_string()))
        );
    }

    #[test]
    fn file_name_carries_tag_and_millis() {
        assert_eq!(
            export_file_name(Resolution::UltraHd, 1_700_000_000_000),
            "custom-garment-4k-1700000000000.png"
        );
    }

    #[test]
    fn frames_within_the_limit_are_one_tile() {
        assert_eq!(
            plan_tiles(7680, 4320, 8192),
            vec![Tile {
                x: 0,
                y: 0,
                width: 7680,
                height: 4320
            }]
        );
    }

    #[test]
    fn webgl_sized_limit_tiles_the_4k_frame() {
        let (width, height) = Resolution::UltraHd.target().pixel_size();
        let tiles = plan_tiles(width, height, 2048);
        assert_eq!(tiles.len(), 12);
        assert!(tiles.iter().all(|t| t.width <= 2048 && t.height <= 2048));
        let covered: u64 = tiles
            .iter()
            .map(|t| t.width as u64 * t.height as u64)
            .sum();
        assert_eq!(covered, width as u64 * height as u64);
        assert_eq!(
            tiles.last(),
            Some(&Tile {
                x: 5760,
                y: 2880,
                width: 1920,
                height: 1440
            })
        );
    }

    #[test]
    fn uneven_frames_keep_the_remainder_in_the_last_tile() {
        let tiles = plan_tiles(1001, 10, 500);
        let widths: Vec<u32> = tiles.iter().map(|t| t.width).collect();
        assert_eq!(widths, vec![334, 334, 333]);
    }

    #[test]
    fn crop_maps_tile_corners_to_the_clip_edges() {
        use cgmath::Vector4;

        let tile = Tile {
            x: 1920,
            y: 1440,
            width: 1920,
            height: 1440,
        };
        let crop = tile.crop(7680, 4320);
        // top-left of the tile in the full frame's clip space
        let top_left = crop * Vector4::new(-0.5, 1.0 / 3.0, 0.3, 1.0);
        assert_relative_eq!(top_left.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(top_left.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(top_left.z, 0.3);
        let bottom_right = crop * Vector4::new(0.0, -1.0 / 3.0, 0.3, 1.0);
        assert_relative_eq!(bottom_right.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(bottom_right.y, -1.0, epsilon = 1e-5);
        // w scales with the point
        let far = crop * Vector4::new(-1.0, 2.0 / 3.0, 0.6, 2.0);
        assert_relative_eq!(far.x / far.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.y / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn png_has_signature() {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
