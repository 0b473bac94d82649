// SPDX-License-Identifier: GPL-3.0-only

//! GPU point cloud processor
//!
//! Offscreen wgpu implementation of [`PointCloudTarget`]. Color and depth
//! frames become textures, the per-pixel index buffer feeds a point-list
//! render pipeline, and every draw or clear is copied into a staging buffer
//! for [`PointCloudProcessor::read_frame`].

use crate::backends::{ColorFrame, DepthFrame};
use crate::errors::RenderError;
use crate::gpu::{self, wgpu};
use crate::renderer::{DrawCall, FrameGeometryCache, PointCloudTarget};
use crate::shaders::common::{CalibrationUniforms, ViewUniforms};
use crate::shaders::gpu_processor::{
    CachedDimensions, padded_bytes_per_row, read_buffer_async, strip_row_padding,
};
use std::sync::Arc;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_ATTACHMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// Rendered point cloud image
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Tightly packed RGBA rows
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Offscreen color target, depth buffer and readback buffer
struct OutputTarget {
    color: wgpu::Texture,
    depth: wgpu::Texture,
    staging: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

/// GPU point cloud processor
pub struct PointCloudProcessor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    calibration_buffer: wgpu::Buffer,
    view_buffer: wgpu::Buffer,
    vertex_buffer: Option<wgpu::Buffer>,
    color_texture: Option<wgpu::Texture>,
    color_dims: CachedDimensions,
    depth_texture: Option<wgpu::Texture>,
    depth_dims: CachedDimensions,
    bind_group: Option<wgpu::BindGroup>,
    output: Option<OutputTarget>,
    output_dims: CachedDimensions,
    clear_color: wgpu::Color,
}

impl PointCloudProcessor {
    /// Create a processor on its own device
    pub async fn new(clear_color: [f64; 4]) -> Result<Self, RenderError> {
        let (device, queue, gpu_info) = gpu::create_device("point_cloud_gpu").await?;

        info!(
            adapter_name = %gpu_info.adapter_name,
            adapter_backend = ?gpu_info.backend,
            "GPU device created for point cloud rendering"
        );

        Ok(Self::with_device(device, queue, clear_color))
    }

    /// Create a processor on an existing device
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        clear_color: [f64; 4],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("point_cloud_shader"),
            source: wgpu::ShaderSource::Wgsl(super::point_cloud_shader().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("point_cloud_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::VERTEX),
                texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                texture_entry(3, wgpu::ShaderStages::VERTEX),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("point_cloud_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("point_cloud_render_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_ATTACHMENT_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let calibration_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("point_cloud_calibration_buffer"),
            contents: bytemuck::bytes_of(&CalibrationUniforms::uncalibrated()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point_cloud_view_buffer"),
            size: std::mem::size_of::<ViewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [r, g, b, a] = clear_color;

        Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            calibration_buffer,
            view_buffer,
            vertex_buffer: None,
            color_texture: None,
            color_dims: CachedDimensions::default(),
            depth_texture: None,
            depth_dims: CachedDimensions::default(),
            bind_group: None,
            output: None,
            output_dims: CachedDimensions::default(),
            clear_color: wgpu::Color { r, g, b, a },
        }
    }

    /// Size of the offscreen target, once a frame has been drawn
    pub fn output_size(&self) -> Option<(u32, u32)> {
        self.output_dims
            .is_initialized()
            .then_some((self.output_dims.width, self.output_dims.height))
    }

    /// Read back the last drawn or cleared frame
    ///
    /// Returns `None` before anything has been drawn.
    pub async fn read_frame(&self) -> Result<Option<RenderedFrame>, RenderError> {
        let Some(output) = self.output.as_ref() else {
            return Ok(None);
        };
        let (width, height) = (self.output_dims.width, self.output_dims.height);

        let padded = read_buffer_async(&self.device, &output.staging).await?;
        let rgba = strip_row_padding(&padded, width, height, output.padded_bytes_per_row);

        Ok(Some(RenderedFrame {
            rgba,
            width,
            height,
        }))
    }

    fn create_frame_texture(
        &self,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    /// Reallocate frame textures whose size changed
    fn ensure_frame_textures(&mut self, color: (u32, u32), depth: (u32, u32)) {
        if self.color_texture.is_none() || self.color_dims.needs_update(color.0, color.1) {
            debug!(width = color.0, height = color.1, "Allocating color texture");
            self.color_texture = Some(self.create_frame_texture(
                "point_cloud_color_texture",
                wgpu::TextureFormat::Rgba8Unorm,
                color.0,
                color.1,
            ));
            self.color_dims.update(color.0, color.1);
            self.bind_group = None;
        }

        if self.depth_texture.is_none() || self.depth_dims.needs_update(depth.0, depth.1) {
            debug!(width = depth.0, height = depth.1, "Allocating depth texture");
            self.depth_texture = Some(self.create_frame_texture(
                "point_cloud_depth_texture",
                wgpu::TextureFormat::R32Float,
                depth.0,
                depth.1,
            ));
            self.depth_dims.update(depth.0, depth.1);
            self.bind_group = None;
        }

        if self.bind_group.is_none()
            && let (Some(color_texture), Some(depth_texture)) =
                (self.color_texture.as_ref(), self.depth_texture.as_ref())
        {
            let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
            let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("point_cloud_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.calibration_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.view_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&color_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&depth_view),
                    },
                ],
            }));
        }
    }

    /// Reallocate the offscreen target if the viewport changed
    fn ensure_output(&mut self, width: u32, height: u32) {
        if self.output.is_some() && !self.output_dims.needs_update(width, height) {
            return;
        }

        debug!(width, height, "Allocating point cloud output target");

        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("point_cloud_output_texture"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let depth = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("point_cloud_depth_attachment"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_ATTACHMENT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let padded_bytes_per_row = padded_bytes_per_row(width, 4);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point_cloud_staging_buffer"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        self.output = Some(OutputTarget {
            color,
            depth,
            staging,
            padded_bytes_per_row,
        });
        self.output_dims.update(width, height);
    }

    /// Clear the target, optionally draw points, and copy to staging
    fn submit_pass(&self, points: Option<u32>) -> Result<(), RenderError> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| RenderError::Gpu("Output target not allocated".to_string()))?;

        let color_view = output
            .color
            .create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = output
            .depth
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("point_cloud_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point_cloud_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(count) = points {
                let bind_group = self
                    .bind_group
                    .as_ref()
                    .ok_or_else(|| RenderError::Gpu("Frames not uploaded".to_string()))?;
                let vertex_buffer = self
                    .vertex_buffer
                    .as_ref()
                    .ok_or_else(|| RenderError::Gpu("Geometry not uploaded".to_string()))?;

                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.draw(0..count, 0..1);
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &output.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(output.padded_bytes_per_row),
                    rows_per_image: Some(self.output_dims.height),
                },
            },
            extent(self.output_dims.width, self.output_dims.height),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl PointCloudTarget for PointCloudProcessor {
    fn upload_calibration(&mut self, uniforms: &CalibrationUniforms) {
        self.queue
            .write_buffer(&self.calibration_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn upload_geometry(&mut self, geometry: &FrameGeometryCache) -> Result<(), RenderError> {
        if geometry.point_count() == 0 {
            return Err(RenderError::Gpu("Empty point geometry".to_string()));
        }

        self.vertex_buffer = Some(self.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("point_cloud_index_buffer"),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        Ok(())
    }

    fn upload_frames(&mut self, color: &ColorFrame, depth: &DepthFrame) -> Result<(), RenderError> {
        if color.width == 0 || color.height == 0 || depth.width == 0 || depth.height == 0 {
            return Err(RenderError::FrameUpload("Empty frame".to_string()));
        }
        if color.data.len() != color.expected_len() {
            return Err(RenderError::FrameUpload(format!(
                "Color frame has {} bytes, expected {}",
                color.data.len(),
                color.expected_len()
            )));
        }
        if depth.data.len() != depth.pixel_count() {
            return Err(RenderError::FrameUpload(format!(
                "Depth frame has {} samples, expected {}",
                depth.data.len(),
                depth.pixel_count()
            )));
        }

        self.ensure_frame_textures((color.width, color.height), (depth.width, depth.height));

        if let Some(texture) = self.color_texture.as_ref() {
            self.queue.write_texture(
                texture_copy(texture),
                &color.data[..],
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(color.width * 4),
                    rows_per_image: Some(color.height),
                },
                extent(color.width, color.height),
            );
        }

        if let Some(texture) = self.depth_texture.as_ref() {
            self.queue.write_texture(
                texture_copy(texture),
                bytemuck::cast_slice(&depth.data[..]),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(depth.width * 4),
                    rows_per_image: Some(depth.height),
                },
                extent(depth.width, depth.height),
            );
        }

        Ok(())
    }

    fn draw_points(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        let (width, height) = call.viewport;
        self.ensure_output(width, height);
        self.queue
            .write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&call.uniforms));
        self.submit_pass(Some(call.point_count))
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        // Nothing to clear before the first draw sized the target
        if self.output.is_none() {
            return Ok(());
        }
        self.submit_pass(None)
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn texture_copy(texture: &wgpu::Texture) -> wgpu::TexelCopyTextureInfo<'_> {
    wgpu::TexelCopyTextureInfo {
        texture,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CameraCalibration, DistortionSpec};
    use crate::geometry::project;
    use crate::renderer::PointCloudRenderer;
    use crate::renderer::tests::fixed_streams;
    use crate::view::OrbitController;
    use glam::{Mat4, UVec2, Vec2};

    #[tokio::test]
    async fn test_render_and_read_back() {
        // Requires a GPU; skipped when none is available
        let processor = match PointCloudProcessor::new([0.0, 0.0, 0.0, 1.0]).await {
            Ok(processor) => processor,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        let mut renderer = PointCloudRenderer::new(processor);
        renderer.calibrate("SR300").unwrap();
        assert!(renderer.target().read_frame().await.unwrap().is_none());

        let mut streams = fixed_streams("SR300", (32, 24), (32, 24), true);
        let outcome = renderer
            .render_frame(Some(&mut streams), &OrbitController::new())
            .unwrap();
        assert!(outcome.is_drawn());

        let frame = renderer.target().read_frame().await.unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (32, 24));
        assert_eq!(frame.rgba.len(), 32 * 24 * 4);
    }

    fn pixel(frame: &RenderedFrame, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * frame.width + x) * 4) as usize;
        [frame.rgba[i], frame.rgba[i + 1], frame.rgba[i + 2], frame.rgba[i + 3]]
    }

    #[tokio::test]
    async fn test_points_land_where_cpu_projection_puts_them() {
        let mut processor = match PointCloudProcessor::new([0.0, 0.0, 0.0, 1.0]).await {
            Ok(processor) => processor,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        let (width, height) = (32, 24);
        let calibration = CameraCalibration {
            depth_scale: 10.0,
            depth_focal_length: Vec2::splat(100.0),
            depth_offset: Vec2::new(16.0, 12.0),
            color_focal_length: Vec2::splat(100.0),
            color_offset: Vec2::new(16.0, 12.0),
            depth_distortion: DistortionSpec::NONE,
            color_distortion: DistortionSpec::NONE,
            depth_to_color: Mat4::IDENTITY,
        };
        let marker = [200, 40, 120, 255];
        let color = ColorFrame::new(width, height, marker.repeat((width * height) as usize));
        // 0.1 * 10 = one meter in front of the sensor
        let depth = DepthFrame::constant(width, height, 0.1);

        let geometry = FrameGeometryCache::build(width, height);
        let mvp = OrbitController::new().view_projection(width, height);
        processor.upload_calibration(&CalibrationUniforms::from(&calibration));
        processor.upload_geometry(&geometry).unwrap();
        processor.upload_frames(&color, &depth).unwrap();
        processor
            .draw_points(&DrawCall {
                viewport: geometry.viewport(),
                uniforms: ViewUniforms::new(mvp, (width, height), (width, height)),
                point_count: geometry.point_count(),
            })
            .unwrap();
        let frame = processor.read_frame().await.unwrap().unwrap();

        // Principal-point ray through the CPU reference, then onto the screen
        let point = project(UVec2::new(16, 12), 0.1, &calibration);
        assert_eq!(point.normalized_color_uv(UVec2::new(width, height)), Vec2::splat(0.5));
        let ndc = mvp.project_point3(point.position);
        let screen_x = ((ndc.x + 1.0) * 0.5 * width as f32) as u32;
        let screen_y = ((1.0 - ndc.y) * 0.5 * height as f32) as u32;

        // The plane spans a few pixels around the landing point, densely
        for y in screen_y - 1..=screen_y + 1 {
            for x in screen_x - 1..=screen_x + 1 {
                assert_eq!(pixel(&frame, x, y), marker, "pixel ({}, {})", x, y);
            }
        }

        let background = [0, 0, 0, 255];
        for (x, y) in [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)] {
            assert_eq!(pixel(&frame, x, y), background, "corner ({}, {})", x, y);
        }
    }

    #[tokio::test]
    async fn test_rejects_mismatched_frame() {
        let mut processor = match PointCloudProcessor::new([0.0, 0.0, 0.0, 1.0]).await {
            Ok(processor) => processor,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        let color = ColorFrame::new(4, 4, vec![0; 10]);
        let depth = DepthFrame::constant(4, 4, 0.0);
        let err = processor.upload_frames(&color, &depth).unwrap_err();
        assert!(matches!(err, RenderError::FrameUpload(_)));
    }
}
