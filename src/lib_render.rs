use std::iter;

use cgmath::prelude::*;

use crate::host::{Frame, SurfaceSize};
use crate::lib_state::{GpuContext, GpuGeometry};
use crate::model_mesh::DrawSolid;
use crate::model_point::DrawQuadPoints;
use crate::point_cloud::Color;
use crate::scene::PointStyle;

// GPU Uniform Structs

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    viewport: [f32; 4], // width, height, aspect, unused
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
            view: cgmath::Matrix4::identity().into(),
            viewport: [1.0, 1.0, 1.0, 0.0],
        }
    }

    pub fn update_from_frame(&mut self, frame: &Frame) {
        self.view_position = frame.eye.to_homogeneous().into();
        self.view_proj = (frame.projection * frame.view).into();
        self.view = frame.view.into();
        self.viewport[2] = frame.aspect;
    }

    pub fn update_viewport(&mut self, size: SurfaceSize) {
        self.viewport[0] = size.width.max(1) as f32;
        self.viewport[1] = size.height.max(1) as f32;
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-mesh uniform at group 1, binding 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub model: [[f32; 4]; 4],
    /// Points: opacity, size attenuation flag. Unused by solids.
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn points(style: &PointStyle) -> Self {
        Self {
            model: cgmath::Matrix4::identity().into(),
            params: [
                style.opacity,
                if style.size_attenuation { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }

    pub fn solid() -> Self {
        Self {
            model: cgmath::Matrix4::identity().into(),
            params: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

fn srgb_to_linear(channel: f32) -> f64 {
    let c = channel.clamp(0.0, 1.0) as f64;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Clear color for an optional background. `None` clears to transparent.
pub fn clear_color(background: Option<Color>) -> wgpu::Color {
    match background {
        Some([r, g, b]) => wgpu::Color {
            r: srgb_to_linear(r),
            g: srgb_to_linear(g),
            b: srgb_to_linear(b),
            a: 1.0,
        },
        None => wgpu::Color::TRANSPARENT,
    }
}

/// Draws one frame. Every draw call must name live resources; the caller
/// checks that before getting here.
pub fn render(state: &mut GpuContext, frame: &Frame) -> Result<(), wgpu::SurfaceError> {
    state.camera_uniform.update_from_frame(frame);
    state.queue.write_buffer(
        &state.camera_buffer,
        0,
        bytemuck::cast_slice(&[state.camera_uniform]),
    );
    for draw in &frame.draws {
        if let Some(material) = state.materials.get_mut(&draw.material.id) {
            material.uniform.model = draw.model.into();
            state
                .queue
                .write_buffer(&material.buffer, 0, bytemuck::cast_slice(&[material.uniform]));
        }
    }

    let output = state.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color(frame.background)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &state.depth_texture_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        for draw in &frame.draws {
            let (Some(geometry), Some(material)) = (
                state.geometries.get(&draw.geometry.id),
                state.materials.get(&draw.material.id),
            ) else {
                continue;
            };
            match geometry {
                GpuGeometry::Points(model) => {
                    render_pass.set_pipeline(&state.point_pipeline);
                    render_pass.draw_quad_points(
                        model,
                        &state.camera_bind_group,
                        &material.bind_group,
                    );
                }
                GpuGeometry::Solid(model) => {
                    render_pass.set_pipeline(&state.solid_pipeline);
                    render_pass.draw_solid(model, &state.camera_bind_group, &material.bind_group);
                }
            }
        }
    }
    state.queue.submit(iter::once(encoder.finish()));
    output.present();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn missing_background_clears_to_transparent() {
        assert_eq!(clear_color(None), wgpu::Color::TRANSPARENT);
        let white = clear_color(Some([1.0, 1.0, 1.0]));
        assert_relative_eq!(white.r, 1.0);
        assert_relative_eq!(white.a, 1.0);
    }

    #[test]
    fn srgb_midtones_are_darker_in_linear() {
        assert!(srgb_to_linear(0.5) < 0.25);
        assert_relative_eq!(srgb_to_linear(0.0), 0.0);
    }

    #[test]
    fn point_params_carry_style() {
        let style = PointStyle {
            size: 0.1,
            opacity: 0.5,
            size_attenuation: false,
        };
        let uniform = MaterialUniform::points(&style);
        assert_eq!(uniform.params, [0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn uniform_sizes_are_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 80);
    }
}
