use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::VisualError;
use crate::host::{
    Frame, MeshResources, RenderContext, Resource, ResourceKey, ResourceKind, SurfaceSize,
};
use crate::lib_pipeline::{self, PipelineOptions, DEPTH_FORMAT};
use crate::lib_render::{self, CameraUniform, MaterialUniform};
use crate::model_mesh::{MeshVertex, SolidModel, Vertex};
use crate::model_point::{QuadPointModel, QuadPointVertex};
use crate::point_cloud::PointCloud;
use crate::scene::PointStyle;
use crate::shape_star::TubeMesh;

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub enum GpuGeometry {
    Points(QuadPointModel),
    Solid(SolidModel),
}

impl GpuGeometry {
    fn destroy(&self) {
        match self {
            GpuGeometry::Points(model) => model.destroy(),
            GpuGeometry::Solid(model) => model.destroy(),
        }
    }
}

pub struct GpuMaterial {
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// [`RenderContext`] backed by a wgpu surface on a winit window.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_texture_view: wgpu::TextureView,
    pub camera_uniform: CameraUniform,
    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
    pub point_material_layout: wgpu::BindGroupLayout,
    pub solid_material_layout: wgpu::BindGroupLayout,
    pub point_pipeline: wgpu::RenderPipeline,
    pub solid_pipeline: wgpu::RenderPipeline,
    pub sampler: wgpu::Sampler,
    pub textures: HashMap<u64, GpuTexture>,
    pub geometries: HashMap<u64, GpuGeometry>,
    pub materials: HashMap<u64, GpuMaterial>,
    next_id: u64,
    disposed: bool,
}

impl GpuContext {
    /// Create the surface, device and pipelines for `window`.
    pub async fn new(window: Arc<Window>) -> Result<GpuContext, VisualError> {
        let size = window.inner_size();
        let size = SurfaceSize::new(size.width, size.height);

        let (surface, device, queue, config) = init_gpu_context(window, size).await?;
        surface.configure(&device, &config);

        let (camera_uniform, camera_buffer, camera_bind_group, camera_bind_group_layout) =
            init_camera_binding(&device, size);
        let point_material_layout = material_layout(&device, "point_material_layout", 1);
        let solid_material_layout = material_layout(&device, "solid_material_layout", 2);
        let depth_texture_view = create_depth_texture(&device, &config);

        let point_pipeline = {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Point Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout, &point_material_layout],
                push_constant_ranges: &[],
            });
            let shader = wgpu::ShaderModuleDescriptor {
                label: Some("Point Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point.wgsl").into()),
            };
            lib_pipeline::create_render_pipeline(
                &device,
                "Point Render Pipeline",
                &layout,
                config.format,
                &[QuadPointVertex::desc()],
                shader,
                PipelineOptions::POINTS,
            )
        };

        let solid_pipeline = {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Solid Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout, &solid_material_layout],
                push_constant_ranges: &[],
            });
            let shader = wgpu::ShaderModuleDescriptor {
                label: Some("Matcap Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/matcap.wgsl").into()),
            };
            lib_pipeline::create_render_pipeline(
                &device,
                "Solid Render Pipeline",
                &layout,
                config.format,
                &[MeshVertex::desc()],
                shader,
                PipelineOptions::SOLID,
            )
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "GPU context ready: {:?} surface at {}x{}",
            config.format,
            config.width,
            config.height
        );

        Ok(GpuContext {
            surface,
            device,
            queue,
            config,
            depth_texture_view,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            point_material_layout,
            solid_material_layout,
            point_pipeline,
            solid_pipeline,
            sampler,
            textures: HashMap::new(),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            next_id: 0,
            disposed: false,
        })
    }

    fn next_resource(&mut self, kind: ResourceKind) -> Result<Resource, VisualError> {
        if self.disposed {
            return Err(VisualError::ContextUnavailable("context disposed".into()));
        }
        self.next_id += 1;
        Ok(Resource::new(kind, self.next_id))
    }

    fn texture_view(&self, key: ResourceKey) -> Result<&wgpu::TextureView, VisualError> {
        self.textures
            .get(&key.id)
            .map(|texture| &texture.view)
            .ok_or_else(|| VisualError::ContextUnavailable(format!("texture {} is not live", key.id)))
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture_view = create_depth_texture(&self.device, &self.config);
    }

    fn material(
        &self,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        uniform: MaterialUniform,
        views: &[&wgpu::TextureView],
    ) -> GpuMaterial {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", label)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        for (i, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(&format!("{} Material Bind Group", label)),
        });

        GpuMaterial {
            uniform,
            buffer,
            bind_group,
        }
    }
}

impl RenderContext for GpuContext {
    fn create_texture(&mut self, label: &str, image: &RgbaImage) -> Result<Resource, VisualError> {
        let resource = self.next_resource(ResourceKind::Texture)?;
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Alpha is stored linearly either way, so the sprite mask is unaffected.
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(resource.key().id, GpuTexture { texture, view });
        Ok(resource)
    }

    fn create_points(
        &mut self,
        label: &str,
        cloud: &PointCloud,
        style: &PointStyle,
        sprite: ResourceKey,
    ) -> Result<MeshResources, VisualError> {
        let sprite_view = self.texture_view(sprite)?;
        let material = self.material(
            label,
            &self.point_material_layout,
            MaterialUniform::points(style),
            &[sprite_view],
        );
        let model = QuadPointModel::new(&self.device, label, &cloud.to_vertices(style.size));
        log::debug!("Uploaded {} points for '{}'", cloud.len(), label);

        let geometry = self.next_resource(ResourceKind::Geometry)?;
        let material_handle = self.next_resource(ResourceKind::Material)?;
        self.geometries
            .insert(geometry.key().id, GpuGeometry::Points(model));
        self.materials.insert(material_handle.key().id, material);
        Ok(MeshResources {
            geometry,
            material: material_handle,
        })
    }

    fn create_solid(
        &mut self,
        label: &str,
        mesh: &TubeMesh,
        matcap: ResourceKey,
        environment: ResourceKey,
    ) -> Result<MeshResources, VisualError> {
        let matcap_view = self.texture_view(matcap)?;
        let environment_view = self.texture_view(environment)?;
        let material = self.material(
            label,
            &self.solid_material_layout,
            MaterialUniform::solid(),
            &[matcap_view, environment_view],
        );
        let model = SolidModel::new(&self.device, label, mesh);
        log::debug!("Uploaded {} triangles for '{}'", mesh.triangle_count(), label);

        let geometry = self.next_resource(ResourceKind::Geometry)?;
        let material_handle = self.next_resource(ResourceKind::Material)?;
        self.geometries
            .insert(geometry.key().id, GpuGeometry::Solid(model));
        self.materials.insert(material_handle.key().id, material);
        Ok(MeshResources {
            geometry,
            material: material_handle,
        })
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() || self.disposed {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.camera_uniform.update_viewport(size);
        self.reconfigure();
    }

    fn render(&mut self, frame: &Frame) -> Result<(), VisualError> {
        if self.disposed {
            return Err(VisualError::ContextUnavailable("context disposed".into()));
        }
        for draw in &frame.draws {
            if !self.geometries.contains_key(&draw.geometry.id)
                || !self.materials.contains_key(&draw.material.id)
            {
                return Err(VisualError::ContextUnavailable(format!(
                    "mesh {} is not live",
                    draw.geometry.id
                )));
            }
        }

        match lib_render::render(self, frame) {
            Ok(()) => Ok(()),
            // Reconfigure the surface if it's lost or outdated; the next frame draws.
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn release(&mut self, resource: Resource) {
        let id = resource.key().id;
        match resource.kind() {
            ResourceKind::Texture => {
                if let Some(texture) = self.textures.remove(&id) {
                    texture.texture.destroy();
                }
            }
            ResourceKind::Geometry => {
                if let Some(geometry) = self.geometries.remove(&id) {
                    geometry.destroy();
                }
            }
            ResourceKind::Material => {
                if let Some(material) = self.materials.remove(&id) {
                    material.buffer.destroy();
                }
            }
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let leaked = self.textures.len() + self.geometries.len() + self.materials.len();
        if leaked > 0 {
            log::warn!("Disposing GPU context with {} live resources", leaked);
        }
        self.textures.clear();
        self.geometries.clear();
        self.materials.clear();
        self.camera_buffer.destroy();
        self.disposed = true;
        log::info!("GPU context disposed");
    }
}

/// Initialize GPU context (surface, device, queue, config)
async fn init_gpu_context(
    window: Arc<Window>,
    size: SurfaceSize,
) -> Result<
    (
        wgpu::Surface<'static>,
        wgpu::Device,
        wgpu::Queue,
        wgpu::SurfaceConfiguration,
    ),
    VisualError,
> {
    // The instance is a handle to our GPU
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::BROWSER_WEBGPU,
        ..Default::default()
    });

    let surface = instance.create_surface(window)?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| VisualError::ContextUnavailable("no compatible GPU adapter".into()))?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits())
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .ok_or_else(|| VisualError::Surface("surface reports no formats".into()))?;

    // Prefer a compositor mode that honours the alpha channel so transparent
    // scenes show the page behind them.
    let alpha_mode = [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|mode| surface_caps.alpha_modes.contains(mode))
    .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    Ok((surface, device, queue, config))
}

fn init_camera_binding(
    device: &wgpu::Device,
    size: SurfaceSize,
) -> (CameraUniform, wgpu::Buffer, wgpu::BindGroup, wgpu::BindGroupLayout) {
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_viewport(size);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Camera Buffer"),
        contents: bytemuck::cast_slice(&[camera_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let camera_bind_group_layout =
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &camera_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_buffer.as_entire_binding(),
        }],
        label: Some("camera_bind_group"),
    });

    (camera_uniform, camera_buffer, camera_bind_group, camera_bind_group_layout)
}

/// Uniform at 0, sampler at 1, then `texture_count` 2D textures.
fn material_layout(device: &wgpu::Device, label: &str, texture_count: u32) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    for i in 0..texture_count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2 + i,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some(label),
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let depth_size = wgpu::Extent3d {
        width: config.width.max(1),
        height: config.height.max(1),
        depth_or_array_layers: 1,
    };

    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: depth_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[DEPTH_FORMAT],
    });

    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}
