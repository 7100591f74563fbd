#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use foundation::Handle;
    use gpu::{Blend, FrameSink, LayerDraw, RenderCommand, RenderFrame, SurfaceBinding};
    use scene::{Side, starfield};
    use streaming::{TextureCache, TextureHandle, WrapMode};

    /// Upper bound on shells per frame; sizes the per-layer uniform buffer.
    const MAX_LAYERS: u64 = 8;

    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        stars_pipeline: ::wgpu::RenderPipeline,
        stars_buffer: ::wgpu::Buffer,
        stars_count: u32,
        layer_pipelines: HashMap<(Side, Blend), ::wgpu::RenderPipeline>,
        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        layer_buffer: ::wgpu::Buffer,
        layer_bind_group: ::wgpu::BindGroup,
        layer_stride: u64,
        surface_layout: ::wgpu::BindGroupLayout,
        blank_surface: ::wgpu::BindGroup,
        surfaces: HashMap<Handle, ::wgpu::BindGroup>,
        meshes: HashMap<u32, SphereMesh>,
        depth_view: ::wgpu::TextureView,
    }

    struct SphereMesh {
        vertices: ::wgpu::Buffer,
        indices: ::wgpu::Buffer,
        index_count: u32,
    }

    const LAYER_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
    point_light: vec4<f32>,
    // x: directional intensity, y: point intensity
    intensities: vec4<f32>,
};

struct Layer {
    model: mat4x4<f32>,
    // rgb tint, a opacity
    tint: vec4<f32>,
    // x: mapped, y: lit from inside (back side)
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> layer: Layer;
@group(2) @binding(0) var surface_map: texture_2d<f32>;
@group(2) @binding(1) var surface_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = layer.model * vec4<f32>(position, 1.0);
    let n = normalize((layer.model * vec4<f32>(normal, 0.0)).xyz);
    return VsOut(globals.view_proj * world, world.xyz, n, uv);
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let texel = textureSample(surface_map, surface_sampler, fs_in.uv);
    let mapped = layer.flags.x > 0.5;
    let base = select(vec3<f32>(1.0), texel.rgb, mapped) * layer.tint.rgb;
    let alpha = select(1.0, texel.a, mapped) * layer.tint.a;

    var n = normalize(fs_in.normal);
    if (layer.flags.y > 0.5) {
        n = -n;
    }
    let diffuse = max(dot(n, normalize(globals.light_dir.xyz)), 0.0) * globals.intensities.x;
    let to_point = normalize(globals.point_light.xyz - fs_in.world);
    let point = max(dot(n, to_point), 0.0) * globals.intensities.y;
    let light = globals.ambient.rgb + vec3<f32>(diffuse + point);
    return vec4<f32>(base * light, alpha);
}
"#;

    const STARS_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
    point_light: vec4<f32>,
    intensities: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) a: f32,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) brightness: f32) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), brightness);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, in.a);
}
"#;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Vertex {
        position: [f32; 3],
        normal: [f32; 3],
        uv: [f32; 2],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct StarVertex {
        position: [f32; 3],
        brightness: f32,
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        eye: [f32; 4],
        light_dir: [f32; 4],
        ambient: [f32; 4],
        point_light: [f32; 4],
        intensities: [f32; 4],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct LayerUniform {
        model: [[f32; 4]; 4],
        tint: [f32; 4],
        flags: [f32; 4],
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    /// Unit sphere, counter-clockwise when seen from outside, with
    /// equirectangular uvs (v = 0 at the north pole).
    fn generate_sphere_mesh(segments: u32) -> (Vec<Vertex>, Vec<u16>) {
        let width = segments.clamp(3, 128);
        let height = (segments / 2).clamp(2, 64);

        let mut vertices = Vec::with_capacity(((width + 1) * (height + 1)) as usize);
        for iy in 0..=height {
            let v = iy as f32 / height as f32;
            let theta = v * std::f32::consts::PI;
            for ix in 0..=width {
                let u = ix as f32 / width as f32;
                let phi = u * std::f32::consts::TAU;
                let x = -phi.cos() * theta.sin();
                let y = theta.cos();
                let z = phi.sin() * theta.sin();
                vertices.push(Vertex {
                    position: [x, y, z],
                    normal: [x, y, z],
                    uv: [u, v],
                });
            }
        }

        let stride = width + 1;
        let mut indices = Vec::with_capacity((width * height * 6) as usize);
        for iy in 0..height {
            for ix in 0..width {
                let a = iy * stride + ix + 1;
                let b = iy * stride + ix;
                let c = (iy + 1) * stride + ix;
                let d = (iy + 1) * stride + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a as u16, b as u16, d as u16]);
                }
                if iy != height - 1 {
                    indices.extend_from_slice(&[b as u16, c as u16, d as u16]);
                }
            }
        }

        (vertices, indices)
    }

    fn layer_pipeline(
        device: &::wgpu::Device,
        layout: &::wgpu::PipelineLayout,
        shader: &::wgpu::ShaderModule,
        format: ::wgpu::TextureFormat,
        side: Side,
        blend: Blend,
    ) -> ::wgpu::RenderPipeline {
        let cull_mode = match side {
            Side::Front => Some(::wgpu::Face::Back),
            Side::Back => Some(::wgpu::Face::Front),
            Side::Double => None,
        };
        let (color_blend, depth_write_enabled) = match blend {
            Blend::Opaque => (::wgpu::BlendState::REPLACE, true),
            Blend::Alpha => (::wgpu::BlendState::ALPHA_BLENDING, false),
        };

        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("globe-layer-pipeline"),
            layout: Some(layout),
            vertex: ::wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 12,
                            shader_location: 1,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x2,
                            offset: 24,
                            shader_location: 2,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(color_blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn surface_bind_group(
        device: &::wgpu::Device,
        layout: &::wgpu::BindGroupLayout,
        view: &::wgpu::TextureView,
        sampler: &::wgpu::Sampler,
    ) -> ::wgpu::BindGroup {
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-surface-bg"),
            layout,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ::wgpu::BindingResource::TextureView(view),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn address_mode(wrap: WrapMode) -> ::wgpu::AddressMode {
        match wrap {
            WrapMode::Repeat => ::wgpu::AddressMode::Repeat,
            WrapMode::Clamp => ::wgpu::AddressMode::ClampToEdge,
        }
    }

    fn upload_rgba(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        layout: &::wgpu::BindGroupLayout,
        width: u32,
        height: u32,
        rgba: &[u8],
        wrap: (WrapMode, WrapMode),
    ) -> ::wgpu::BindGroup {
        let size = ::wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-surface-map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ::wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: ::wgpu::Origin3d::ZERO,
                aspect: ::wgpu::TextureAspect::All,
            },
            rgba,
            ::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("globe-surface-sampler"),
            address_mode_u: address_mode(wrap.0),
            address_mode_v: address_mode(wrap.1),
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });
        surface_bind_group(device, layout, &view, &sampler)
    }

    pub async fn init_wgpu_from_canvas_id(
        canvas_id: &str,
        star_count: u32,
    ) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width();
        let height = canvas_elem.height();

        // The surface must not outlive its instance; the instance lives for
        // the whole page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("globe-wgpu-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .cloned()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().cloned())
            .ok_or_else(|| JsValue::from_str("surface has no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .cloned()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let layer_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("globe-layer-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(LAYER_SHADER)),
        });
        let stars_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("globe-stars-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(STARS_SHADER)),
        });

        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-globals-bgl"),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-globals-bg"),
            layout: &globals_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let layer_size = std::mem::size_of::<LayerUniform>() as u64;
        let layer_stride = layer_size.div_ceil(align) * align;
        let layer_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-layers"),
            size: layer_stride * MAX_LAYERS,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let layer_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-layer-bgl"),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: ::wgpu::BufferSize::new(layer_size),
                },
                count: None,
            }],
        });
        let layer_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-layer-bg"),
            layout: &layer_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: ::wgpu::BindingResource::Buffer(::wgpu::BufferBinding {
                    buffer: &layer_buffer,
                    offset: 0,
                    size: ::wgpu::BufferSize::new(layer_size),
                }),
            }],
        });

        let surface_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-surface-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layer_pipeline_layout =
            device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("globe-layer-pipeline-layout"),
                bind_group_layouts: &[&globals_layout, &layer_layout, &surface_layout],
                immediate_size: 0,
            });
        let stars_pipeline_layout =
            device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("globe-stars-pipeline-layout"),
                bind_group_layouts: &[&globals_layout],
                immediate_size: 0,
            });

        let mut layer_pipelines = HashMap::new();
        for side in [Side::Front, Side::Back, Side::Double] {
            for blend in [Blend::Opaque, Blend::Alpha] {
                layer_pipelines.insert(
                    (side, blend),
                    layer_pipeline(
                        &device,
                        &layer_pipeline_layout,
                        &layer_shader,
                        config.format,
                        side,
                        blend,
                    ),
                );
            }
        }

        let stars_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("globe-stars-pipeline"),
            layout: Some(&stars_pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &stars_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &stars_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::PointList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let stars: Vec<StarVertex> = starfield(star_count.max(1))
            .map(|s| StarVertex {
                position: s.position.to_f32(),
                brightness: s.brightness,
            })
            .collect();
        let stars_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-stars"),
            contents: bytemuck::cast_slice(&stars),
            usage: ::wgpu::BufferUsages::VERTEX,
        });

        let blank_surface = upload_rgba(
            &device,
            &queue,
            &surface_layout,
            1,
            1,
            &[255, 255, 255, 255],
            (WrapMode::Repeat, WrapMode::Repeat),
        );

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            stars_pipeline,
            stars_buffer,
            stars_count: star_count,
            layer_pipelines,
            globals_buffer,
            globals_bind_group,
            layer_buffer,
            layer_bind_group,
            layer_stride,
            surface_layout,
            blank_surface,
            surfaces: HashMap::new(),
            meshes: HashMap::new(),
            depth_view,
        })
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config);
    }

    fn ensure_mesh(ctx: &mut WgpuContext, segments: u32) {
        if ctx.meshes.contains_key(&segments) {
            return;
        }
        let (vertices, indices) = generate_sphere_mesh(segments);
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-sphere-vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-sphere-indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: ::wgpu::BufferUsages::INDEX,
            });
        ctx.meshes.insert(
            segments,
            SphereMesh {
                vertices: vertex_buffer,
                indices: index_buffer,
                index_count: indices.len() as u32,
            },
        );
    }

    fn ensure_surface(ctx: &mut WgpuContext, handle: TextureHandle, cache: &TextureCache) {
        if ctx.surfaces.contains_key(&handle.id) {
            return;
        }
        let Some(image) = cache.image(handle) else {
            return;
        };
        let bind_group = upload_rgba(
            &ctx.device,
            &ctx.queue,
            &ctx.surface_layout,
            image.width,
            image.height,
            &image.rgba,
            (handle.wrap_s, handle.wrap_t),
        );
        tracing::debug!(width = image.width, height = image.height, "surface map uploaded");
        ctx.surfaces.insert(handle.id, bind_group);
    }

    pub fn render_frame(
        ctx: &mut WgpuContext,
        frame: &RenderFrame,
        cache: &TextureCache,
    ) -> Result<(), JsValue> {
        let draws: Vec<LayerDraw> = frame.layer_draws().copied().take(MAX_LAYERS as usize).collect();
        for draw in &draws {
            ensure_mesh(ctx, draw.segments);
            if let SurfaceBinding::Mapped(handle) = draw.surface {
                ensure_surface(ctx, handle, cache);
            }
        }

        let clear = frame
            .commands
            .iter()
            .find_map(|cmd| match cmd {
                RenderCommand::Clear { color } => Some(*color),
                _ => None,
            })
            .unwrap_or([0.0, 0.0, 0.0]);
        let draw_stars = frame
            .commands
            .iter()
            .any(|cmd| matches!(cmd, RenderCommand::Stars { .. }));

        let l = &frame.lighting;
        let globals = Globals {
            view_proj: frame.view_proj,
            eye: [frame.eye[0], frame.eye[1], frame.eye[2], 1.0],
            light_dir: [l.light_dir[0], l.light_dir[1], l.light_dir[2], 0.0],
            ambient: [l.ambient[0], l.ambient[1], l.ambient[2], 1.0],
            point_light: [l.point_position[0], l.point_position[1], l.point_position[2], 1.0],
            intensities: [l.directional_intensity, l.point_intensity, 0.0, 0.0],
        };
        ctx.queue
            .write_buffer(&ctx.globals_buffer, 0, bytemuck::bytes_of(&globals));
        for (i, draw) in draws.iter().enumerate() {
            let uniform = LayerUniform {
                model: draw.model,
                tint: [draw.tint[0], draw.tint[1], draw.tint[2], draw.opacity],
                flags: [
                    matches!(draw.surface, SurfaceBinding::Mapped(_)) as u8 as f32,
                    (draw.side == Side::Back) as u8 as f32,
                    0.0,
                    0.0,
                ],
            };
            ctx.queue.write_buffer(
                &ctx.layer_buffer,
                i as u64 * ctx.layer_stride,
                bytemuck::bytes_of(&uniform),
            );
        }

        let surface_frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = surface_frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("globe-frame-encoder"),
            });

        // Backdrop and stars, no depth.
        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("globe-stars-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: 1.0,
                        }),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            if draw_stars && ctx.stars_count > 0 {
                rpass.set_pipeline(&ctx.stars_pipeline);
                rpass.set_bind_group(0, &ctx.globals_bind_group, &[]);
                rpass.set_vertex_buffer(0, ctx.stars_buffer.slice(..));
                rpass.draw(0..ctx.stars_count, 0..1);
            }
        }

        // Shells innermost first; translucent ones blend over what is drawn.
        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("globe-layers-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Load,
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &ctx.globals_bind_group, &[]);
            for (i, draw) in draws.iter().enumerate() {
                let (Some(pipeline), Some(mesh)) = (
                    ctx.layer_pipelines.get(&(draw.side, draw.blend)),
                    ctx.meshes.get(&draw.segments),
                ) else {
                    continue;
                };
                let surface = match draw.surface {
                    SurfaceBinding::Mapped(handle) => ctx
                        .surfaces
                        .get(&handle.id)
                        .unwrap_or(&ctx.blank_surface),
                    SurfaceBinding::Unmapped => &ctx.blank_surface,
                };
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(1, &ctx.layer_bind_group, &[(i as u64 * ctx.layer_stride) as u32]);
                rpass.set_bind_group(2, surface, &[]);
                rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
                rpass.set_index_buffer(mesh.indices.slice(..), ::wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        surface_frame.present();
        Ok(())
    }

    /// Presents collected frames through wgpu once the context exists.
    pub struct WgpuSink {
        ctx: Option<WgpuContext>,
        textures: Rc<RefCell<TextureCache>>,
    }

    impl WgpuSink {
        pub fn new(textures: Rc<RefCell<TextureCache>>) -> Self {
            Self { ctx: None, textures }
        }

        pub fn attach(&mut self, ctx: WgpuContext) {
            self.ctx = Some(ctx);
        }

        pub fn resize(&mut self, width: u32, height: u32) {
            if let Some(ctx) = self.ctx.as_mut() {
                resize_wgpu(ctx, width, height);
            }
        }
    }

    impl FrameSink for WgpuSink {
        fn present(&mut self, frame: &RenderFrame) {
            let Some(ctx) = self.ctx.as_mut() else {
                return;
            };
            let Ok(cache) = self.textures.try_borrow() else {
                return;
            };
            if let Err(err) = render_frame(ctx, frame, &cache) {
                tracing::warn!(error = ?err, "frame dropped");
            }
        }

        fn release(&mut self) {
            if let Some(mut ctx) = self.ctx.take() {
                ctx.surfaces.clear();
                ctx.meshes.clear();
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gpu::{FrameSink, RenderFrame};
    use streaming::TextureCache;
    use wasm_bindgen::prelude::JsValue;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(
        _canvas_id: &str,
        _star_count: u32,
    ) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub struct WgpuSink;

    impl WgpuSink {
        pub fn new(_textures: Rc<RefCell<TextureCache>>) -> Self {
            Self
        }

        pub fn attach(&mut self, _ctx: WgpuContext) {}

        pub fn resize(&mut self, _width: u32, _height: u32) {}
    }

    impl FrameSink for WgpuSink {
        fn present(&mut self, _frame: &RenderFrame) {}
    }
}

pub use imp::{WgpuContext, WgpuSink, init_wgpu_from_canvas_id};
