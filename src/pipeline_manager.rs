use crate::shader_manager::ShaderManager;
use wgpu::{
    BindGroupLayout, ComputePipeline, Device, PipelineLayout, PipelineLayoutDescriptor,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, TextureFormat,
};

/// The four compute stages in their fixed dependency order, plus the present
/// blit. Pipelines and layouts are built once and never touched again.
pub struct PipelineManager {
    pub agent_update_pipeline: ComputePipeline,
    pub trail_diffuse_pipeline: ComputePipeline,
    pub agents_only_pipeline: ComputePipeline,
    pub final_color_pipeline: ComputePipeline,
    pub render_pipeline: RenderPipeline,
    pub agent_update_bind_group_layout: BindGroupLayout,
    pub trail_diffuse_bind_group_layout: BindGroupLayout,
    pub agents_only_bind_group_layout: BindGroupLayout,
    pub final_color_bind_group_layout: BindGroupLayout,
    pub render_bind_group_layout: BindGroupLayout,
}

impl PipelineManager {
    pub fn new(device: &Device, shader_manager: &ShaderManager, surface_format: TextureFormat) -> Self {
        let agent_update_bind_group_layout = Self::create_agent_update_bind_group_layout(device);
        let trail_diffuse_bind_group_layout = Self::create_trail_diffuse_bind_group_layout(device);
        let agents_only_bind_group_layout = Self::create_agents_only_bind_group_layout(device);
        let final_color_bind_group_layout = Self::create_final_color_bind_group_layout(device);
        let render_bind_group_layout = Self::create_render_bind_group_layout(device);

        let agent_update_pipeline_layout =
            Self::create_pipeline_layout(device, &[&agent_update_bind_group_layout]);
        let trail_diffuse_pipeline_layout =
            Self::create_pipeline_layout(device, &[&trail_diffuse_bind_group_layout]);
        let agents_only_pipeline_layout =
            Self::create_pipeline_layout(device, &[&agents_only_bind_group_layout]);
        let final_color_pipeline_layout =
            Self::create_pipeline_layout(device, &[&final_color_bind_group_layout]);
        let render_pipeline_layout =
            Self::create_pipeline_layout(device, &[&render_bind_group_layout]);

        Self {
            agent_update_pipeline: Self::create_compute_pipeline(
                device,
                &agent_update_pipeline_layout,
                &shader_manager.agent_update_shader,
                "agent update",
            ),
            trail_diffuse_pipeline: Self::create_compute_pipeline(
                device,
                &trail_diffuse_pipeline_layout,
                &shader_manager.trail_diffuse_shader,
                "trail diffuse",
            ),
            agents_only_pipeline: Self::create_compute_pipeline(
                device,
                &agents_only_pipeline_layout,
                &shader_manager.agents_only_shader,
                "agents only",
            ),
            final_color_pipeline: Self::create_compute_pipeline(
                device,
                &final_color_pipeline_layout,
                &shader_manager.final_color_shader,
                "final color",
            ),
            render_pipeline: Self::create_render_pipeline(
                device,
                &render_pipeline_layout,
                &shader_manager.blit_shader,
                surface_format,
            ),
            agent_update_bind_group_layout,
            trail_diffuse_bind_group_layout,
            agents_only_bind_group_layout,
            final_color_bind_group_layout,
            render_bind_group_layout,
        }
    }

    fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn create_agent_update_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Agent Update Bind Group Layout"),
            entries: &[
                // Trail map, sensed and deposited into
                Self::storage_entry(0, false),
                // Agent table from the previous sub-step
                Self::storage_entry(1, true),
                // Seconds since start
                Self::uniform_entry(2),
                // Species table
                Self::storage_entry(3, true),
                // Agent table this sub-step writes
                Self::storage_entry(4, false),
                // Simulation params
                Self::uniform_entry(5),
            ],
        })
    }

    fn create_trail_diffuse_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Trail Diffuse Bind Group Layout"),
            entries: &[Self::storage_entry(0, false), Self::uniform_entry(1)],
        })
    }

    fn create_agents_only_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Agents Only Bind Group Layout"),
            entries: &[
                Self::storage_entry(0, true),
                Self::storage_entry(1, false),
                Self::uniform_entry(2),
            ],
        })
    }

    fn create_final_color_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Final Color Bind Group Layout"),
            entries: &[
                Self::storage_entry(0, true),
                Self::storage_entry(1, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba16Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                Self::storage_entry(3, false),
                Self::uniform_entry(4),
            ],
        })
    }

    fn create_render_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
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
        })
    }

    fn create_pipeline_layout(
        device: &Device,
        bind_group_layouts: &[&BindGroupLayout],
    ) -> PipelineLayout {
        device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts,
            push_constant_ranges: &[],
        })
    }

    fn create_compute_pipeline(
        device: &Device,
        layout: &PipelineLayout,
        shader: &ShaderModule,
        label: &str,
    ) -> ComputePipeline {
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            module: shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        })
    }

    fn create_render_pipeline(
        device: &Device,
        layout: &PipelineLayout,
        shader: &ShaderModule,
        surface_format: TextureFormat,
    ) -> RenderPipeline {
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
