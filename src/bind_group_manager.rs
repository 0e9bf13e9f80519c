use crate::buffer_ring::BufferRing;
use crate::pipeline_manager::PipelineManager;
use wgpu::{BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, Device, TextureView};

/// Concrete resource bindings for the four compute stages and the present
/// blit. Every buffer and view here lives as long as the simulation, so the
/// groups are created once alongside the pipelines.
pub struct BindGroupManager {
    pub agent_update_bind_group: BindGroup,
    pub trail_diffuse_bind_group: BindGroup,
    pub agents_only_bind_group: BindGroup,
    pub final_color_bind_group: BindGroup,
    pub render_bind_group: BindGroup,
}

impl BindGroupManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &Device,
        pipelines: &PipelineManager,
        ring: &BufferRing,
        trail_map_buffer: &Buffer,
        species_buffer: &Buffer,
        time_buffer: &Buffer,
        params_buffer: &Buffer,
        agents_overlay_buffer: &Buffer,
        display_view: &TextureView,
        display_sampler: &wgpu::Sampler,
    ) -> Self {
        let agent_update_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Agent Update Bind Group"),
            layout: &pipelines.agent_update_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: trail_map_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: ring.source().as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: time_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 3,
                    resource: species_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 4,
                    resource: ring.output().as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 5,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let trail_diffuse_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Trail Diffuse Bind Group"),
            layout: &pipelines.trail_diffuse_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: trail_map_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let agents_only_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Agents Only Bind Group"),
            layout: &pipelines.agents_only_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: ring.source().as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: agents_overlay_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let final_color_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Final Color Bind Group"),
            layout: &pipelines.final_color_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: trail_map_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: species_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(display_view),
                },
                BindGroupEntry {
                    binding: 3,
                    resource: agents_overlay_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 4,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let render_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Render Bind Group"),
            layout: &pipelines.render_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(display_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(display_sampler),
                },
            ],
        });

        Self {
            agent_update_bind_group,
            trail_diffuse_bind_group,
            agents_only_bind_group,
            final_color_bind_group,
            render_bind_group,
        }
    }
}
