use crate::agent::seed_agents;
use crate::bind_group_manager::BindGroupManager;
use crate::buffer_ring::BufferRing;
use crate::errors::PhysarumError;
use crate::pipeline_manager::PipelineManager;
use crate::settings::{Settings, AGENT_THREADS, TEXTURE_THREADS};
use crate::shader_manager::ShaderManager;
use crate::species::encode_species;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Configuration as the kernels consume it. Written into the params uniform
/// once at startup; the flags are u32 because WGSL has no bool in uniform
/// address space. Field order matches the WGSL `Params` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct SimParams {
    width: u32,
    height: u32,
    agent_count: u32,
    species_count: u32,
    decay_rate: f32,
    blur_rate: f32,
    death_time: f32,
    die_on_trapped: u32,
    hard_avoidance: u32,
    draw_agents_only: u32,
    _padding: [u32; 2],
}

impl SimParams {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            agent_count: settings.agent_count,
            species_count: settings.species_count(),
            decay_rate: settings.decay_rate,
            blur_rate: settings.blur_rate,
            death_time: settings.death_time,
            die_on_trapped: settings.die_on_trapped as u32,
            hard_avoidance: settings.hard_avoidance as u32,
            draw_agents_only: settings.draw_agents_only as u32,
            _padding: [0; 2],
        }
    }
}

/// Where the frame cycle currently is. Sub-steps run under `Stepping`, the
/// two color dispatches under `Drawing`, and the surface handoff under
/// `Presenting`; between frames the loop sits in `Idle`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Stepping,
    Drawing,
    Presenting,
}

/// Owns every GPU resource of one simulation run, the presentation surface
/// included. Dropping it tears everything down, on the error paths too.
pub struct Simulation {
    settings: Settings,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: wgpu::Surface<'static>,
    pipelines: PipelineManager,
    bind_groups: BindGroupManager,
    ring: BufferRing,
    time_buffer: wgpu::Buffer,
    _species_buffer: wgpu::Buffer,
    _params_buffer: wgpu::Buffer,
    _trail_map_buffer: wgpu::Buffer,
    _agents_overlay_buffer: wgpu::Buffer,
    _display_texture: wgpu::Texture,
    started_at: Instant,
    state: LoopState,
}

impl Simulation {
    pub fn new(settings: Settings, window: Arc<Window>) -> Result<Self, PhysarumError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| PhysarumError::Presentation(format!("surface creation failed: {}", e)))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| {
            PhysarumError::ResourceAllocation("no compatible GPU adapter found".to_string())
        })?;

        // The texture-sized passes run 32x32 groups, which is above the
        // default invocation limit.
        let required_limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: (TEXTURE_THREADS * TEXTURE_THREADS).max(256),
            ..wgpu::Limits::default()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Simulation Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| PhysarumError::ResourceAllocation(format!("device request failed: {}", e)))?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        surface.configure(
            &device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: surface_format,
                width: settings.width,
                height: settings.height,
                present_mode: wgpu::PresentMode::Fifo,
                alpha_mode: surface_caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
        );

        let shaders = ShaderManager::new(&device);
        let pipelines = PipelineManager::new(&device, &shaders, surface_format);

        let species_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Species Buffer"),
            contents: bytemuck::cast_slice(&encode_species(&settings.species)),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Params Buffer"),
            contents: bytemuck::bytes_of(&SimParams::from_settings(&settings)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let time_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Time Buffer"),
            size: std::mem::size_of::<f32>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Both field buffers start zeroed, one vec4<f32> per texel.
        let field_size = (settings.width * settings.height) as wgpu::BufferAddress * 16;
        let trail_map_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Map Buffer"),
            size: field_size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let agents_overlay_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Agents Overlay Buffer"),
            size: field_size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let display_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Display Texture"),
            size: wgpu::Extent3d {
                width: settings.width,
                height: settings.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let display_view = display_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let display_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Display Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let ring = BufferRing::new(Arc::clone(&device), Arc::clone(&queue), settings.agent_count);
        let mut rng = StdRng::from_os_rng();
        let agents = seed_agents(&settings, &mut rng);
        ring.upload_seed(&agents);

        let bind_groups = BindGroupManager::new(
            &device,
            &pipelines,
            &ring,
            &trail_map_buffer,
            &species_buffer,
            &time_buffer,
            &params_buffer,
            &agents_overlay_buffer,
            &display_view,
            &display_sampler,
        );

        info!(
            "simulation ready: {}x{} field, {} agents, {} species, {} sub-steps per frame",
            settings.width,
            settings.height,
            settings.agent_count,
            settings.species_count(),
            settings.steps_per_frame,
        );

        Ok(Self {
            settings,
            device,
            queue,
            surface,
            pipelines,
            bind_groups,
            ring,
            time_buffer,
            _species_buffer: species_buffer,
            _params_buffer: params_buffer,
            _trail_map_buffer: trail_map_buffer,
            _agents_overlay_buffer: agents_overlay_buffer,
            _display_texture: display_texture,
            started_at: Instant::now(),
            state: LoopState::Idle,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One full frame: the configured number of sub-steps, then the color
    /// passes, then the surface handoff.
    pub fn advance_frame(&mut self) -> Result<(), PhysarumError> {
        for _ in 0..self.settings.steps_per_frame {
            self.step()?;
        }
        self.draw();
        self.present()
    }

    /// One sub-step: refresh the time scalar, run the agent kernel, round
    /// the agent table through the host, then diffuse the trail map. The
    /// round trip blocks, which is exactly what keeps the diffusion pass
    /// from racing the agent writes.
    fn step(&mut self) -> Result<(), PhysarumError> {
        self.state = LoopState::Stepping;

        let elapsed = self.started_at.elapsed().as_secs_f32();
        self.queue
            .write_buffer(&self.time_buffer, 0, bytemuck::bytes_of(&elapsed));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Agent Update Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Agent Update Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.agent_update_pipeline);
            pass.set_bind_group(0, &self.bind_groups.agent_update_bind_group, &[]);
            pass.dispatch_workgroups(self.settings.agent_count / AGENT_THREADS, 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        self.ring.advance()?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Trail Diffuse Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Trail Diffuse Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.trail_diffuse_pipeline);
            pass.set_bind_group(0, &self.bind_groups.trail_diffuse_bind_group, &[]);
            pass.dispatch_workgroups(
                self.settings.width / TEXTURE_THREADS,
                self.settings.height / TEXTURE_THREADS,
                1,
            );
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        debug!("sub-step complete at t={}", elapsed);

        Ok(())
    }

    /// The color passes: the agents-only plot when configured, then the
    /// final composite into the display texture.
    fn draw(&mut self) {
        self.state = LoopState::Drawing;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Draw Encoder"),
            });

        if self.settings.draw_agents_only {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Agents Only Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.agents_only_pipeline);
            pass.set_bind_group(0, &self.bind_groups.agents_only_bind_group, &[]);
            pass.dispatch_workgroups(self.settings.width / AGENT_THREADS, 1, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Final Color Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.final_color_pipeline);
            pass.set_bind_group(0, &self.bind_groups.final_color_bind_group, &[]);
            pass.dispatch_workgroups(
                self.settings.width / TEXTURE_THREADS,
                self.settings.height / TEXTURE_THREADS,
                1,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Blits the display texture onto the next surface frame and presents.
    fn present(&mut self) -> Result<(), PhysarumError> {
        self.state = LoopState::Presenting;

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.render_pipeline);
            pass.set_bind_group(0, &self.bind_groups.render_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        frame.present();
        self.state = LoopState::Idle;

        Ok(())
    }
}
