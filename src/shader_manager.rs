use std::borrow::Cow;
use wgpu::{Device, ShaderModule, ShaderModuleDescriptor, ShaderSource};

/// All five shader modules, compiled once at startup. Configuration reaches
/// the kernels through the params uniform, so the compiled modules never
/// change for the lifetime of a run.
pub struct ShaderManager {
    pub agent_update_shader: ShaderModule,
    pub trail_diffuse_shader: ShaderModule,
    pub agents_only_shader: ShaderModule,
    pub final_color_shader: ShaderModule,
    pub blit_shader: ShaderModule,
}

impl ShaderManager {
    pub fn new(device: &Device) -> Self {
        Self {
            agent_update_shader: Self::create_shader(
                device,
                "Agent Update Shader",
                include_str!("shaders/compute-agents.wgsl"),
            ),
            trail_diffuse_shader: Self::create_shader(
                device,
                "Trail Diffuse Shader",
                include_str!("shaders/compute-trails.wgsl"),
            ),
            agents_only_shader: Self::create_shader(
                device,
                "Agents Only Shader",
                include_str!("shaders/color-agents.wgsl"),
            ),
            final_color_shader: Self::create_shader(
                device,
                "Final Color Shader",
                include_str!("shaders/color-screen.wgsl"),
            ),
            blit_shader: Self::create_shader(device, "Blit Shader", include_str!("shaders/blit.wgsl")),
        }
    }

    fn create_shader(device: &Device, label: &str, source: &str) -> ShaderModule {
        device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(Cow::Borrowed(source)),
        })
    }
}
