pub mod agent;
pub mod bind_group_manager;
pub mod buffer_ring;
pub mod errors;
pub mod pipeline_manager;
pub mod settings;
pub mod shader_manager;
pub mod simulation;
pub mod species;

pub use agent::{seed_agents, AgentRecord};
pub use buffer_ring::BufferRing;
pub use settings::Settings;
pub use simulation::Simulation;
