use crate::settings::SpeciesSpec;

/// One-hot identity masks, assigned to species by their ordinal position.
/// The agent kernel uses them to pick its own channel out of the trail map
/// and the screen kernel uses them to tint each channel with its color.
pub const SPECIES_MASKS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A single record of the species table as the kernels see it. Field order
/// and padding match the WGSL `Species` struct: the three pad floats bring
/// `color` up to a 16-byte boundary, for a 64-byte stride.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSpecies {
    pub sensor_angle: f32,
    pub rotation_angle: f32,
    pub sensor_offset: f32,
    pub speed: f32,
    pub deposit: f32,
    _padding: [f32; 3],
    pub color: [f32; 4],
    pub mask: [f32; 4],
}

/// Converts the configured species list into the fixed-stride table uploaded
/// to the GPU once at startup. Pure function of its input; angle limits come
/// in as degrees and leave as radians, and color channels above 1 are taken
/// to be 8-bit literals and scaled down to [0,1]. A channel of exactly 1.0
/// stays 1.0.
pub fn encode_species(species: &[SpeciesSpec]) -> Vec<GpuSpecies> {
    species
        .iter()
        .enumerate()
        .map(|(index, spec)| GpuSpecies {
            sensor_angle: spec.sensor_angle_deg.to_radians(),
            rotation_angle: spec.rotation_angle_deg.to_radians(),
            sensor_offset: spec.sensor_offset,
            speed: spec.speed,
            deposit: spec.deposit,
            _padding: [0.0; 3],
            color: [
                normalize_channel(spec.color[0]),
                normalize_channel(spec.color[1]),
                normalize_channel(spec.color[2]),
                1.0,
            ],
            mask: SPECIES_MASKS[index],
        })
        .collect()
}

fn normalize_channel(value: f32) -> f32 {
    if value > 1.0 {
        value / 255.0
    } else {
        value
    }
}
