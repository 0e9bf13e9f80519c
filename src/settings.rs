use crate::errors::PhysarumError;
use log::info;
use serde::Deserialize;

/// Thread-group width of the agent-update dispatch.
pub const AGENT_THREADS: u32 = 32;
/// Thread-group width (per axis) of the texture-sized dispatches.
pub const TEXTURE_THREADS: u32 = 32;
/// The species identity mask is four lanes wide, so four species at most.
pub const MAX_SPECIES: usize = 4;

pub const DEFAULT_SETTINGS_FILE: &str = "configs/default.json";

/// One simulation run's worth of configuration. Loaded once, normalized to
/// thread-group granularity, then immutable for the rest of the run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub agent_count: u32,
    pub steps_per_frame: u32,
    pub starting_mode: i64,
    pub die_on_trapped: bool,
    pub death_time: f32,
    pub hard_avoidance: bool,
    pub draw_agents_only: bool,
    pub decay_rate: f32,
    pub blur_rate: f32,
    pub species: Vec<SpeciesSpec>,
}

/// A species entry as written in the config file:
/// `[sensor_angle_deg, rotation_angle_deg, sensor_offset, speed, deposit, [r, g, b]]`.
/// Color channels may be given as [0,1] floats or [0,255] integers; the
/// encoder sorts that out later.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SpeciesRow")]
pub struct SpeciesSpec {
    pub sensor_angle_deg: f32,
    pub rotation_angle_deg: f32,
    pub sensor_offset: f32,
    pub speed: f32,
    pub deposit: f32,
    pub color: [f32; 3],
}

type SpeciesRow = (f32, f32, f32, f32, f32, [f32; 3]);

impl From<SpeciesRow> for SpeciesSpec {
    fn from(row: SpeciesRow) -> Self {
        Self {
            sensor_angle_deg: row.0,
            rotation_angle_deg: row.1,
            sensor_offset: row.2,
            speed: row.3,
            deposit: row.4,
            color: row.5,
        }
    }
}

impl Settings {
    pub fn load_from_file(settings_file_name: &str) -> Result<Self, PhysarumError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(settings_file_name))
            .build()?
            .try_deserialize::<Settings>()?;

        info!(
            "successfully loaded settings from '{}'",
            settings_file_name
        );

        settings.resolve()
    }

    /// Truncates field dimensions and agent count down to the thread-group
    /// granularity that every dispatch assumes. A configured value below the
    /// group width truncates to zero, which is a fatal configuration error,
    /// not an empty simulation.
    pub fn resolve(mut self) -> Result<Self, PhysarumError> {
        self.width = (self.width / TEXTURE_THREADS) * TEXTURE_THREADS;
        self.height = (self.height / TEXTURE_THREADS) * TEXTURE_THREADS;
        self.agent_count = (self.agent_count / AGENT_THREADS) * AGENT_THREADS;

        if self.width == 0 || self.height == 0 {
            return Err(PhysarumError::Configuration(format!(
                "width and height must be at least {} pixels, got {}x{} after rounding",
                TEXTURE_THREADS, self.width, self.height
            )));
        }
        if self.agent_count == 0 {
            return Err(PhysarumError::Configuration(format!(
                "agent_count must be at least {}, got 0 after rounding",
                AGENT_THREADS
            )));
        }
        if self.species.is_empty() {
            return Err(PhysarumError::Configuration(
                "at least one species entry is required".to_string(),
            ));
        }
        if self.species.len() > MAX_SPECIES {
            return Err(PhysarumError::Configuration(format!(
                "at most {} species are supported, got {}",
                MAX_SPECIES,
                self.species.len()
            )));
        }

        Ok(self)
    }

    pub fn species_count(&self) -> u32 {
        self.species.len() as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            width: 640,
            height: 480,
            agent_count: 4096,
            steps_per_frame: 1,
            starting_mode: 0,
            die_on_trapped: false,
            death_time: 20.0,
            hard_avoidance: false,
            draw_agents_only: false,
            decay_rate: 0.05,
            blur_rate: 0.2,
            species: vec![SpeciesSpec::from((45.0, 45.0, 9.0, 1.0, 1.0, [1.0, 1.0, 1.0]))],
        }
    }

    #[test]
    fn resolve_rounds_down_to_thread_group_multiples() {
        for (w, h, n) in [(33, 63, 33), (100, 250, 1000), (1023, 767, 99_999)] {
            let settings = Settings {
                width: w,
                height: h,
                agent_count: n,
                ..base_settings()
            };
            let resolved = settings.resolve().unwrap();

            assert_eq!(resolved.width % TEXTURE_THREADS, 0);
            assert_eq!(resolved.height % TEXTURE_THREADS, 0);
            assert_eq!(resolved.agent_count % AGENT_THREADS, 0);
            assert!(resolved.width <= w);
            assert!(resolved.height <= h);
            assert!(resolved.agent_count <= n);
        }
    }

    #[test]
    fn resolve_keeps_exact_multiples_unchanged() {
        let resolved = base_settings().resolve().unwrap();
        assert_eq!(resolved.width, 640);
        assert_eq!(resolved.height, 480);
        assert_eq!(resolved.agent_count, 4096);
    }

    #[test]
    fn resolve_rejects_dimensions_that_round_to_zero() {
        let settings = Settings {
            width: 31,
            ..base_settings()
        };
        assert!(matches!(
            settings.resolve(),
            Err(PhysarumError::Configuration(_))
        ));

        let settings = Settings {
            agent_count: 31,
            ..base_settings()
        };
        assert!(matches!(
            settings.resolve(),
            Err(PhysarumError::Configuration(_))
        ));
    }

    #[test]
    fn resolve_rejects_empty_and_oversized_species_lists() {
        let settings = Settings {
            species: vec![],
            ..base_settings()
        };
        assert!(settings.resolve().is_err());

        let entry = SpeciesSpec::from((45.0, 45.0, 9.0, 1.0, 1.0, [1.0, 1.0, 1.0]));
        let settings = Settings {
            species: vec![entry; 5],
            ..base_settings()
        };
        assert!(settings.resolve().is_err());
    }

    #[test]
    fn species_rows_deserialize_from_mixed_literal_styles() {
        let json = r#"[45, 60.5, 9, 1.2, 1, [255, 0, 0.5]]"#;
        let spec: SpeciesSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.sensor_angle_deg, 45.0);
        assert_eq!(spec.rotation_angle_deg, 60.5);
        assert_eq!(spec.color, [255.0, 0.0, 0.5]);
    }

    #[test]
    fn missing_fields_are_a_fatal_config_error() {
        let result = config::Config::builder()
            .add_source(config::File::from_str(
                r#"{"width": 640, "height": 480}"#,
                config::FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Settings>();
        assert!(result.is_err());
    }
}
