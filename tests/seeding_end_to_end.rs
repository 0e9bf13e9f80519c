//! Config-to-population tests: a settings file goes through resolution and
//! seeding exactly the way `Simulation::new` drives it.

use physarum::seed_agents;
use physarum::settings::Settings;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::TAU;

fn load(json: &str) -> Settings {
    config::Config::builder()
        .add_source(config::File::from_str(json, config::FileFormat::Json))
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
        .resolve()
        .unwrap()
}

fn center_config(starting_mode: i64) -> String {
    format!(
        r#"{{
            "width": 64,
            "height": 64,
            "agent_count": 64,
            "steps_per_frame": 1,
            "starting_mode": {},
            "die_on_trapped": false,
            "death_time": 20,
            "hard_avoidance": false,
            "draw_agents_only": false,
            "decay_rate": 0.05,
            "blur_rate": 0.2,
            "species": [[45, 45, 9, 1, 1, [1, 1, 1]]]
        }}"#,
        starting_mode
    )
}

#[test]
fn center_seeded_config_produces_a_uniform_population_at_the_center() {
    let settings = load(&center_config(1));
    assert_eq!(settings.width, 64);
    assert_eq!(settings.height, 64);
    assert_eq!(settings.agent_count, 64);

    let mut rng = StdRng::seed_from_u64(1);
    let agents = seed_agents(&settings, &mut rng);

    assert_eq!(agents.len(), 64);
    for agent in &agents {
        assert_eq!((agent.x, agent.y), (32.0, 32.0));
        assert_eq!(agent.species, 0);
        assert_eq!(agent.alive, 1.0);
        assert!((0.0..TAU).contains(&agent.heading));
    }

    let spread = agents
        .iter()
        .map(|a| a.heading)
        .fold((f32::MAX, f32::MIN), |(lo, hi), h| (lo.min(h), hi.max(h)));
    assert!(spread.1 - spread.0 > TAU / 2.0, "headings cluster: {:?}", spread);
}

#[test]
fn dimensions_round_down_to_dispatch_granularity() {
    let json = center_config(1)
        .replace("\"width\": 64", "\"width\": 95")
        .replace("\"height\": 64", "\"height\": 100")
        .replace("\"agent_count\": 64", "\"agent_count\": 127");
    let settings = load(&json);
    assert_eq!(settings.width, 64);
    assert_eq!(settings.height, 96);
    assert_eq!(settings.agent_count, 96);
}

#[test]
fn out_of_range_starting_mode_seeds_like_the_boundary_mode() {
    let from_mode_7 = seed_agents(&load(&center_config(7)), &mut StdRng::seed_from_u64(42));
    let from_mode_4 = seed_agents(&load(&center_config(4)), &mut StdRng::seed_from_u64(42));
    assert_eq!(from_mode_7, from_mode_4);
}

#[test]
fn shipped_configs_load_and_resolve() {
    for path in ["configs/default.json", "configs/three-species.json"] {
        let settings = Settings::load_from_file(path).unwrap();
        assert!(settings.width % 32 == 0 && settings.height % 32 == 0);
        assert!(!settings.species.is_empty());
    }
}
