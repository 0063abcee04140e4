use mycolight_core::config::EngineConfig;
use mycolight_core::scene::SceneKind;
use mycolight_core::{EngineError, LightingEngine};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.json");

    let mut config = EngineConfig::default();
    config.tick_hz = 30.0;
    config.destination = Some("10.0.0.20:6454".into());
    config.groups[1].scene = SceneKind::BioGlow;
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.toml");

    let config = EngineConfig::default();
    config.save(&path).unwrap();
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_handwritten_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.toml");
    fs::write(
        &path,
        r#"
tick_hz = 44.0
universe = 2

[scenes.audio_pulse]
base_hue = 200.0

[[groups]]
name = "Left"
scene = "audio_pulse"
fixtures = [
    { name = "cap", address = 1 },
    { name = "ring", address = 4, channels = 4 },
]
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.tick_hz, 44.0);
    assert_eq!(config.universe, 2);
    assert_eq!(config.scenes.audio_pulse.base_hue, 200.0);
    assert_eq!(config.scenes.audio_pulse.decay_rate, 3.0);
    assert_eq!(config.groups.len(), 1);
    assert_eq!(config.groups[0].scene, SceneKind::AudioPulse);
    assert_eq!(config.groups[0].fixtures[1].channels, 4);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.yaml");
    fs::write(&path, "tick_hz: 40").unwrap();
    assert!(matches!(
        EngineConfig::load(&path),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_malformed_json_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.json");
    fs::write(&path, "{ \"tick_hz\": ").unwrap();
    assert!(matches!(
        EngineConfig::load_or_default(&path),
        Err(EngineError::Json(_))
    ));
}

#[test]
fn test_bad_fixture_does_not_stop_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.json");
    fs::write(
        &path,
        r#"{
            "groups": [
                { "name": "A", "fixtures": [ { "address": 1 }, { "address": 511 } ] },
                { "name": "B", "fixtures": [ { "address": 2 }, { "address": 10, "channels": 4 } ] }
            ]
        }"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let (engine, report) = LightingEngine::new(&config, Instant::now());
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(engine.manager().groups().len(), 2);
    assert_eq!(engine.manager().groups()[0].fixtures().len(), 1);
    assert_eq!(engine.manager().groups()[1].fixtures().len(), 1);
    assert_eq!(engine.status().diagnostics.rejected_fixtures, 2);
}

#[test]
fn test_huge_idle_values_are_clamped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rig.json");
    fs::write(
        &path,
        r#"{ "idle_timeout_secs": 1e30, "idle_check_secs": 3.0e38, "tick_hz": 1e30 }"#,
    )
    .unwrap();

    let raw = EngineConfig::load(&path).unwrap();
    assert_eq!(raw.idle_timeout().as_secs_f32(), EngineConfig::MAX_IDLE_SECS);

    let config = raw.sanitized();
    assert_eq!(config.idle_timeout_secs, EngineConfig::MAX_IDLE_SECS);
    assert_eq!(config.idle_check_secs, EngineConfig::MAX_IDLE_SECS);
    assert_eq!(config.tick_hz, EngineConfig::MAX_TICK_HZ);
    assert_eq!(config.idle_check_interval(), Duration::from_secs(86_400));

    let (engine, report) = LightingEngine::new(&config, Instant::now());
    assert!(report.is_clean());
    assert!(!engine.manager().is_idle());
}
