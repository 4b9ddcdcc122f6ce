#![deny(warnings)]
#![deny(rust_2018_idioms)]

use ais_poller::settings::{Environment, PositionSettings, Settings};
use config::{Config, File};

pub mod helper;
pub mod poller;

fn load(file: &str, environment: &str) -> Settings {
    Config::builder()
        .add_source(File::with_name(file).required(true))
        .set_override("environment", environment)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
}

#[test]
fn test_local_settings_are_valid() {
    let settings = load("config/local.yml", "Local");
    assert_eq!(settings.environment, Environment::Local);
    assert!(matches!(settings.position, PositionSettings::Fixed { .. }));
}

#[test]
fn test_development_settings_are_valid() {
    let settings = load("config/development.yml", "Development");
    assert!(matches!(settings.position, PositionSettings::SignalK { .. }));
}

#[test]
fn test_production_settings_are_valid() {
    let settings = load("config/production.yml", "Production");
    assert!(settings.effective_update_interval().as_secs() > 60);
    assert!(settings.bounding_box.enabled);
}
