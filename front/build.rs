use std::{fs, path::Path};

fn read_str(relay: &toml::Value, key: &str) -> String {
    let Some(value) = relay.get(key) else {
        panic!("Key '{key}' not found in the [relay] table of Relay.toml");
    };

    let Some(value) = value.as_str() else {
        panic!("Expected '{key}' to be a string in Relay.toml, got: {value}");
    };

    if value.trim().is_empty() {
        panic!("'{key}' cannot be empty in Relay.toml");
    }

    value.to_string()
}

fn read_seconds(relay: &toml::Value, key: &str) -> f64 {
    let seconds = relay
        .get(key)
        .and_then(|value| value.as_float().or_else(|| value.as_integer().map(|i| i as f64)));

    let Some(seconds) = seconds else {
        panic!("Expected '{key}' to be a number of seconds in Relay.toml");
    };

    if !seconds.is_finite() || seconds <= 0. {
        eprintln!("Invalid notification timeout: {seconds}");
        panic!("'{key}' must be a positive number of seconds");
    }

    seconds
}

fn main() {
    let relay_toml_path = Path::new("..").join("Relay.toml");

    println!("cargo:rerun-if-changed={}", relay_toml_path.display());

    let Ok(contents) = fs::read_to_string(&relay_toml_path) else {
        panic!("Could not find Relay.toml config file in {relay_toml_path:?}");
    };

    let value: toml::Value = contents.parse().expect("Unable to parse TOML");

    let relay = value
        .get("relay")
        .expect("[relay] table not found in Relay.toml");

    println!("cargo:rustc-env=RELAY_ENDPOINT={}", read_str(relay, "endpoint"));
    println!("cargo:rustc-env=RELAY_FIELD={}", read_str(relay, "field"));
    println!(
        "cargo:rustc-env=RELAY_FORM_SELECTOR={}",
        read_str(relay, "form_selector")
    );
    println!(
        "cargo:rustc-env=RELAY_NOTIFICATION_TIMEOUT={}",
        read_seconds(relay, "notification_timeout")
    );
}
