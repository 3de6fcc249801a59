use std::path::PathBuf;

/// Host specific keys, read from Rocket.toml next to rocket's own.
#[derive(Debug, Clone, rocket::serde::Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct HostConfig {
    /// Directory holding index.html, the wasm bundle and the css
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}
