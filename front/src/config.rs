/// Where and what the relay uploads.
///
/// The defaults come from `Relay.toml`, read by the build script.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub endpoint: String,
    pub field: String,
    pub form_selector: String,
    pub notification_timeout_s: f64,
}

pub const DEFAULT_ENDPOINT: &str = env!("RELAY_ENDPOINT");
pub const DEFAULT_FIELD: &str = env!("RELAY_FIELD");
pub const DEFAULT_FORM_SELECTOR: &str = env!("RELAY_FORM_SELECTOR");
const DEFAULT_NOTIFICATION_TIMEOUT: &str = env!("RELAY_NOTIFICATION_TIMEOUT");

/// Longest a notification stays on screen, in seconds.
pub const MAX_NOTIFICATION_TIMEOUT_S: f64 = 3600.;

impl RelayConfig {
    pub fn new(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field: field.into(),
            ..Self::default()
        }
    }

    pub fn with_form_selector(mut self, selector: impl Into<String>) -> Self {
        self.form_selector = selector.into();
        self
    }

    /// Non finite or non positive values are ignored, the rest is capped at
    /// [`MAX_NOTIFICATION_TIMEOUT_S`].
    pub fn with_notification_timeout(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0. {
            self.notification_timeout_s = seconds.min(MAX_NOTIFICATION_TIMEOUT_S);
        }
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            field: DEFAULT_FIELD.to_string(),
            form_selector: DEFAULT_FORM_SELECTOR.to_string(),
            // Validated as a positive float by build.rs
            notification_timeout_s: DEFAULT_NOTIFICATION_TIMEOUT
                .parse::<f64>()
                .unwrap_or(5.)
                .min(MAX_NOTIFICATION_TIMEOUT_S),
        }
    }
}
