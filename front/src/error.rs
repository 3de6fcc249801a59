#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Could not build the upload request due to: {why}")]
    Setup { why: String },

    #[error("The upload request did not complete due to: {why}")]
    Network { why: String },

    #[error("Could not read the upload response due to: {why}")]
    Response { why: String },
}

/// Why a dispatched upload ended in failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Server answered {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("The submitted event has no form attached")]
    NoForm,

    #[error("Could not spawn the upload task due to: {0}")]
    Spawn(#[from] futures::task::SpawnError),

    #[error("DOM access failed due to: {why}")]
    Dom { why: String },
}

/// Renders a js error the same way whatever its shape is.
pub fn js_error(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("Unable to retrieve the error: {value:?}"))
}
