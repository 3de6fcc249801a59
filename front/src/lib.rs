use std::{cell::RefCell, rc::Rc};

pub mod component;
pub mod config;
pub mod dataset;
pub mod dom;
pub mod error;
pub mod relay;
pub mod report;
pub mod task;
pub mod transport;

pub use {
    config::RelayConfig,
    dataset::{FileSummary, InputSnapshot, SelectedFileSet},
    error::{RelayError, TransportError, UploadError},
    relay::{bind, Bindings, FormUploadRelay},
    report::{ConsoleReporter, Reporter},
    task::{TaskState, UploadTask, WasmSpawner},
    transport::{FetchTransport, Transport, UploadRequest, UploadResponse},
};

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

pub type PageRelay = FormUploadRelay<FetchTransport, WasmSpawner, ConsoleReporter>;

/// Element the notification block is rendered in, when the page has one.
pub const NOTIFICATION_MOUNT_ID: &str = "relay_notifications";

// Listeners have to outlive the start function
thread_local! {
    static BINDINGS: RefCell<Option<Bindings>> = const { RefCell::new(None) };
}

/// Mounts the notification block and attaches the relay to the forms of
/// `document`.
pub fn init(document: &web_sys::Document, config: RelayConfig) -> Result<Rc<PageRelay>, RelayError> {
    if let Some(mount) = document.get_element_by_id(NOTIFICATION_MOUNT_ID) {
        yew::Renderer::<component::NotificationManager>::with_root(mount).render();
    }

    let reporter = ConsoleReporter::new(config.notification_timeout_s);
    let relay = Rc::new(FormUploadRelay::new(
        config,
        FetchTransport,
        WasmSpawner,
        reporter,
    ));

    let bindings = bind(document, relay.clone())?;
    BINDINGS.set(Some(bindings));

    Ok(relay)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
fn start() {
    use gloo::console::error;

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        error!("Could not start the upload relay due to: Could not get the document");
        return;
    };

    if let Err(e) = init(&document, RelayConfig::default()) {
        error!(format!("Could not start the upload relay due to: {e}"));
    }
}
