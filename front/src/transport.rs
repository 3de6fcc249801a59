use {
    crate::{dataset::SelectedFileSet, error::TransportError},
    futures::future::LocalBoxFuture,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest<F> {
    pub url: String,
    pub method: Method,
    /// Multipart name every file is sent under
    pub field: String,
    pub payload: SelectedFileSet<F>,
}

impl<F> UploadRequest<F> {
    pub fn post(url: &str, field: &str, payload: SelectedFileSet<F>) -> Self {
        Self {
            url: url.to_string(),
            method: Method::Post,
            field: field.to_string(),
            payload,
        }
    }

    /// Multipart parts of the body in order, every file under the field name.
    pub fn parts(&self) -> impl Iterator<Item = (&str, &F)> {
        self.payload
            .files()
            .map(|file| (self.field.as_str(), file))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadResponse {
    pub status: u16,
    pub status_text: String,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends upload requests.
///
/// Dropping the returned future must abandon the request.
pub trait Transport {
    type File;

    fn post(
        &self,
        request: UploadRequest<Self::File>,
    ) -> LocalBoxFuture<'static, Result<UploadResponse, TransportError>>;
}

/// Browser `fetch` with a multipart `FormData` body.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    type File = web_sys::File;

    fn post(
        &self,
        request: UploadRequest<web_sys::File>,
    ) -> LocalBoxFuture<'static, Result<UploadResponse, TransportError>> {
        Box::pin(fetch(request))
    }
}

async fn fetch(request: UploadRequest<web_sys::File>) -> Result<UploadResponse, TransportError> {
    use {crate::error::js_error, wasm_bindgen::JsCast as _};

    let setup = |e: wasm_bindgen::JsValue| TransportError::Setup { why: js_error(&e) };

    let form_data = web_sys::FormData::new().map_err(setup)?;
    for (name, file) in request.parts() {
        form_data
            .append_with_blob_and_filename(name, file, &file.name())
            .map_err(setup)?;
    }

    let mut guard = AbortGuard::new()?;

    // No Content-Type header, the browser has to write the multipart boundary itself
    let reqinit = web_sys::RequestInit::new();
    reqinit.set_method(request.method.as_str());
    reqinit.set_mode(web_sys::RequestMode::Cors);
    reqinit.set_body(&form_data);
    reqinit.set_signal(Some(&guard.signal()));

    let js_request =
        web_sys::Request::new_with_str_and_init(&request.url, &reqinit).map_err(setup)?;

    let window = web_sys::window().ok_or_else(|| TransportError::Setup {
        why: String::from("Could not get the window"),
    })?;

    let resp_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&js_request))
        .await
        .map_err(|e| TransportError::Network { why: js_error(&e) })?;

    guard.disarm();

    let resp: web_sys::Response = resp_value
        .dyn_into()
        .map_err(|e| TransportError::Response { why: js_error(&e) })?;

    Ok(UploadResponse {
        status: resp.status(),
        status_text: resp.status_text(),
    })
}

/// Aborts the fetch it signals when dropped before completion.
struct AbortGuard {
    ctrl: web_sys::AbortController,
    armed: bool,
}

impl AbortGuard {
    fn new() -> Result<Self, TransportError> {
        let ctrl = web_sys::AbortController::new().map_err(|e| TransportError::Setup {
            why: crate::error::js_error(&e),
        })?;

        Ok(Self { ctrl, armed: true })
    }

    fn signal(&self) -> web_sys::AbortSignal {
        self.ctrl.signal()
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if self.armed {
            self.ctrl.abort();
        }
    }
}
