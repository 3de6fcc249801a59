use {
    crate::{config::HostConfig, error::StaticError, response::Response},
    rocket::{
        http::{ContentType, Status},
        State,
    },
};

#[rocket::get("/")]
pub async fn root(config: &State<HostConfig>, remote_addr: std::net::SocketAddr) -> Response {
    static_file_response(config, "index.html", ContentType::HTML, remote_addr).await
}

#[rocket::get("/index.html")]
pub async fn index_html(config: &State<HostConfig>, remote_addr: std::net::SocketAddr) -> Response {
    static_file_response(config, "index.html", ContentType::HTML, remote_addr).await
}

// Output of `wasm-bindgen --target web --out-name front`, the relay starts itself once loaded
#[rocket::get("/front.js")]
pub async fn front_js(config: &State<HostConfig>, remote_addr: std::net::SocketAddr) -> Response {
    static_file_response(config, "front.js", ContentType::JavaScript, remote_addr).await
}

#[rocket::get("/front_bg.wasm")]
pub async fn front_bg_wasm(
    config: &State<HostConfig>,
    remote_addr: std::net::SocketAddr,
) -> Response {
    static_file_response(config, "front_bg.wasm", ContentType::WASM, remote_addr).await
}

// Not a FileServer, only what is listed here can be served
#[rocket::get("/css/<file>")]
pub async fn static_css(
    file: &str,
    config: &State<HostConfig>,
    remote_addr: std::net::SocketAddr,
) -> Response {
    const ALLOWED_FILES: &[&str] = &["relay.css", "notification.css"];

    if !ALLOWED_FILES.contains(&file) {
        warn!("[{remote_addr}] Refused css file: {file}");
        return Response::builder().with_status(Status::NotFound).build();
    }

    static_file_response(config, &format!("css/{file}"), ContentType::CSS, remote_addr).await
}

async fn read_static(config: &HostConfig, path: &str) -> Result<Vec<u8>, StaticError> {
    rocket::tokio::fs::read(config.static_dir.join(path))
        .await
        .map_err(|why| StaticError::from_io(path, why))
}

async fn static_file_response(
    config: &HostConfig,
    path: &str,
    content_type: ContentType,
    remote_addr: std::net::SocketAddr,
) -> Response {
    let start_timer = std::time::Instant::now();

    match read_static(config, path).await {
        Ok(bytes) => {
            trace!(
                "Static file query from {remote_addr}: {path} ({} bytes) in {}",
                bytes.len(),
                time::format(start_timer.elapsed(), 2)
            );

            Response::builder()
                .with_status(Status::Ok)
                .with_content(bytes)
                .with_content_type(content_type)
                // A rebuilt bundle has to be picked up on reload
                .with_header("Cache-Control", "no-cache")
                .build()
        }
        Err(e @ StaticError::NotFound { .. }) => {
            debug!("[{remote_addr}] {e}");
            Response::builder().with_status(Status::NotFound).build()
        }
        Err(e) => {
            error!("[{remote_addr}] {e}");
            Response::builder()
                .with_status(Status::InternalServerError)
                .build()
        }
    }
}
