#[macro_use(trace, debug, info, warn, error)]
extern crate log;

mod catchers;
mod config;
mod error;
mod response;
mod routes;

// Needed for tests
pub async fn build_rocket() -> rocket::Rocket<rocket::Ignite> {
    let rocket = rocket::build()
        .attach(rocket::fairing::AdHoc::config::<config::HostConfig>())
        .register("/", rocket::catchers![catchers::root_404])
        .mount(
            "/",
            rocket::routes![
                routes::root,
                routes::index_html,
                routes::front_js,
                routes::front_bg_wasm,
                routes::static_css,
            ],
        );

    match rocket.ignite().await {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Failed to ignite the server: {e}");
            std::process::exit(1)
        }
    }
}

#[rocket::main]
async fn main() {
    let filters = [("rocket", log::LevelFilter::Warn)];
    logger::init([
        logger::Config::default()
            .output(logger::Output::Stdout)
            .colored(true)
            .filters(&filters),
        logger::Config::default()
            .output(logger::Output::new_timed_file(
                "./log/.log",
                std::time::Duration::from_secs(86400), // A day
            ))
            .filters(&filters),
    ]);

    // Small print to show the start of the program log in the file
    trace!(
        "\n╭{line}╮\n│{message:^30}│\n╰{line}╯",
        line = "─".repeat(30),
        message = "Program start"
    );

    let rocket = build_rocket().await;

    display_config(
        rocket.config(),
        rocket.state::<config::HostConfig>(),
        rocket.routes(),
        rocket.catchers(),
    );

    if let Err(e) = rocket.launch().await {
        error!("Server stopped with: {e}");
    }
}

/// Displays the config in the console
fn display_config<'a>(
    rocket_cfg: &rocket::Config,
    host_cfg: Option<&config::HostConfig>,
    rocket_routes: impl Iterator<Item = &'a rocket::Route>,
    rocket_catchers: impl Iterator<Item = &'a rocket::Catcher>,
) {
    let profile = rocket_cfg.profile.as_str().as_str();
    let address = rocket_cfg.address;
    let port = rocket_cfg.port;
    let workers = rocket_cfg.workers;
    let ident = rocket_cfg.ident.as_str().unwrap_or("[ERROR] Undefined");
    let static_dir = host_cfg
        .map(|cfg| cfg.static_dir.display().to_string())
        .unwrap_or_else(|| "[ERROR] Undefined".to_string());
    let keep_alive_s = rocket_cfg.keep_alive;
    let shutdown_mode = &rocket_cfg.shutdown;

    let routes = rocket_routes
        .map(|route| {
            let uri = route.uri.origin.to_string();
            let name = route
                .name
                .as_ref()
                .map(std::borrow::Cow::as_ref)
                .unwrap_or("[ERROR] Undefined");
            let method = route.method.as_str();
            format!("{method:<5} {uri:<20} {name}")
        })
        .collect::<Vec<String>>();

    let catchers = rocket_catchers
        .map(|catcher| {
            let base = catcher.base.to_string();
            let name = catcher
                .name
                .as_ref()
                .map(std::borrow::Cow::as_ref)
                .unwrap_or("[ERROR] Undefined");
            let code = catcher
                .code
                .map(|code| code.to_string())
                .unwrap_or("[ERROR] Undefined".to_string());

            format!("{code:<5} {base:<20} {name}")
        })
        .collect::<Vec<String>>();

    let display_vec = |data: Vec<String>| -> String {
        let mut out = String::new();
        out.push_str("[\n");
        for d in data {
            out.push_str(&format!("    {d}\n"));
        }
        out.push(']');
        out
    };

    info!("\nConfig:\nUsing profile: {profile}\nAddress: {address}:{port}\nWorkers: {workers}\nIdent: {ident}\nStatic files: {static_dir}\nConnection lifetime: {keep_alive_s}s\nShutdown mode: {shutdown_mode}\nRoutes: {formatted_routes}\nCatchers: {formatted_catchers}",
        formatted_routes = display_vec(routes),
        formatted_catchers = display_vec(catchers)
    );
}
