#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use std::io;

    use actix_files::Files;
    use actix_web::*;
    use leptos::logging::log;
    use leptos::*;
    use leptos_actix::{generate_route_list, LeptosRoutes};
    use storedesk::app::*;
    use storedesk::config::ServerConfig;
    use storedesk::db::Database;
    use storedesk::{api, auth};

    let config = ServerConfig::from_env();
    std::fs::create_dir_all(&config.upload_dir)?;

    // Initialize the database
    let db = Database::new(&config.db_path).map_err(io::Error::other)?;
    db.create_schema().await.map_err(io::Error::other)?;
    log!("[MAIN] Schema ready at {}", config.db_path);

    if let Some(admin) = &config.bootstrap_admin {
        auth::bootstrap_admin(&db, admin)
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    // Load configuration
    let conf = get_configuration(None).await.map_err(io::Error::other)?;
    let addr = conf.leptos_options.site_addr;

    // Generate the list of routes in your Leptos App
    let routes = generate_route_list(App);
    log!("[MAIN] Listening on http://{}", &addr);

    let db = web::Data::new(db);
    let server_config = web::Data::new(config);

    HttpServer::new(move || {
        let leptos_options = &conf.leptos_options;
        let site_root = &leptos_options.site_root;
        let uploads = server_config.upload_dir.clone();

        App::new()
            .app_data(db.clone())
            .app_data(server_config.clone())
            // REST API before the Leptos routes
            .configure(api::configure)
            // Uploaded images
            .service(Files::new(&server_config.upload_url, uploads))
            // Serve JS/WASM/CSS from `pkg`
            .service(Files::new("/pkg", format!("{site_root}/pkg")))
            // Serve other assets from the `assets` directory
            .service(Files::new("/assets", site_root))
            // Serve the favicon from /favicon.ico
            .service(favicon)
            // Register Leptos routes
            .leptos_routes(leptos_options.to_owned(), routes.to_owned(), App)
            // Pass Leptos options to the app
            .app_data(web::Data::new(leptos_options.to_owned()))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(feature = "ssr")]
#[actix_web::get("favicon.ico")]
async fn favicon(
    leptos_options: actix_web::web::Data<leptos::LeptosOptions>,
) -> actix_web::Result<actix_files::NamedFile> {
    let leptos_options = leptos_options.into_inner();
    let site_root = &leptos_options.site_root;
    Ok(actix_files::NamedFile::open(format!(
        "{site_root}/favicon.ico"
    ))?)
}

#[cfg(not(any(feature = "ssr", feature = "csr")))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
    // see optional feature `csr` instead
}

#[cfg(all(not(feature = "ssr"), feature = "csr"))]
pub fn main() {
    // a client-side main function is required for using `trunk serve`
    // to run: `trunk serve --open --features csr`
    use storedesk::app::*;

    storedesk::utils::panic_hook::init();

    leptos::mount_to_body(App);
}
