use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use posemerge::config::Settings;
use posemerge::fetch::HttpFetcher;
use posemerge::server::{routes, AppState};
use std::{env, process};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ./posemerge [config file]";

fn get_args() -> Option<String> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => None,
        [path] if path != "-h" && path != "--help" => Some(path.clone()),
        _ => {
            println!("{USAGE}");
            process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path = get_args();
    let settings = Settings::load(config_path.as_deref())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = web::Data::new(AppState {
        fetcher: HttpFetcher::new(settings.fetch_timeout(), settings.max_upload_bytes)?,
        max_upload_bytes: settings.max_upload_bytes,
    });

    info!("listening on {}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .service(routes::index)
            .service(routes::process)
    })
    .bind(settings.bind_addr())?
    .run()
    .await?;

    Ok(())
}
