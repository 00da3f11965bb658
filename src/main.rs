mod config;
mod error;
mod handlers;
mod inference;
mod models;
mod policy;
mod preprocess;
mod store;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::config::Settings;
use crate::handlers::AppState;
use crate::inference::OnnxClassifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env();

    // The model has to be ready before the port is bound.
    log::info!("Loading model from {}", settings.model_path.display());
    let classifier = OnnxClassifier::load(&settings.model_path, settings.image_size).map_err(|e| {
        log::error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    log::info!("Model loaded");

    let state = web::Data::new(AppState::new(&settings, Arc::new(classifier)));
    log::info!("Recording predictions to {}", state.store.path().display());

    let (host, port) = settings.bind_addr();
    log::info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
