use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use agro_backend::routes;
use agro_backend::{ModelStore, PredictionService};
use log::{info, warn};
use std::env;
use std::path::Path;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("starting agro inference service");

    let models_dir = env::var("MODELS_DIR").unwrap_or_else(|_| "models".to_string());
    let store = ModelStore::load(Path::new(&models_dir));
    match store.available().as_slice() {
        [] => warn!(
            "no model artifacts under {models_dir}; prediction endpoints will answer 500 \
             until train_crop/train_yield have run"
        ),
        names => info!("models available: {names:?}"),
    }
    let service = web::Data::new(PredictionService::new(store));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5001".to_string());
    let workers = env::var("WORKERS")
        .ok()
        .and_then(|w| w.parse().ok())
        .unwrap_or_else(num_cpus::get);
    let bind_address = format!("{host}:{port}");

    info!("listening on http://{bind_address} with {workers} workers");
    info!("  GET  /              - status + available models");
    info!("  POST /predict/crop  - crop recommendation");
    info!("  POST /predict/yield - yield prediction");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(service.clone())
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .service(routes::status)
            .service(routes::predict_crop)
            .service(routes::predict_yield)
            .default_service(web::route().to(routes::not_found))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run()
    .await
}
