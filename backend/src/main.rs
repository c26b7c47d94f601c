use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use backend::auth::middleware::AuthMiddleware;
use backend::auth::session::SessionService;
use backend::classifier::{Classifier, RandomClassifier};
use backend::config::Config;
use backend::db::init::init_database;
use backend::db::repository::Repository;
use backend::export::{CsvExporter, ExportSink};
use backend::routes::configure_routes;
use backend::storage::ImageStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let pool = init_database(&config.database_path)
        .await
        .map_err(|e| std::io::Error::other(format!("Database setup failed: {}", e)))?;
    let repository = Repository::new(pool);

    let image_store = ImageStore::new(config.upload_dir.clone(), "/static/uploads")
        .map_err(|e| std::io::Error::other(format!("Upload directory setup failed: {}", e)))?;

    let exporter: Arc<dyn ExportSink> = Arc::new(
        CsvExporter::new(config.data_dir.clone())
            .map_err(|e| std::io::Error::other(format!("CSV mirror setup failed: {}", e)))?,
    );

    // No trained model ships with this repository; the placeholder keeps the
    // rest of the pipeline exercisable until one is wired in.
    log::warn!("No trained model available; using the random placeholder classifier");
    let classifier: Arc<dyn Classifier> = Arc::new(RandomClassifier);

    let sessions = SessionService::new(&config.session_secret, config.session_ttl_days);
    let auth_middleware = AuthMiddleware::new(sessions.clone());

    log::info!("Starting server on {}", config.bind_address);

    let bind_address = config.bind_address.clone();
    let upload_dir = config.upload_dir.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .wrap(auth_middleware.clone())
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(image_store.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::from(exporter.clone()))
            .app_data(web::Data::from(classifier.clone()))
            .configure(|cfg| configure_routes(cfg, upload_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
