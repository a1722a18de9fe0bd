mod auth;
mod config;
mod error;
mod model;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use auth::jwt::JwtService;
use auth::middleware::AuthMiddleware;
use config::ServerConfig;
use model::Model;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(|e| {
        log::error!("Invalid server configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let model = Model::new();
    log::info!(
        "Serving classes: {}",
        model.labels().collect::<Vec<_>>().join(", ")
    );

    let jwt_service = JwtService::new(&config.jwt_secret);
    let auth_middleware = AuthMiddleware::new(jwt_service.clone());
    let demo = config.demo.clone();
    log::info!("Demo login available for {}", demo.email);

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

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
            .app_data(web::Data::new(model.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(demo.clone()))
            .configure(|cfg| configure_routes(cfg, auth_middleware.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
