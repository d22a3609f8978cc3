use actix_web::{middleware, web, App, HttpServer};
use log::error;

use arcade_services::config::{self, AppState};
use arcade_services::auth;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    std::env::set_var("RUST_LOG", "arcade_services=info,auth_service=info,actix_web=info");
    env_logger::init();

    let db_config = match config::DbConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let token_secret = match config::token_secret_from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let pool = match config::connect_with_retry(&db_config) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = AppState { pool, token_secret };

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(4096))
            .wrap(middleware::Logger::default())
            .wrap(config::cors())
            .configure(auth::configure_routes)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
