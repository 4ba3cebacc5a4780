mod db;
mod errors;
mod handlers;
mod models;
mod repository;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::env;

use crate::repository::EmployeeRepository;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let pool = db::create_pool().await;
    let repo = EmployeeRepository::new(pool);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("Starting server at {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(repo.clone()))
            .service(
                web::resource("/v1/employees")
                    .route(web::get().to(handlers::employee::list_employees))
                    .route(web::post().to(handlers::employee::create_employee)),
            )
            .service(
                web::resource("/v1/employees/{id}")
                    .route(web::get().to(handlers::employee::show_employee))
                    .route(web::patch().to(handlers::employee::update_dependents)),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
