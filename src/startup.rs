use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::accounts::Accounts;
use crate::configuration::JwtSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::{Authentication, Authorization};
use crate::routes::{current_user, health_check, list_users, login, promote_user, register};

pub fn run(
    listener: TcpListener,
    accounts: Accounts,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let accounts = web::Data::new(accounts);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(accounts.clone())
            .app_data(jwt_config_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            // Gate stage 1 for everything under /api, stage 2 for the admin scope.
            // The admin scope's own wrap runs after the outer authentication.
            .service(
                web::scope("/api")
                    .wrap(Authentication::new(jwt_config.clone()))
                    .route("/me", web::get().to(current_user))
                    .service(
                        web::scope("/users")
                            .wrap(Authorization::admin())
                            .route("", web::get().to(list_users))
                            .route("/{id}/promote", web::put().to(promote_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
