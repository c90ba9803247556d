use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::error::AuthError;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{health_check, login, refresh, register, revoke, whoami};
use crate::session::SessionProtocol;

pub fn run(listener: TcpListener, session: SessionProtocol) -> Result<Server, std::io::Error> {
    let session_data = web::Data::new(session.clone());

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AuthError::InvalidInput(format!("malformed request body: {}", err)).into()
        });

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(session_data.clone())
            .app_data(json_config)

            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(register))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Protected routes (require access token)
            .service(
                web::scope("/api/whoami")
                    .wrap(JwtMiddleware::new(session.clone()))
                    .route("", web::get().to(whoami)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
