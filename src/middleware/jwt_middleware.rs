/// Access Token Middleware
///
/// Verifies the bearer access token on protected routes and injects the
/// authenticated identity into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::authorization_header;
use crate::session::SessionProtocol;

/// Identity resolved from a verified access token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

pub struct JwtMiddleware {
    session: SessionProtocol,
}

impl JwtMiddleware {
    pub fn new(session: SessionProtocol) -> Self {
        Self { session }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            session: self.session.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    session: SessionProtocol,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authenticated = self
            .session
            .authenticate(authorization_header(req.headers()));

        match authenticated {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                tracing::debug!(user_id = %user_id, "Access token verified");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            // AuthError renders its own 400/401 response
            Err(e) => Box::pin(async move { Err::<ServiceResponse<B>, Error>(e.into()) }),
        }
    }
}
