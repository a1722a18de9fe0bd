use super::jwt::{JwtError, JwtService};
use super::models::AuthUser;
use actix_web::http::header;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use actix_web::{FromRequest, HttpRequest};
use futures::future::{Ready, err, ok};
use shared::ErrorDetail;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Detail sent with every 401, whatever went wrong with the token.
pub const CREDENTIALS_DETAIL: &str = "Could not validate credentials";

#[derive(Clone)]
pub struct AuthMiddleware {
    jwt_service: Arc<JwtService>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service: Arc::new(jwt_service),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            jwt_service: self.jwt_service.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    jwt_service: Arc<JwtService>,
}

#[derive(Debug)]
enum AuthError {
    NoAuthHeader,
    InvalidHeaderFormat,
    NotBearerToken,
    VerificationFailed(JwtError),
}

impl AuthError {
    fn log_message(&self, path: &str) -> String {
        match self {
            AuthError::NoAuthHeader => {
                format!("No Authorization header found for path: {}", path)
            }
            AuthError::InvalidHeaderFormat => {
                format!("Invalid Authorization header format (non-UTF-8) for path: {}", path)
            }
            AuthError::NotBearerToken => {
                format!("Authorization header for path {} doesn't start with 'Bearer '", path)
            }
            AuthError::VerificationFailed(e) => {
                format!("JWT token verification failed for path {}: {}", path, e)
            }
        }
    }
}

/// Helper function to validate the token from the request.
fn validate_request_token(
    req: &ServiceRequest,
    jwt_service: &JwtService,
) -> Result<AuthUser, AuthError> {
    let auth_header = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::NoAuthHeader)?;
    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeaderFormat)?;
    let token = auth_str.strip_prefix("Bearer ").ok_or(AuthError::NotBearerToken)?;

    log::debug!("Found Bearer token, verifying...");
    let claims = jwt_service
        .verify_token(token)
        .map_err(AuthError::VerificationFailed)?;

    log::debug!("JWT token verified for user: {}", claims.sub);
    Ok(AuthUser {
        email: claims.sub,
        name: claims.name,
    })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();

        Box::pin(async move {
            let path_str = req.path().to_string();
            log::debug!("Auth middleware processing path: {}", &path_str);

            match validate_request_token(&req, &jwt_service) {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(auth_error) => {
                    log::warn!("{}", auth_error.log_message(&path_str));

                    let (http_req, _payload) = req.into_parts();
                    let response = HttpResponse::Unauthorized()
                        .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                        .json(ErrorDetail::new(CREDENTIALS_DETAIL))
                        .map_into_right_body();
                    Ok(ServiceResponse::new(http_req, response))
                }
            }
        })
    }
}

/// Caller identity placed in the request by [`AuthMiddleware`].
pub struct AuthenticatedUser(pub AuthUser);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ok(AuthenticatedUser(user.clone())),
            None => {
                // Only reachable when a handler using this extractor is mounted
                // outside the middleware.
                log::error!(
                    "AuthenticatedUser extractor: no user in request extensions for path: {}",
                    req.path()
                );
                err(actix_web::error::ErrorUnauthorized(CREDENTIALS_DETAIL))
            }
        }
    }
}
