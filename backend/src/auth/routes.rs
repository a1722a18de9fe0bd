use actix_web::http::header;
use actix_web::{HttpResponse, web};
use shared::ErrorDetail;

use crate::config::DemoAccount;

use super::jwt::JwtService;
use super::models::{AuthUser, LoginForm, TokenResponse};

pub async fn login(
    form: web::Form<LoginForm>,
    account: web::Data<DemoAccount>,
    jwt_service: web::Data<JwtService>,
) -> HttpResponse {
    if !account.matches(&form.username, &form.password) {
        log::warn!("Rejected login for {:?}", form.username);
        return HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(ErrorDetail::new("Incorrect username or password"));
    }

    let user = AuthUser {
        email: account.email.clone(),
        name: account.name.clone(),
    };

    match jwt_service.generate_token(&user) {
        Ok(token) => {
            log::info!("Issued access token for {}", user.email);
            HttpResponse::Ok().json(TokenResponse::bearer(token))
        }
        Err(e) => {
            log::error!("Failed to issue token for {}: {}", user.email, e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Could not issue token"))
        }
    }
}
