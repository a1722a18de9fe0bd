use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use log::info;
use shared::{AUTHENTICATED_PREDICT_PATH, PUBLIC_PREDICT_PATH, PredictionResponse};

use crate::auth::middleware::{AuthMiddleware, AuthenticatedUser};
use crate::auth::routes::login;
use crate::error::PredictError;
use crate::model::Model;
use crate::upload::{UploadedImage, read_image_field};

pub const LOGIN_PATH: &str = "/api/auth/token";

pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_middleware: AuthMiddleware) {
    cfg.service(web::resource(PUBLIC_PREDICT_PATH).route(web::post().to(predict_public)))
        .service(
            web::resource(AUTHENTICATED_PREDICT_PATH)
                .wrap(auth_middleware)
                .route(web::post().to(predict_authenticated)),
        )
        .service(web::resource(LOGIN_PATH).route(web::post().to(login)));
}

async fn predict_public(
    model: web::Data<Model>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let upload = read_image_field(payload).await?;
    info!(
        "Public crop disease detection request received: {}",
        upload.display_name()
    );
    predict(&model, upload)
}

async fn predict_authenticated(
    user: AuthenticatedUser,
    model: web::Data<Model>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let upload = read_image_field(payload).await?;
    info!(
        "Crop disease detection request from {}: {}",
        user.0.email,
        upload.display_name()
    );
    predict(&model, upload)
}

fn predict(model: &Model, upload: UploadedImage) -> Result<HttpResponse, PredictError> {
    let prediction = model.inference(&upload.bytes).map_err(|e| {
        log::error!("Error processing {} image: {}", upload.content_type, e);
        PredictError::InvalidImage(e.to_string())
    })?;

    info!(
        "Prediction result: {} with confidence {}",
        prediction.label, prediction.confidence
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        filename: upload.filename,
        prediction: prediction.label,
        confidence: prediction.confidence,
        possible_treatments: prediction.treatments,
        image_url: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtService;
    use crate::auth::models::{AuthUser, TokenResponse};
    use crate::config::DemoAccount;
    use crate::model::tests::png_bytes;
    use crate::upload::MAX_UPLOAD_BYTES;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use shared::ErrorDetail;

    const SECRET: &str = "routes-test-secret";
    const BOUNDARY: &str = "----khetgpt-test-boundary";

    fn multipart(
        field: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> (String, Vec<u8>) {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), body)
    }

    fn upload_request(
        path: &str,
        field: &str,
        content_type: &str,
        data: &[u8],
    ) -> test::TestRequest {
        let (form_type, body) = multipart(field, "leaf.png", content_type, data);
        test::TestRequest::post()
            .uri(path)
            .insert_header((header::CONTENT_TYPE, form_type))
            .set_payload(body)
    }

    fn app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(Model::new()))
            .app_data(web::Data::new(JwtService::new(SECRET)))
            .app_data(web::Data::new(DemoAccount::default()))
            .configure(|cfg| configure_routes(cfg, AuthMiddleware::new(JwtService::new(SECRET))))
    }

    fn token() -> String {
        JwtService::new(SECRET)
            .generate_token(&AuthUser {
                email: "demo@khetgpt.com".into(),
                name: "Demo User".into(),
            })
            .unwrap()
    }

    #[actix_web::test]
    async fn public_route_returns_prediction() {
        let app = test::init_service(app()).await;
        let req =
            upload_request(PUBLIC_PREDICT_PATH, "file", "image/png", &png_bytes()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: PredictionResponse = test::read_body_json(resp).await;
        assert_eq!(body.filename.as_deref(), Some("leaf.png"));
        assert!(["Healthy", "Powdery", "Rust"].contains(&body.prediction.as_str()));
        assert!((0.70..=0.98).contains(&body.confidence));
        assert!(!body.possible_treatments.is_empty());
        assert_eq!(body.image_url, None);
    }

    #[actix_web::test]
    async fn prediction_body_carries_every_wire_field() {
        let app = test::init_service(app()).await;
        let req =
            upload_request(PUBLIC_PREDICT_PATH, "file", "image/png", &png_bytes()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        for key in ["filename", "prediction", "confidence", "possible_treatments", "image_url"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert!(body["image_url"].is_null());
        assert!(body["possible_treatments"].is_array());
    }

    #[actix_web::test]
    async fn non_image_upload_is_rejected() {
        let app = test::init_service(app()).await;
        let req = upload_request(PUBLIC_PREDICT_PATH, "file", "text/plain", b"hello").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "File provided is not an image");
    }

    #[actix_web::test]
    async fn missing_file_field_is_rejected() {
        let app = test::init_service(app()).await;
        let req =
            upload_request(PUBLIC_PREDICT_PATH, "photo", "image/png", &png_bytes()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "No file uploaded");
    }

    #[actix_web::test]
    async fn corrupt_image_is_rejected() {
        let app = test::init_service(app()).await;
        let req = upload_request(PUBLIC_PREDICT_PATH, "file", "image/png", b"not really a png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Invalid image format: "));
    }

    #[actix_web::test]
    async fn oversized_upload_is_rejected() {
        let app = test::init_service(app()).await;
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let req = upload_request(PUBLIC_PREDICT_PATH, "file", "image/jpeg", &data).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "file too large");
    }

    #[actix_web::test]
    async fn authenticated_route_requires_bearer_token() {
        let app = test::init_service(app()).await;
        let req = upload_request(AUTHENTICATED_PREDICT_PATH, "file", "image/png", &png_bytes())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Could not validate credentials");
    }

    #[actix_web::test]
    async fn authenticated_route_rejects_foreign_token() {
        let app = test::init_service(app()).await;
        let foreign = JwtService::new("someone-else")
            .generate_token(&AuthUser {
                email: "demo@khetgpt.com".into(),
                name: "Demo User".into(),
            })
            .unwrap();
        let req = upload_request(AUTHENTICATED_PREDICT_PATH, "file", "image/png", &png_bytes())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", foreign)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn authenticated_route_accepts_valid_token() {
        let app = test::init_service(app()).await;
        let req = upload_request(AUTHENTICATED_PREDICT_PATH, "file", "image/png", &png_bytes())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token())))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: PredictionResponse = test::read_body_json(resp).await;
        assert!(!body.prediction.is_empty());
    }

    #[actix_web::test]
    async fn demo_login_issues_usable_token() {
        let app = test::init_service(app()).await;
        let req = test::TestRequest::post()
            .uri(LOGIN_PATH)
            .set_form([("username", "demo@khetgpt.com"), ("password", "password")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let issued: TokenResponse = test::read_body_json(resp).await;
        assert_eq!(issued.token_type, "bearer");

        let req = upload_request(AUTHENTICATED_PREDICT_PATH, "file", "image/png", &png_bytes())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", issued.access_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn wrong_password_is_rejected() {
        let app = test::init_service(app()).await;
        let req = test::TestRequest::post()
            .uri(LOGIN_PATH)
            .set_form([("username", "demo@khetgpt.com"), ("password", "hunter2")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
