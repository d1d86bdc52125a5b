//! HTTP handlers. Every prediction failure is mapped to a status code here
//! and nowhere else: client-caused input problems become 400, everything
//! else 500. Failures never cross the boundary as panics.

use crate::error::PredictError;
use crate::service::PredictionService;
use crate::types::{CropRequest, ErrorResponse, PredictionResponse, StatusResponse, YieldRequest};
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{error, info, warn};

#[get("/")]
pub async fn status(service: web::Data<PredictionService>) -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        message: "agro inference service running".to_string(),
        available: service.available_models(),
    })
}

#[post("/predict/crop")]
pub async fn predict_crop(
    service: web::Data<PredictionService>,
    request: web::Json<CropRequest>,
) -> impl Responder {
    match service.predict_crop(request.into_inner()) {
        Ok(label) => {
            info!("crop recommendation: {label}");
            HttpResponse::Ok().json(PredictionResponse { prediction: label })
        }
        Err(e) => error_response("crop", e),
    }
}

#[post("/predict/yield")]
pub async fn predict_yield(
    service: web::Data<PredictionService>,
    request: web::Json<YieldRequest>,
) -> impl Responder {
    match service.predict_yield(request.into_inner()) {
        Ok(value) => {
            info!("yield prediction: {value}");
            HttpResponse::Ok().json(PredictionResponse { prediction: value })
        }
        Err(e) => error_response("yield", e),
    }
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ErrorResponse::new("endpoint not found"))
}

fn error_response(endpoint: &str, err: PredictError) -> HttpResponse {
    let body = ErrorResponse::new(err.to_string());
    if err.is_client_error() {
        warn!("{endpoint} request rejected: {err}");
        HttpResponse::BadRequest().json(body)
    } else {
        error!("{endpoint} prediction failed: {err}");
        HttpResponse::InternalServerError().json(body)
    }
}
