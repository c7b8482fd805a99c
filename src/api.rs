//! HTTP API
//!
//! Thin transport layer over the engine: request decoding, file-name
//! hygiene, and mapping of error kinds onto status codes. Recoverable
//! engine outcomes (unknown file, duplicate id, missing disk file)
//! become 400 responses carrying the error message; anything else is
//! a 500.

use actix_web::{delete, get, put, web, HttpResponse};
use serde::Deserialize;
use tracing::warn;

use crate::engine::Engine;
use crate::error::FilerError;

/// Write request body, field names matching the wire contract
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub name: String,
    pub ids: Vec<u32>,
    #[serde(default, rename = "new-file")]
    pub new_file: bool,
    #[serde(default, rename = "not-unique")]
    pub not_unique: bool,
}

/// Delete-ids request body
#[derive(Debug, Deserialize)]
pub struct DeleteIdsRequest {
    pub name: String,
    pub ids: Vec<u32>,
}

/// Query string naming a file
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: String,
}

/// Register all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(write_ids)
        .service(read_ids)
        .service(delete_ids)
        .service(delete_file);
}

#[put("/api/v1/ids")]
async fn write_ids(engine: web::Data<Engine>, body: web::Json<WriteRequest>) -> HttpResponse {
    let req = body.into_inner();

    if !valid_name(&req.name) {
        return HttpResponse::BadRequest().body("invalid file name");
    }
    if req.ids.is_empty() {
        return HttpResponse::BadRequest().body("empty ids");
    }

    match engine.write(&req.name, &req.ids, req.new_file, req.not_unique) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => error_response(&e),
    }
}

#[get("/api/v1/ids")]
async fn read_ids(engine: web::Data<Engine>, query: web::Query<FileQuery>) -> HttpResponse {
    match engine.read(&query.file) {
        Ok(ids) => HttpResponse::Ok().json(ids),
        Err(e) => error_response(&e),
    }
}

#[delete("/api/v1/ids")]
async fn delete_ids(engine: web::Data<Engine>, body: web::Json<DeleteIdsRequest>) -> HttpResponse {
    let req = body.into_inner();

    match engine.delete_ids(&req.name, &req.ids) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => error_response(&e),
    }
}

#[delete("/api/v1/file")]
async fn delete_file(engine: web::Data<Engine>, query: web::Query<FileQuery>) -> HttpResponse {
    match engine.delete_file(&query.file) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => error_response(&e),
    }
}

/// File names must stay inside the storage directory.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && name != "."
        && name != ".."
}

fn error_response(err: &FilerError) -> HttpResponse {
    if err.is_recoverable() {
        HttpResponse::BadRequest().body(err.to_string())
    } else {
        warn!(error = %err, "request failed");
        HttpResponse::InternalServerError().finish()
    }
}
