use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};

use common::types::Message;
use service::auth::domain::AdminIdentity;
use service::bus::domain::{BusForm, BusRecord};
use service::uploads::{ImageUpload, UploadStore};

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Multipart field carrying the image file.
pub const IMAGE_FIELD: &str = "busImage";

fn bad_multipart(e: MultipartError) -> JsonApiError {
    JsonApiError::bad_request(format!("Malformed multipart body: {}", e.body_text()))
}

/// Read text fields and at most one `busImage` part. The image type is checked
/// from the part headers before its body is read, and the size limit is
/// enforced while streaming.
pub async fn read_bus_form(
    mut multipart: Multipart,
    uploads: &UploadStore,
) -> Result<(BusForm, Option<ImageUpload>), JsonApiError> {
    let mut form = BusForm::default();
    let mut image: Option<ImageUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            if file_name.is_empty() {
                // file input left empty by the browser
                continue;
            }
            if image.is_some() {
                return Err(JsonApiError::bad_request(format!("Only one {IMAGE_FIELD} file is allowed")));
            }
            let content_type = field.content_type().map(str::to_string);
            uploads.check_kind(&file_name, content_type.as_deref())?;

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
                bytes.extend_from_slice(&chunk);
                uploads.check_size(bytes.len() as u64)?;
            }
            if bytes.is_empty() {
                continue;
            }
            image = Some(ImageUpload { file_name, content_type, bytes });
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut form.name,
            "route" => &mut form.route,
            "stops" => &mut form.stops,
            "status" => &mut form.status,
            "schedule" => &mut form.schedule,
            "fare" => &mut form.fare,
            other => {
                debug!(field = other, "ignoring unknown multipart field");
                continue;
            }
        };
        *slot = Some(field.text().await.map_err(bad_multipart)?);
    }

    Ok((form, image))
}

fn multipart_or_400(m: Result<Multipart, MultipartRejection>) -> Result<Multipart, JsonApiError> {
    m.map_err(|e| JsonApiError::bad_request(e.body_text()))
}

#[utoipa::path(
    get, path = "/buses", tag = "buses",
    responses(
        (status = 200, description = "All buses, newest first", body = [crate::openapi::BusDoc]),
        (status = 500, description = "Server error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<BusRecord>>, JsonApiError> {
    let buses = state.buses.list().await?;
    Ok(Json(buses))
}

#[utoipa::path(
    get, path = "/buses/{id}", tag = "buses",
    params(("id" = String, Path, description = "Bus id")),
    responses(
        (status = 200, description = "The bus", body = crate::openapi::BusDoc),
        (status = 404, description = "Bus not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<BusRecord>, JsonApiError> {
    Ok(Json(state.buses.get(&id).await?))
}

#[utoipa::path(
    post, path = "/buses", tag = "buses",
    request_body(content = crate::openapi::BusFormDoc, content_type = "multipart/form-data"),
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = crate::openapi::BusDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Missing or invalid token", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Server error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<AdminIdentity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<BusRecord>), JsonApiError> {
    let (form, image) = read_bus_form(multipart_or_400(multipart)?, &state.uploads).await?;
    let bus = state.buses.create(form, image).await?;
    info!(admin = %caller.email, bus_id = %bus.id, "bus created via api");
    Ok((StatusCode::CREATED, Json(bus)))
}

#[utoipa::path(
    put, path = "/buses/{id}", tag = "buses",
    params(("id" = String, Path, description = "Bus id")),
    request_body(content = crate::openapi::BusFormDoc, content_type = "multipart/form-data"),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::BusDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Missing or invalid token", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Bus not found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Server error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BusRecord>, JsonApiError> {
    let (form, image) = read_bus_form(multipart_or_400(multipart)?, &state.uploads).await?;
    Ok(Json(state.buses.update(&id, form, image).await?))
}

#[utoipa::path(
    delete, path = "/buses/{id}", tag = "buses",
    params(("id" = String, Path, description = "Bus id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageDoc),
        (status = 401, description = "Missing or invalid token", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Bus not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Message>, JsonApiError> {
    state.buses.delete(&id).await?;
    Ok(Json(Message::new("Bus deleted successfully")))
}
