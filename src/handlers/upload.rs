use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Form, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{Map, Value};
use tokio_util::io::ReaderStream;

use crate::config::parse_bool;
use crate::errors::{AppError, Result};
use crate::handlers::extract::PathParam;
use crate::services::media_service::{ImageChange, ImageUpload};
use crate::state::AppState;

/// Text fields of an edit form plus at most one image file.
///
/// Multipart, urlencoded and JSON bodies are all accepted; only multipart
/// can carry the image.
#[derive(Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl FormFields {
    /// Reads the body in whatever encoding its `Content-Type` names. A
    /// request with no recognised type is read as urlencoded.
    pub async fn read(request: Request, image_field: &str, max_bytes: usize) -> Result<Self> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, &()).await?;
            return Self::read_multipart(multipart, image_field, max_bytes).await;
        }
        if content_type.starts_with("application/json") {
            let Json(body) = Json::<Map<String, Value>>::from_request(request, &()).await?;
            return Ok(Self::from_json(body));
        }

        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &()).await?;
        Ok(FormFields { fields, image: None })
    }

    /// The file is taken from `image_field`; an empty file part counts as no
    /// upload. A body cut off by the request size limit is reported as an
    /// oversized image.
    async fn read_multipart(mut multipart: Multipart, image_field: &str, max_bytes: usize) -> Result<Self> {
        let too_large = |e: MultipartError| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::ImageTooLarge { max: max_bytes }
            } else {
                AppError::from(e)
            }
        };
        let mut form = FormFields::default();

        while let Some(field) = multipart.next_field().await.map_err(too_large)? {
            let name = field.name().unwrap_or("").to_string();

            if name == image_field {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field.bytes().await.map_err(too_large)?;
                if !data.is_empty() {
                    form.image = Some(ImageUpload { file_name, data });
                }
            } else if !name.is_empty() {
                let value = field.text().await.map_err(too_large)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Scalars become their text form; nulls and nested values are dropped.
    fn from_json(body: Map<String, Value>) -> Self {
        let fields = body
            .into_iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((name, text))
            })
            .collect();
        FormFields { fields, image: None }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.text(name).and_then(parse_bool)
    }

    pub fn image_change(&mut self) -> ImageChange {
        ImageChange {
            upload: self.image.take(),
            remove: self.flag("removeImage").unwrap_or(false),
        }
    }
}

fn content_type_for(file_name: &str) -> mime::Mime {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub async fn serve_image(
    State(state): State<AppState>,
    PathParam(file_name): PathParam<String>,
) -> Result<Response> {
    let path = state
        .media
        .resolve(&file_name)
        .ok_or(AppError::NotFound("Image"))?;

    if !tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
        return Err(AppError::NotFound("Image"));
    }

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AppError::NotFound("Image"))?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&file_name).as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::service(format!("failed to build image response: {}", e)))
}
