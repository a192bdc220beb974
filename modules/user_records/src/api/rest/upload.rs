//! Screen update extractor: JSON with base64 screenshot, or multipart form-data.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use base64::Engine;
use modkit::api::problem::ProblemResponse;

use crate::api::rest::dto::UpdateScreenReq;
use crate::api::rest::error::validation;
use crate::contract::model::{Patch, ScreenPatch, ScreenshotUpload};

/// Multipart part names accepted for the screenshot file.
const FILE_PARTS: [&str; 2] = ["screenshot", "file"];

/// Parsed screen update: metadata patch plus optional screenshot bytes.
#[derive(Debug)]
pub struct ScreenUpdate {
    pub patch: ScreenPatch,
    pub upload: Option<ScreenshotUpload>,
}

impl<S> FromRequest<S> for ScreenUpdate
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = req.uri().path().to_owned();
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| validation("body", e.body_text(), &instance))?;
            from_multipart(multipart, &instance).await
        } else {
            let Json(body) = Json::<UpdateScreenReq>::from_request(req, state)
                .await
                .map_err(|e| validation("body", e.body_text(), &instance))?;
            from_json(body, &instance)
        }
    }
}

fn from_json(body: UpdateScreenReq, instance: &str) -> Result<ScreenUpdate, ProblemResponse> {
    let patch = body.patch();
    let upload = match body.screenshot.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(encoded) => Some(decode_base64_image(encoded).map_err(|detail| {
            validation("screenshot", detail, instance)
        })?),
    };
    Ok(ScreenUpdate { patch, upload })
}

async fn from_multipart(
    mut multipart: Multipart,
    instance: &str,
) -> Result<ScreenUpdate, ProblemResponse> {
    let mut patch = ScreenPatch::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation("body", e.body_text(), instance))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            n if FILE_PARTS.contains(&n) => {
                let declared = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation("screenshot", e.body_text(), instance))?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    upload = Some(ScreenshotUpload {
                        bytes: bytes.to_vec(),
                        declared_content_type: declared,
                    });
                }
            }
            "contact" | "url" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation(&name, e.body_text(), instance))?;
                let slot = if name == "contact" {
                    &mut patch.contact
                } else {
                    &mut patch.url
                };
                *slot = Patch::Value(text);
            }
            _ => {
                tracing::debug!(part = %name, "ignoring unknown multipart part");
            }
        }
    }

    Ok(ScreenUpdate { patch, upload })
}

/// Decode standard base64, tolerating a `data:<mime>;base64,` prefix and
/// embedded whitespace.
pub fn decode_base64_image(encoded: &str) -> Result<ScreenshotUpload, String> {
    let (declared, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| "malformed data URL".to_string())?;
            let mime = meta.split(';').next().filter(|m| !m.is_empty());
            (mime.map(str::to_owned), data)
        }
        None => (None, encoded),
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("screenshot is not valid base64: {e}"))?;

    Ok(ScreenshotUpload {
        bytes,
        declared_content_type: declared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base64_decodes() {
        let up = decode_base64_image("aGVsbG8=").unwrap();
        assert_eq!(up.bytes, b"hello");
        assert_eq!(up.declared_content_type, None);
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let up = decode_base64_image("data:image/png;base64,aGVs\nbG8=").unwrap();
        assert_eq!(up.bytes, b"hello");
        assert_eq!(up.declared_content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_base64_image("not base64!!").is_err());
        assert!(decode_base64_image("data:image/png;base64").is_err());
    }
}
