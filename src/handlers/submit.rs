//! Anonymous submission endpoints

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::handlers::AppContext;
use crate::multipart;
use crate::protocol::{Request, Response};
use crate::types::{Item, ItemKind};
use crate::uploads;

/// Acknowledgment sent for every accepted submission.
pub const SUBMIT_ACK: &str = "¡Tu cosita llegó al buzón! 💌";

#[derive(Debug, Default, Deserialize)]
struct SubmitFields {
    #[serde(rename = "codigoSubida", default)]
    upload_code: String,
    #[serde(rename = "tipo", default)]
    kind: Option<String>,
    #[serde(rename = "contenido", default)]
    text_body: Option<String>,
    #[serde(rename = "link", default)]
    link_url: Option<String>,
}

impl SubmitFields {
    /// The caller's declared kind, or the presence-based fallback.
    fn resolved_kind(&self, fallback: ItemKind) -> ItemKind {
        self.kind
            .as_deref()
            .and_then(ItemKind::from_wire)
            .unwrap_or(fallback)
    }

    fn into_item(self, fallback: ItemKind, file_ref: Option<String>) -> Item {
        let kind = self.resolved_kind(fallback);
        Item::new(
            kind,
            self.text_body.as_deref().unwrap_or(""),
            self.link_url.as_deref().unwrap_or(""),
            file_ref,
        )
    }
}

/// POST /api/subir (multipart, optional `archivo` file part)
pub async fn submit_file(context: &AppContext, request: &Request) -> Result<Response> {
    let content_type = request.header("content-type").unwrap_or("");
    let boundary = multipart::boundary(content_type)
        .ok_or_else(|| Error::Protocol("expected multipart/form-data".to_string()))?;
    let parts = multipart::parse(&request.body, &boundary)?;

    let mut fields = SubmitFields::default();
    let mut file_part = None;
    for part in &parts {
        if part.filename.is_some() {
            if part.name == "archivo" {
                file_part = Some(part);
            }
            continue;
        }
        let value = part.text();
        match part.name.as_str() {
            "codigoSubida" => fields.upload_code = value,
            "tipo" => fields.kind = Some(value),
            "contenido" => fields.text_body = Some(value),
            "link" => fields.link_url = Some(value),
            _ => {}
        }
    }

    // the attachment is validated and stored before the item is appended;
    // a failed persist afterwards leaves the file orphaned on disk
    let file_ref = match file_part {
        Some(part) => {
            let original_name = part.filename.as_deref().unwrap_or("");
            uploads::validate(original_name, part.content_type.as_deref(), part.data.len())?;
            Some(context.uploads.store(original_name, &part.data).await?)
        }
        None => None,
    };

    let fallback = if file_ref.is_some() {
        ItemKind::File
    } else {
        ItemKind::Text
    };
    let upload_code = fields.upload_code.clone();
    append_item(context, &upload_code, fields.into_item(fallback, file_ref)).await
}

/// POST /api/subir-link (JSON body, never a file)
pub async fn submit_link(context: &AppContext, request: &Request) -> Result<Response> {
    let fields: SubmitFields = serde_json::from_slice(&request.body)
        .map_err(|e| Error::Protocol(format!("invalid JSON body: {}", e)))?;

    let upload_code = fields.upload_code.clone();
    append_item(context, &upload_code, fields.into_item(ItemKind::Link, None)).await
}

async fn append_item(context: &AppContext, upload_code: &str, item: Item) -> Result<Response> {
    let _guard = context.write_lock.lock().await;
    let mut store = context.store.load().await?;
    let mailbox = store
        .find_by_upload_code_mut(upload_code)
        .ok_or_else(|| Error::NotFound("Código de subida no válido".to_string()))?;

    log::debug!(
        "appending {} item to mailbox {}",
        item.kind.as_wire_str(),
        mailbox.display_name
    );
    mailbox.items.push(item);
    context.store.save(&store).await?;

    Response::json(200, &json!({ "ok": true, "mensaje": SUBMIT_ACK }))
}
