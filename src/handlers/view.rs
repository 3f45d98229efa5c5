//! Read-side endpoints: code resolution and mailbox viewing

use serde_json::json;

use crate::error::{Error, Result};
use crate::handlers::AppContext;
use crate::protocol::{Request, Response};

/// GET /api/codigo-subida-info
///
/// Lets a sender confirm whose mailbox an upload code belongs to
/// before submitting; never discloses items.
pub async fn upload_code_info(context: &AppContext, request: &Request) -> Result<Response> {
    let code = request.query_param("codigo").unwrap_or("");
    let store = context.store.load().await?;
    let mailbox = store
        .find_by_upload_code(code)
        .ok_or_else(|| Error::NotFound("Código no válido".to_string()))?;

    Response::json(200, &json!({ "nombre": mailbox.display_name }))
}

/// GET /api/buzon-nombre
pub async fn view_code_info(context: &AppContext, request: &Request) -> Result<Response> {
    let code = request.query_param("codigoVision").unwrap_or("");
    let store = context.store.load().await?;
    let mailbox = store
        .find_by_view_code(code)
        .ok_or_else(|| Error::NotFound("Código no válido".to_string()))?;

    Response::json(200, &json!({ "nombre": mailbox.display_name }))
}

/// GET /api/buzon
///
/// Full item list in submission order, no pagination.
pub async fn view_mailbox(context: &AppContext, request: &Request) -> Result<Response> {
    let code = request.query_param("codigoVision").unwrap_or("");
    let store = context.store.load().await?;
    let mailbox = store
        .find_by_view_code(code)
        .ok_or_else(|| Error::NotFound("Código de visualización no válido".to_string()))?;

    Response::json(
        200,
        &json!({ "nombre": mailbox.display_name, "items": mailbox.items }),
    )
}
