//! Admin endpoints: one-time roster provisioning and code listing

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::handlers::AppContext;
use crate::protocol::{Request, Response};

/// Participant names arrive either as a JSON array or as one
/// newline-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Many(Vec<String>),
    One(String),
}

impl NameList {
    /// Trimmed, non-blank entries.
    fn names(&self) -> Vec<String> {
        match self {
            NameList::Many(entries) => entries
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            NameList::One(raw) => raw
                .lines()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProvisionRequest {
    #[serde(rename = "adminKey", default)]
    admin_key: String,
    #[serde(rename = "participantes", default)]
    participants: Option<NameList>,
}

/// POST /api/admin/buzzones
pub async fn provision(context: &AppContext, request: &Request) -> Result<Response> {
    let payload: ProvisionRequest = serde_json::from_slice(&request.body)
        .map_err(|e| Error::Protocol(format!("invalid JSON body: {}", e)))?;
    let names = payload
        .participants
        .as_ref()
        .map(|p| p.names())
        .unwrap_or_default();

    let _guard = context.write_lock.lock().await;
    let mut store = context.store.load().await?;
    store.provision(&payload.admin_key, &names)?;
    context.store.save(&store).await?;

    log::info!("roster provisioned with {} mailboxes", store.mailboxes.len());
    Response::json(
        200,
        &json!({
            "buzzones": store.mailboxes,
            "adminKey": store.admin_secret,
        }),
    )
}

/// GET /api/admin/info
pub async fn info(context: &AppContext, request: &Request) -> Result<Response> {
    let key = request.query_param("key").unwrap_or("");
    let store = context.store.load().await?;
    let listing = store.admin_listing(key)?;

    Response::json(200, &json!({ "buzzones": listing }))
}
