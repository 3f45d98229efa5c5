//! Core domain types: the roster document and its registry operations
//!
//! Serde field names keep the wire/data format of the original deployment
//! (`adminKey`, `buzzones`, `codigoSubida`, ...) so existing `data.json`
//! files and clients keep working unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Schema version written to persisted documents. Documents from before
/// versioning carry no field and deserialize as 0.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Unique identifier for a mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailboxId(pub Uuid);

impl MailboxId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MailboxId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a submitted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an opaque access code: the first 12 hex chars of a fresh UUID.
pub fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..12].to_string()
}

/// What a submitted item carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "texto")]
    Text,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "archivo")]
    File,
}

impl ItemKind {
    /// Parse a declared kind from its wire spelling.
    ///
    /// Unrecognized values yield `None` so the caller can apply its
    /// presence-based default instead of rejecting the submission.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "texto" => Some(ItemKind::Text),
            "link" => Some(ItemKind::Link),
            "archivo" => Some(ItemKind::File),
            _ => None,
        }
    }

    pub fn as_wire_str(&self) -> &'static str {
        match self {
            ItemKind::Text => "texto",
            ItemKind::Link => "link",
            ItemKind::File => "archivo",
        }
    }
}

/// A single submitted piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "tipo")]
    pub kind: ItemKind,
    #[serde(rename = "contenido")]
    pub text_body: String,
    #[serde(rename = "link")]
    pub link_url: String,
    /// Public path of a stored attachment, `null` for text/link items.
    #[serde(rename = "archivo")]
    pub file_ref: Option<String>,
    #[serde(rename = "fecha")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Build a new item with a fresh id, trimmed fields, and the current time.
    pub fn new(kind: ItemKind, text_body: &str, link_url: &str, file_ref: Option<String>) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            text_body: text_body.trim().to_string(),
            link_url: link_url.trim().to_string(),
            file_ref,
            created_at: Utc::now(),
        }
    }
}

/// A recipient's mailbox, addressed by two distinct opaque codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: MailboxId,
    #[serde(rename = "nombre")]
    pub display_name: String,
    /// Write-only credential; permits appending items, never listing them.
    #[serde(rename = "codigoSubida")]
    pub upload_code: String,
    /// Read-only credential; permits listing items, never appending.
    #[serde(rename = "codigoVision")]
    pub view_code: String,
    pub items: Vec<Item>,
}

impl Mailbox {
    /// Fresh mailbox with newly minted codes and no items.
    pub fn new(display_name: &str) -> Self {
        Self {
            id: MailboxId::new(),
            display_name: display_name.to_string(),
            upload_code: generate_code(),
            view_code: generate_code(),
            items: Vec::new(),
        }
    }
}

/// Per-mailbox code disclosure for the admin listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxCodes {
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "codigoSubida")]
    pub upload_code: String,
    #[serde(rename = "codigoVision")]
    pub view_code: String,
}

/// The whole persisted roster document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "adminKey")]
    pub admin_secret: String,
    #[serde(rename = "buzzones")]
    pub mailboxes: Vec<Mailbox>,
}

impl Store {
    /// Empty roster, provisionable once via `provision`.
    pub fn new(admin_secret: &str) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            admin_secret: admin_secret.to_string(),
            mailboxes: Vec::new(),
        }
    }

    /// Roster built from a participant list: one mailbox per non-blank
    /// trimmed name, each with freshly generated codes and empty items.
    pub fn seeded<S: AsRef<str>>(admin_secret: &str, names: &[S]) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            admin_secret: admin_secret.to_string(),
            mailboxes: names
                .iter()
                .map(|n| n.as_ref().trim())
                .filter(|n| !n.is_empty())
                .map(Mailbox::new)
                .collect(),
        }
    }

    pub fn find_by_upload_code(&self, code: &str) -> Option<&Mailbox> {
        self.mailboxes.iter().find(|b| b.upload_code == code)
    }

    pub fn find_by_upload_code_mut(&mut self, code: &str) -> Option<&mut Mailbox> {
        self.mailboxes.iter_mut().find(|b| b.upload_code == code)
    }

    pub fn find_by_view_code(&self, code: &str) -> Option<&Mailbox> {
        self.mailboxes.iter().find(|b| b.view_code == code)
    }

    /// Disclose every mailbox's codes, in creation order.
    pub fn admin_listing(&self, secret: &str) -> Result<Vec<MailboxCodes>> {
        if secret != self.admin_secret {
            return Err(Error::Unauthorized("Clave admin incorrecta".to_string()));
        }
        Ok(self
            .mailboxes
            .iter()
            .map(|b| MailboxCodes {
                display_name: b.display_name.clone(),
                upload_code: b.upload_code.clone(),
                view_code: b.view_code.clone(),
            })
            .collect())
    }

    /// One-time roster creation. Once any mailbox exists the codes are
    /// definitive and the whole roster is frozen, so repeated calls are
    /// refused even with identical input.
    pub fn provision<S: AsRef<str>>(&mut self, secret: &str, names: &[S]) -> Result<()> {
        if !self.mailboxes.is_empty() {
            return Err(Error::Forbidden(
                "Los buzones ya existen. Los códigos de subida y visión son definitivos y no pueden cambiarse."
                    .to_string(),
            ));
        }
        if secret != self.admin_secret {
            return Err(Error::Unauthorized("Clave admin incorrecta".to_string()));
        }
        let secret = self.admin_secret.clone();
        *self = Self::seeded(&secret, names);
        Ok(())
    }
}
