//! buzon - an anonymous code-addressed mailbox service
//!
//! A fixed roster of recipients each gets a write-only upload code and a
//! read-only view code; anonymous senders drop text, links, or files into
//! a recipient's mailbox over a small HTTP/JSON API, and the recipient
//! later views the accumulated items. The roster lives in one JSON
//! document that is re-read per request and fully rewritten per mutation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod protocol;
pub mod server;
pub mod store;
pub mod types;
pub mod uploads;

pub use config::Config;
pub use error::{Error, Result};
pub use handlers::AppContext;
pub use protocol::{Request, Response};
pub use server::HttpServer;
pub use store::{JsonFileStore, MemoryStore, RosterStore};
pub use types::{Item, ItemKind, Mailbox, MailboxCodes, Store};
pub use uploads::UploadStore;
