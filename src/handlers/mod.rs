//! HTTP endpoint handlers

pub mod admin;
pub mod submit;
pub mod view;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::store::RosterStore;
use crate::uploads::UploadStore;

/// Shared state handed to every handler.
///
/// Mutating handlers hold `write_lock` across their whole
/// load-modify-save cycle so two overlapping submissions cannot lose an
/// update; read handlers load fresh state without it.
pub struct AppContext {
    pub store: Arc<dyn RosterStore>,
    pub uploads: Arc<UploadStore>,
    pub write_lock: Mutex<()>,
}

impl AppContext {
    pub fn new(store: Arc<dyn RosterStore>, uploads: Arc<UploadStore>) -> Self {
        Self {
            store,
            uploads,
            write_lock: Mutex::new(()),
        }
    }
}
