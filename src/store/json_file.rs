//! File-backed roster store: one pretty-printed JSON document on disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::config::DEFAULT_PARTICIPANTS;
use crate::error::{Error, Result};
use crate::store::RosterStore;
use crate::types::{Store, CURRENT_SCHEMA_VERSION};

/// Shape of the optional seed file next to the data file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    participantes: Vec<String>,
}

/// Roster store backed by a single JSON file.
///
/// On first load (missing, unparseable, or empty-roster data file) it
/// synthesizes a fresh store from the seed file, falling back to the
/// built-in participant list, and persists it before returning.
pub struct JsonFileStore {
    path: PathBuf,
    seed_path: PathBuf,
    admin_secret: String,
}

impl JsonFileStore {
    pub async fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        path: P,
        seed_path: Q,
        admin_secret: &str,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path,
            seed_path: seed_path.as_ref().to_path_buf(),
            admin_secret: admin_secret.to_string(),
        })
    }

    async fn seed_names(&self) -> Vec<String> {
        if let Ok(raw) = fs::read(&self.seed_path).await {
            if let Ok(seed) = serde_json::from_slice::<SeedFile>(&raw) {
                if !seed.participantes.is_empty() {
                    return seed.participantes;
                }
            }
        }
        DEFAULT_PARTICIPANTS.iter().map(|n| n.to_string()).collect()
    }
}

#[async_trait]
impl RosterStore for JsonFileStore {
    async fn load(&self) -> Result<Store> {
        if let Ok(raw) = fs::read(&self.path).await {
            if let Ok(mut store) = serde_json::from_slice::<Store>(&raw) {
                if store.version > CURRENT_SCHEMA_VERSION {
                    return Err(Error::Internal(format!(
                        "data file schema version {} is newer than supported version {}",
                        store.version, CURRENT_SCHEMA_VERSION
                    )));
                }
                if !store.mailboxes.is_empty() {
                    // legacy pre-versioning documents are accepted verbatim
                    // and upgraded on the next save
                    store.version = CURRENT_SCHEMA_VERSION;
                    return Ok(store);
                }
            }
        }

        let names = self.seed_names().await;
        let store = Store::seeded(&self.admin_secret, &names);
        self.save(&store).await?;
        Ok(store)
    }

    async fn save(&self, store: &Store) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(store)?;
        let mut file = File::create(&self.path).await?;
        file.write_all(&serialized).await?;
        file.sync_all().await?;
        Ok(())
    }
}
