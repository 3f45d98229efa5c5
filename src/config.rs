//! Runtime configuration: environment overrides with built-in defaults

use std::env;
use std::path::PathBuf;

/// Admin secret used when `ADMIN_KEY` is not set.
pub const DEFAULT_ADMIN_SECRET: &str = "amongus14";

/// Participant roster used when no seed file is present.
pub const DEFAULT_PARTICIPANTS: [&str; 12] = [
    "Ambar Julissa Gómez",
    "Cindy Elizabeth Diaz Guzman",
    "Dayan Guerra",
    "Georgie De Aries",
    "Gilberto Acevedo",
    "Hector Reina",
    "Mani Delgado Rubí",
    "Manolete Vicente",
    "Rogelio Valadez",
    "Rodrigo Bonka",
    "Sandra Isabel Ramos Ramírez",
    "Víctor Josué Palomares Pérez",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub seed_file: PathBuf,
    pub uploads_dir: PathBuf,
    pub admin_secret: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `HOST`, `PORT`, `DATA_DIR`, and `ADMIN_KEY` override the defaults;
    /// the data file, seed file, and uploads directory all live under
    /// `DATA_DIR` (current directory if unset).
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_file: data_dir.join("data.json"),
            seed_file: data_dir.join("seed.json"),
            uploads_dir: data_dir.join("uploads"),
            admin_secret: env::var("ADMIN_KEY").unwrap_or_else(|_| DEFAULT_ADMIN_SECRET.to_string()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
