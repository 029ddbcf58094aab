//! Server configuration.
//!
//! Read from the environment (a `.env` file is loaded first when present).
//!
//! | Variable                  | Default                   |
//! |---------------------------|---------------------------|
//! | `RIDEFARE_PORT`           | `3000`                    |
//! | `RIDEFARE_DOWNLOAD_DIR`   | `downloads`               |
//! | `RIDEFARE_ALLOWED_ORIGIN` | `http://localhost:3000`   |
//! | `RIDEFARE_PUBLIC_URL`     | `http://localhost:<port>` |

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Where the CORS layer accepts requests from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigin {
    Any,
    Exact(String),
}

impl AllowedOrigin {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "*" => AllowedOrigin::Any,
            origin => AllowedOrigin::Exact(origin.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Split reports are written here and served from `/download`
    pub download_dir: PathBuf,
    pub allowed_origin: AllowedOrigin,
    /// Base of the links returned by `/split`
    pub public_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("RIDEFARE_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let download_dir = lookup("RIDEFARE_DOWNLOAD_DIR")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string());
        let allowed_origin = AllowedOrigin::parse(
            &lookup("RIDEFARE_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
        );
        let public_url = lookup("RIDEFARE_PUBLIC_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        let mut config = Self {
            port,
            download_dir: PathBuf::from(download_dir),
            allowed_origin,
            public_url: String::new(),
        };
        config.public_url = public_url.unwrap_or_else(|| config.local_url());
        config
    }

    /// Override the port. The public URL follows it unless it was set
    /// explicitly.
    pub fn with_port(mut self, port: u16) -> Self {
        let follows_port = self.public_url == self.local_url();
        self.port = port;
        if follows_port {
            self.public_url = self.local_url();
        }
        self
    }

    pub fn download_url(&self, filename: &str) -> String {
        format!("{}/download/{}", self.public_url, filename)
    }

    fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
