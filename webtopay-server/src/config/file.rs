//! TOML file configuration structures.
//!
//! These structs directly map to the `webtopay-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use webtopay_sdk::signature::DEFAULT_SIGN_FIELD;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub project: ProjectConfig,
    pub signature: SignatureConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// The merchant project registered with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project id, written either as a number or a string.
    pub id: ProjectIdValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectIdValue {
    Number(u64),
    Text(String),
}

impl ProjectIdValue {
    pub fn to_project_id(&self) -> webtopay_sdk::ProjectId {
        match self {
            ProjectIdValue::Number(id) => (*id).into(),
            ProjectIdValue::Text(id) => id.as_str().into(),
        }
    }
}

/// How callback signatures are verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum SignatureConfig {
    /// RSA/SHA-1 against the gateway's public key.
    Rsa {
        /// Path to the DER-encoded PKCS#1 public key.
        public_key_path: PathBuf,
        /// Request field carrying the signature.
        #[serde(default = "default_sign_field")]
        field: String,
    },
    /// HMAC-SHA256 with a shared secret.
    Hmac {
        secret: String,
        #[serde(default = "default_sign_field")]
        field: String,
    },
}

fn default_sign_field() -> String {
    DEFAULT_SIGN_FIELD.to_string()
}

/// Callback acceptance rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Fields every accepted callback must carry, e.g. `status = "1"`.
    #[serde(default)]
    pub expected_fields: HashMap<String, String>,
}
