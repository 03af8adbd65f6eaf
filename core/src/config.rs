//! Target host configuration and URL assembly.

use serde::{Deserialize, Serialize};

const HTTP_PORT_DEFAULT: u16 = 80;
const HTTPS_PORT_DEFAULT: u16 = 443;

/// The single host a client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_tls: bool,
}

impl ClientConfig {
    pub fn new(host: &str, port: u16, use_tls: bool) -> Self {
        Self {
            host: host.to_string(),
            port,
            use_tls,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    fn default_port(&self) -> u16 {
        if self.use_tls {
            HTTPS_PORT_DEFAULT
        } else {
            HTTP_PORT_DEFAULT
        }
    }

    /// Absolute URL for `path`: `scheme://host[:port]/path`.
    ///
    /// The port is omitted when it is the scheme's default, and a leading
    /// `/` is added when `path` lacks one.
    pub fn full_path(&self, path: &str) -> String {
        let port = if self.port == self.default_port() {
            String::new()
        } else {
            format!(":{}", self.port)
        };
        let slash = if path.starts_with('/') { "" } else { "/" };
        format!("{}://{}{port}{slash}{path}", self.scheme(), self.host)
    }
}
