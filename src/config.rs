use std::fmt::Display;
use std::str::FromStr;

use crate::table::DEFAULT_PAGE_SIZE;

/// Browser-side settings, fixed at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base every endpoint is joined to, e.g. `/api` or `https://shop.example/api`.
    pub api_base: String,
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Reads `STOREDESK_API_BASE` and `STOREDESK_PAGE_SIZE` from the build environment.
    pub fn from_build_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: option_env!("STOREDESK_API_BASE")
                .map(str::to_string)
                .unwrap_or(defaults.api_base),
            page_size: option_env!("STOREDESK_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.page_size),
        }
    }
}

#[cfg(feature = "ssr")]
pub use server::{BootstrapAdmin, ServerConfig};

#[cfg(feature = "ssr")]
mod server {
    use std::env;
    use std::path::PathBuf;

    use leptos::logging::{log, warn};

    use super::parse_or;

    /// Credentials of the administrator created on first start.
    #[derive(Debug, Clone, PartialEq)]
    pub struct BootstrapAdmin {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct ServerConfig {
        pub db_path: String,
        pub upload_dir: PathBuf,
        /// URL prefix uploaded files are served under.
        pub upload_url: String,
        pub max_upload_bytes: usize,
        pub bootstrap_admin: Option<BootstrapAdmin>,
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                db_path: "storedesk.db".to_string(),
                upload_dir: PathBuf::from("uploads"),
                upload_url: "/uploads".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
                bootstrap_admin: None,
            }
        }
    }

    impl ServerConfig {
        pub fn from_env() -> Self {
            Self::from_lookup(|key| env::var(key).ok())
        }

        /// Builds the config from any key lookup; missing or invalid values fall back to defaults.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
            let defaults = Self::default();

            let bootstrap_admin = match (
                lookup("STOREDESK_ADMIN_EMAIL"),
                lookup("STOREDESK_ADMIN_PASSWORD"),
            ) {
                (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                    Some(BootstrapAdmin {
                        name: lookup("STOREDESK_ADMIN_NAME")
                            .unwrap_or_else(|| "Administrator".to_string()),
                        email,
                        password,
                    })
                }
                (Some(_), None) | (None, Some(_)) => {
                    warn!("[CONFIG] Admin bootstrap needs both STOREDESK_ADMIN_EMAIL and STOREDESK_ADMIN_PASSWORD");
                    None
                }
                _ => None,
            };

            let config = Self {
                db_path: lookup("STOREDESK_DB_PATH").unwrap_or(defaults.db_path),
                upload_dir: lookup("STOREDESK_UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.upload_dir),
                upload_url: defaults.upload_url,
                max_upload_bytes: parse_or(
                    "STOREDESK_MAX_UPLOAD_BYTES",
                    lookup("STOREDESK_MAX_UPLOAD_BYTES"),
                    defaults.max_upload_bytes,
                ),
                bootstrap_admin,
            };
            log!(
                "[CONFIG] db={} uploads={} max_upload={}B",
                config.db_path,
                config.upload_dir.display(),
                config.max_upload_bytes
            );
            config
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn defaults_apply_when_nothing_is_set() {
            assert_eq!(ServerConfig::from_lookup(lookup(&[])), ServerConfig::default());
        }

        #[test]
        fn invalid_number_falls_back() {
            let config = ServerConfig::from_lookup(lookup(&[("STOREDESK_MAX_UPLOAD_BYTES", "lots")]));
            assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        }

        #[test]
        fn bootstrap_needs_email_and_password() {
            let config = ServerConfig::from_lookup(lookup(&[("STOREDESK_ADMIN_EMAIL", "a@b.c")]));
            assert_eq!(config.bootstrap_admin, None);

            let config = ServerConfig::from_lookup(lookup(&[
                ("STOREDESK_ADMIN_EMAIL", "a@b.c"),
                ("STOREDESK_ADMIN_PASSWORD", "hunter2hunter2"),
            ]));
            let admin = config.bootstrap_admin.unwrap();
            assert_eq!(admin.name, "Administrator");
        }
    }
}

/// Parses an optional setting, logging and falling back on bad input.
#[cfg_attr(not(feature = "ssr"), allow(dead_code))]
pub(crate) fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            leptos::logging::warn!("[CONFIG] Invalid {key} value {raw:?}: {e}, using {default}");
            default
        }),
    }
}
