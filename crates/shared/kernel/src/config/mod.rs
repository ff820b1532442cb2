use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable prefix; nesting uses `__` (`FHUB__MAIL__HOST` -> `mail.host`).
pub const ENV_PREFIX: &str = "FHUB";

/// Keys whose environment values are comma separated lists.
const LIST_KEYS: &[&str] = &["security.warehouse_keys", "security.ingest_tokens"];

#[fhub_derive::fhub_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads layered configuration: an optional file, then `FHUB__*` environment overrides.
///
/// `path` names the file without extension (`server` finds `server.toml`, `server.yaml`,
/// `server.json`...). A missing file is not an error; every section has defaults.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is malformed or a value does not fit `T`.
///
/// ```rust
/// use fhub_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: Option<u16>,
/// }
///
/// let cfg: AppConfig = load_config(Some("does/not/exist")).unwrap_or_default();
/// assert!(cfg.port.is_none());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("server"), |p| p.as_ref().to_path_buf());

    let environment = LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .convert_case(config::Case::Snake)
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    );

    info!(path = %effective_path.display(), "Loading configuration");

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(environment)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
