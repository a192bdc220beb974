//! Server configuration: built-in defaults, then the YAML file, then
//! `APP__`-prefixed environment variables, then CLI flags.

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::paths::home_dir::resolve_home_dir;

const HOME_SUBDIR: &str = ".sensus";
const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    /// Section name → settings; `default` covers every unclaimed target.
    pub logging: Option<LoggingConfig>,
    /// Directory of `<module>.yaml` files merged over `modules`.
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Raw per-module settings, decoded by [`AppConfig::module_config`].
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Root for the database, logs and screenshots. Absolute after loading;
    /// empty means `~/.sensus` (`%APPDATA%/.sensus` on Windows).
    pub home_dir: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_owned(),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://<path>` (relative to `home_dir`) or `sqlite::memory:`.
    pub url: String,
    #[serde(default)]
    pub max_conns: Option<u32>,
    #[serde(default)]
    pub busy_timeout_ms: Option<u32>,
}

pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// trace | debug | info | warn | error | off
    pub console_level: String,
    /// Log file path; empty disables the file.
    pub file: String,
    /// Empty means the console level.
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_owned(),
        Section {
            console_level: "info".to_owned(),
            file: "logs/sensus.log".to_owned(),
            file_level: "debug".to_owned(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/sensus.db".to_owned(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

/// Flags that override loaded values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    /// `-v` count: 1 = debug, 2+ = trace on the console.
    pub verbose: u8,
    /// Swap the database for in-memory SQLite.
    pub mock: bool,
}

impl AppConfig {
    /// Load from an optional YAML file.
    ///
    /// Defaults apply to anything the file leaves out; env vars such as
    /// `APP__SERVER__PORT=9000` win over both. A named file that does not
    /// exist is an error. `server.home_dir` is made absolute and created.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: AppConfig = figment.extract().with_context(|| match path {
            Some(p) => format!("invalid configuration in {}", p.display()),
            None => "invalid configuration".to_owned(),
        })?;

        let home = resolve_home_dir(
            Some(config.server.home_dir.clone()).filter(|h| !h.trim().is_empty()),
            HOME_SUBDIR,
            true,
        )
        .context("cannot resolve server.home_dir")?;
        config.server.home_dir = home.to_string_lossy().into_owned();

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, Path::new(&dir))?;
        }
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("cannot render configuration as YAML")
    }

    /// Decode `modules.<name>`; a missing entry is `T::default()`.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.modules.get(name).map_or_else(
            || Ok(T::default()),
            |raw| {
                serde_json::from_value(raw.clone())
                    .with_context(|| format!("Invalid configuration for module '{name}'"))
            },
        )
    }

    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }

        if cli.verbose > 0 {
            let level = if cli.verbose == 1 { "debug" } else { "trace" };
            let logging = self.logging.get_or_insert_with(default_logging_config);
            if let Some(section) = logging.get_mut("default") {
                section.console_level = level.to_owned();
            }
        }

        if cli.mock {
            let db = self.database.get_or_insert(DatabaseConfig {
                url: String::new(),
                max_conns: None,
                busy_timeout_ms: None,
            });
            db.url = "sqlite::memory:".to_owned();
        }
    }
}

/// Each `*.yaml` / `*.yml` in `dir` becomes `modules.<file stem>`.
fn merge_module_files(bag: &mut HashMap<String, serde_json::Value>, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let entries = std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !path.is_file() || !is_yaml {
            continue;
        }
        let raw = std::fs::read_to_string(&path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid module config file {}", path.display()))?;
        bag.insert(stem.to_owned(), serde_json::to_value(value)?);
    }
    Ok(())
}
