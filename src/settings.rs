use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use anyhow::{Context, Result, bail};
use config as cfg;
use serde::{Deserialize, Serialize};

pub const KNOWN_TOOLS: &[&str] = &[
    "docker",
    "mysql",
    "mysqldump",
    "mysqladmin",
    "psql",
    "pg_dump",
    "dropdb",
    "createdb",
];

pub const ENV_PREFIX: &str = "JDUMP";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub tools: HashMap<String, String>,
    pub container: ContainerEnv,
}

/// Variables read *inside* the container to obtain the engine's root password.
/// The image's entrypoint is expected to have set them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerEnv {
    pub mysql_password_env: String,
    pub postgres_password_env: String,
}

impl Default for ContainerEnv {
    fn default() -> Self {
        Self {
            mysql_password_env: "MYSQL_ROOT_PASSWORD".into(),
            postgres_password_env: "POSTGRES_PASSWORD".into(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let mut builder = cfg::Config::builder();
        if path.exists() {
            builder = builder.add_source(cfg::File::from(path).format(cfg::FileFormat::Toml));
        }
        let raw: RawSettings = builder
            .add_source(
                cfg::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("load {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("deserialize {}", path.display()))?;

        let mut tools = HashMap::with_capacity(raw.tools.len());
        for (name_raw, bin_raw) in raw.tools {
            let name = name_raw.trim().to_string();
            if !KNOWN_TOOLS.contains(&name.as_str()) {
                bail!(
                    "unknown tool '{}' in [tools]; known: {}",
                    name,
                    KNOWN_TOOLS.join("|")
                );
            }
            let bin = bin_raw.trim().to_string();
            if bin.is_empty() {
                bail!("empty binary for tool '{}'", name);
            }
            tools.insert(name, bin);
        }

        let defaults = ContainerEnv::default();
        let container = ContainerEnv {
            mysql_password_env: env_name(raw.container.mysql_password_env)?
                .unwrap_or(defaults.mysql_password_env),
            postgres_password_env: env_name(raw.container.postgres_password_env)?
                .unwrap_or(defaults.postgres_password_env),
        };

        Ok(Self { tools, container })
    }

    pub fn to_toml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Out<'a> {
            tools: BTreeMap<&'a str, &'a str>,
            container: &'a ContainerEnv,
        }
        let out = Out {
            tools: self
                .tools
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            container: &self.container,
        };
        Ok(toml::to_string_pretty(&out)?)
    }
}

fn env_name(s: Option<String>) -> Result<Option<String>> {
    let Some(s) = s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let ok = s
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !ok {
        bail!("bad environment variable name '{s}' in [container]");
    }
    Ok(Some(s))
}

#[derive(Debug, Deserialize, Default)]
struct RawSettings {
    #[serde(default)]
    tools: HashMap<String, String>,
    #[serde(default)]
    container: RawContainer,
}

#[derive(Debug, Deserialize, Default)]
struct RawContainer {
    mysql_password_env: Option<String>,
    postgres_password_env: Option<String>,
}
