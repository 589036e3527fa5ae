use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing as log;

use crate::error::AppError;

pub const ACTIVE_KEY: &str = "configToUse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    #[default]
    Mysql,
    Postgres,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 2] = [DatabaseType::Mysql, DatabaseType::Postgres];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Mysql => "mysql",
            DatabaseType::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "mysql" => Ok(DatabaseType::Mysql),
            "postgres" => Ok(DatabaseType::Postgres),
            other => bail!("unknown databaseType '{other}' (expected mysql|postgres)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub database: String,
    pub dump_folder: PathBuf,
    pub user: String,
    pub password: String,
    pub db_type: DatabaseType,
    pub containerized: bool,
    pub container_name: Option<String>,
    /// Informational; never used to build commands.
    pub container_port: Option<String>,
}

impl Profile {
    pub fn container(&self) -> Result<&str> {
        match self.container_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => bail!(
                "configuration '{}' is containerized but has no container name",
                self.id
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;
        if self.containerized {
            self.container()
                .map_err(|e| AppError::Validation(e.to_string()))?;
        }
        Ok(())
    }
}

pub fn validate_id(id: &str) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("configuration key must not be empty".into()).into());
    }
    if id == ACTIVE_KEY {
        return Err(AppError::Validation(format!("'{ACTIVE_KEY}' is a reserved key")).into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    Unset,
    Missing { id: String, known: Vec<String> },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::Unset => f.write_str("Config to use is not set in configuration"),
            Unresolved::Missing { id, known } => write!(
                f,
                "Could not find config {id} in configurations: [{}]",
                known.join(", ")
            ),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    Ready(&'a Profile),
    RequiresSelection(Unresolved),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDocument {
    active: Option<String>,
    profiles: Vec<Profile>,
}

impl ProfileDocument {
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn list_other_ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn resolve_active(&self) -> Resolution<'_> {
        let Some(id) = self.active.as_deref() else {
            return Resolution::RequiresSelection(Unresolved::Unset);
        };
        match self.get(id) {
            Some(p) => Resolution::Ready(p),
            None => Resolution::RequiresSelection(Unresolved::Missing {
                id: id.to_string(),
                known: self.list_other_ids().into_iter().map(String::from).collect(),
            }),
        }
    }

    pub fn add(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        if self.get(&profile.id).is_some() {
            return Err(
                AppError::Validation(format!("configuration '{}' already exists", profile.id))
                    .into(),
            );
        }
        self.profiles.push(profile);
        Ok(())
    }

    pub fn edit(&mut self, id: &str, profile: Profile) -> Result<()> {
        profile.validate()?;
        if profile.id != id && self.get(&profile.id).is_some() {
            return Err(
                AppError::Validation(format!("configuration '{}' already exists", profile.id))
                    .into(),
            );
        }
        let slot = self
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow::anyhow!("configuration '{id}' not found"))?;
        if self.active.as_deref() == Some(id) {
            self.active = Some(profile.id.clone());
        }
        *slot = profile;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Profile> {
        let idx = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| anyhow::anyhow!("configuration '{id}' not found"))?;
        Ok(self.profiles.remove(idx))
    }

    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            bail!("configuration '{id}' not found");
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn from_yaml(src: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(src).context("invalid YAML")?;
        let map = match root {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m,
            _ => bail!("top level must be a mapping"),
        };

        let mut doc = ProfileDocument::default();
        for (k, v) in map {
            let key = lenient::scalar(&k).context("profile keys must be scalars")?;
            if key == ACTIVE_KEY {
                doc.active = lenient::opt_scalar(&v)
                    .with_context(|| format!("{ACTIVE_KEY} must be a scalar"))?;
                continue;
            }
            let raw: RawProfile = serde_yaml::from_value(v)
                .with_context(|| format!("configuration '{key}'"))?;
            let db_type = match raw.database_type.as_deref() {
                Some(t) if !t.trim().is_empty() => t
                    .parse::<DatabaseType>()
                    .with_context(|| format!("configuration '{key}'"))?,
                _ => DatabaseType::default(),
            };
            if doc.get(&key).is_some() {
                bail!("duplicate configuration '{key}'");
            }
            doc.profiles.push(Profile {
                id: key,
                database: raw.database,
                dump_folder: PathBuf::from(raw.dump_folder),
                user: raw.database_user,
                password: raw.database_password,
                db_type,
                containerized: raw.is_docker.unwrap_or(false),
                container_name: raw.docker_container_name,
                container_port: raw.docker_port,
            });
        }
        Ok(doc)
    }

    pub fn to_yaml(&self) -> Result<String> {
        self.render(false)
    }

    pub fn to_redacted_yaml(&self) -> Result<String> {
        self.render(true)
    }

    fn render(&self, redact: bool) -> Result<String> {
        let mut map = Mapping::new();
        map.insert(
            Value::String(ACTIVE_KEY.into()),
            self.active.clone().map(Value::String).unwrap_or(Value::Null),
        );
        for p in &self.profiles {
            let out = ProfileOut {
                database: &p.database,
                dump_folder: p.dump_folder.to_string_lossy().into_owned(),
                database_user: &p.user,
                database_password: if redact { "<redacted>" } else { &p.password },
                database_type: p.db_type.as_str(),
                is_docker: p.containerized,
                docker_container_name: p.container_name.as_deref(),
                docker_port: p.container_port.as_deref(),
            };
            map.insert(Value::String(p.id.clone()), serde_yaml::to_value(out)?);
        }
        Ok(serde_yaml::to_string(&map)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    #[serde(deserialize_with = "lenient::string")]
    database: String,
    #[serde(deserialize_with = "lenient::string")]
    dump_folder: String,
    #[serde(deserialize_with = "lenient::string")]
    database_user: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    database_password: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    database_type: Option<String>,
    #[serde(default)]
    is_docker: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    docker_container_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    docker_port: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileOut<'a> {
    database: &'a str,
    dump_folder: String,
    database_user: &'a str,
    database_password: &'a str,
    database_type: &'static str,
    is_docker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    docker_container_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    docker_port: Option<&'a str>,
}

mod lenient {
    use anyhow::{Result, bail};
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_yaml::Value;

    pub fn scalar(v: &Value) -> Result<String> {
        Ok(match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Tagged(t) => return scalar(&t.value),
            _ => bail!("expected a scalar value"),
        })
    }

    pub fn opt_scalar(v: &Value) -> Result<Option<String>> {
        if v.is_null() {
            return Ok(None);
        }
        let s = scalar(v)?;
        Ok((!s.trim().is_empty()).then_some(s))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        scalar(&v).map_err(D::Error::custom)
    }

    // `databasePassword:` left blank by hand reads as an empty password.
    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        if v.is_null() {
            return Ok(String::new());
        }
        scalar(&v).map_err(D::Error::custom)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Value::deserialize(d)?;
        opt_scalar(&v).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<ProfileDocument> {
        if !self.exists() {
            log::info!("no configuration at {}, creating one", self.path.display());
            self.init()?;
        }
        let src = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        ProfileDocument::from_yaml(&src).map_err(|e| {
            AppError::ConfigParse {
                path: self.path.clone(),
                message: format!("{e:#}"),
            }
            .into()
        })
    }

    pub fn init(&self) -> Result<()> {
        self.write_atomic(&format!("{ACTIVE_KEY}: "))
    }

    pub fn save(&self, doc: &ProfileDocument) -> Result<()> {
        self.write_atomic(&doc.to_yaml()?)
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config.yml".into());
        let tmp = self.path.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        log::debug!("saved {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn mysql(id: &str) -> Profile {
        Profile {
            id: id.into(),
            database: "shop".into(),
            dump_folder: PathBuf::from("/srv/dumps"),
            user: "root".into(),
            password: "hunter2".into(),
            db_type: DatabaseType::Mysql,
            containerized: false,
            container_name: None,
            container_port: None,
        }
    }

    pub fn postgres_in_container(id: &str) -> Profile {
        Profile {
            id: id.into(),
            database: "analytics".into(),
            dump_folder: PathBuf::from("/srv/pg"),
            user: "app".into(),
            password: "s3cret".into(),
            db_type: DatabaseType::Postgres,
            containerized: true,
            container_name: Some("pg_main".into()),
            container_port: Some("5432".into()),
        }
    }
}
