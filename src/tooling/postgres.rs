use std::path::Path;

use anyhow::Result;

use super::{
    EnginePort,
    container::{self, Stream},
};
use crate::{
    profile::Profile,
    utils::process::{CmdSpec, EnvValue, StdioSpec, sh_quote},
};

pub const PASSWORD_VAR: &str = "PGPASSWORD";

pub struct PostgresCli;

impl PostgresCli {
    fn client(bin: &str, p: &Profile) -> CmdSpec {
        CmdSpec::new(bin)
            .env(PASSWORD_VAR, EnvValue::Secret(p.password.clone()))
            .args(["-U", p.user.as_str()])
    }
}

impl EnginePort for PostgresCli {
    fn dump(&self, p: &Profile, to: &Path) -> Result<CmdSpec> {
        Ok(Self::client("pg_dump", p)
            .args(["-d", p.database.as_str()])
            .stdout(StdioSpec::WriteTo(to.to_path_buf())))
    }

    fn restore(&self, p: &Profile, from: &Path) -> Result<CmdSpec> {
        Ok(Self::client("psql", p)
            .args(["-d", p.database.as_str()])
            .stdin(StdioSpec::ReadFrom(from.to_path_buf())))
    }

    fn clean(&self, p: &Profile) -> Result<Vec<CmdSpec>> {
        Ok(vec![
            Self::client("dropdb", p).args(["--if-exists", p.database.as_str()]),
            Self::client("createdb", p).arg(p.database.as_str()),
        ])
    }
}

pub struct PostgresInContainer<'a> {
    password_env: &'a str,
}

impl<'a> PostgresInContainer<'a> {
    pub fn new(password_env: &'a str) -> Self {
        Self { password_env }
    }

    fn script(&self, steps: &[String]) -> String {
        format!(
            "export {PASSWORD_VAR}={} && {}",
            container::env_ref(self.password_env),
            steps.join(" && ")
        )
    }
}

impl EnginePort for PostgresInContainer<'_> {
    fn dump(&self, p: &Profile, to: &Path) -> Result<CmdSpec> {
        let step = format!("pg_dump -U {} -d {}", sh_quote(&p.user), sh_quote(&p.database));
        Ok(container::exec(
            p.container()?,
            self.script(&[step]),
            Stream::Out(to),
        ))
    }

    fn restore(&self, p: &Profile, from: &Path) -> Result<CmdSpec> {
        let step = format!("psql -U {} -d {}", sh_quote(&p.user), sh_quote(&p.database));
        Ok(container::exec(
            p.container()?,
            self.script(&[step]),
            Stream::In(from),
        ))
    }

    fn clean(&self, p: &Profile) -> Result<Vec<CmdSpec>> {
        let user = sh_quote(&p.user);
        let db = sh_quote(&p.database);
        let steps = [
            format!("dropdb -U {user} --if-exists {db}"),
            format!("createdb -U {user} {db}"),
        ];
        Ok(vec![container::exec(
            p.container()?,
            self.script(&steps),
            Stream::None,
        )])
    }
}
