use std::path::Path;

use anyhow::Result;

use super::{
    EnginePort,
    container::{self, Stream},
};
use crate::{
    profile::Profile,
    utils::process::{CmdSpec, StdioSpec, sh_quote},
};

pub struct MysqlCli;

impl MysqlCli {
    fn client(bin: &str, p: &Profile) -> CmdSpec {
        CmdSpec::new(bin)
            .args(["-u", p.user.as_str()])
            .secret_arg("-p", p.password.as_str())
    }
}

impl EnginePort for MysqlCli {
    fn dump(&self, p: &Profile, to: &Path) -> Result<CmdSpec> {
        Ok(Self::client("mysqldump", p)
            .arg(p.database.as_str())
            .stdout(StdioSpec::WriteTo(to.to_path_buf())))
    }

    fn restore(&self, p: &Profile, from: &Path) -> Result<CmdSpec> {
        Ok(Self::client("mysql", p)
            .arg(p.database.as_str())
            .stdin(StdioSpec::ReadFrom(from.to_path_buf())))
    }

    fn clean(&self, p: &Profile) -> Result<Vec<CmdSpec>> {
        Ok(vec![
            Self::client("mysqladmin", p).args(["drop", p.database.as_str()]),
            Self::client("mysqladmin", p).args(["create", p.database.as_str()]),
        ])
    }
}

pub struct MysqlInContainer<'a> {
    password_env: &'a str,
}

impl<'a> MysqlInContainer<'a> {
    pub fn new(password_env: &'a str) -> Self {
        Self { password_env }
    }

    fn script(&self, bin: &str, tail: &str) -> String {
        format!(
            "exec {bin} -uroot -p{} {tail}",
            container::env_ref(self.password_env)
        )
    }
}

impl EnginePort for MysqlInContainer<'_> {
    fn dump(&self, p: &Profile, to: &Path) -> Result<CmdSpec> {
        let script = self.script("mysqldump", &sh_quote(&p.database));
        Ok(container::exec(p.container()?, script, Stream::Out(to)))
    }

    fn restore(&self, p: &Profile, from: &Path) -> Result<CmdSpec> {
        let script = self.script("mysql", &sh_quote(&p.database));
        Ok(container::exec(p.container()?, script, Stream::In(from)))
    }

    fn clean(&self, p: &Profile) -> Result<Vec<CmdSpec>> {
        let name = p.container()?;
        let db = sh_quote(&p.database);
        Ok(vec![
            container::exec(
                name,
                self.script("mysqladmin", &format!("-f drop {db}")),
                Stream::None,
            ),
            container::exec(
                name,
                self.script("mysqladmin", &format!("create {db}")),
                Stream::None,
            ),
        ])
    }
}
