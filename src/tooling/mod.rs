use std::path::Path;

use anyhow::Result;

use crate::{
    profile::{DatabaseType, Profile},
    settings::ContainerEnv,
    utils::process::CmdSpec,
};

pub mod container;
pub mod mysql;
pub mod postgres;

pub use mysql::{MysqlCli, MysqlInContainer};
pub use postgres::{PostgresCli, PostgresInContainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbAction<'a> {
    CreateDump { to: &'a Path },
    RestoreDump { from: &'a Path },
    Clean,
}

pub trait EnginePort {
    fn dump(&self, p: &Profile, to: &Path) -> Result<CmdSpec>;
    fn restore(&self, p: &Profile, from: &Path) -> Result<CmdSpec>;
    fn clean(&self, p: &Profile) -> Result<Vec<CmdSpec>>;
}

pub fn engine_for<'a>(p: &Profile, env: &'a ContainerEnv) -> Box<dyn EnginePort + 'a> {
    match (p.db_type, p.containerized) {
        (DatabaseType::Mysql, false) => Box::new(MysqlCli),
        (DatabaseType::Mysql, true) => Box::new(MysqlInContainer::new(&env.mysql_password_env)),
        (DatabaseType::Postgres, false) => Box::new(PostgresCli),
        (DatabaseType::Postgres, true) => {
            Box::new(PostgresInContainer::new(&env.postgres_password_env))
        }
    }
}

pub fn build(action: DbAction<'_>, p: &Profile, env: &ContainerEnv) -> Result<Vec<CmdSpec>> {
    let engine = engine_for(p, env);
    match action {
        DbAction::CreateDump { to } => Ok(vec![engine.dump(p, to)?]),
        DbAction::RestoreDump { from } => {
            let mut plan = engine.clean(p)?;
            plan.push(engine.restore(p, from)?);
            Ok(plan)
        }
        DbAction::Clean => engine.clean(p),
    }
}
