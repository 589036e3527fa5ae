use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};

use crate::utils::{naming::is_dump, time::fmt_created};

#[derive(Debug, Clone)]
pub struct Dump {
    pub name: String,
    pub path: PathBuf,
    pub created: SystemTime,
}

impl Dump {
    pub fn created_display(&self) -> String {
        fmt_created(self.created).unwrap_or_else(|_| "?".into())
    }
}

pub fn get_dumps(folder: &Path) -> Result<Vec<Dump>> {
    let entries =
        fs::read_dir(folder).with_context(|| format!("list dumps in {}", folder.display()))?;

    let mut dumps = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", folder.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_dump(&name) {
            continue;
        }
        let meta = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if !meta.is_file() {
            continue;
        }
        dumps.push(Dump {
            name,
            path: entry.path(),
            created: created_at(&meta),
        });
    }
    dumps.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
    Ok(dumps)
}

#[cfg(unix)]
fn created_at(meta: &fs::Metadata) -> SystemTime {
    use std::{os::unix::fs::MetadataExt, time::Duration};
    match (u64::try_from(meta.ctime()), u32::try_from(meta.ctime_nsec())) {
        (Ok(secs), Ok(nanos)) => UNIX_EPOCH + Duration::new(secs, nanos),
        _ => UNIX_EPOCH,
    }
}

#[cfg(not(unix))]
fn created_at(meta: &fs::Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(UNIX_EPOCH)
}
