use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing as log;

use crate::{
    AppCtx,
    error::AppError,
    profile::{DatabaseType, Profile, ProfileDocument, validate_id},
    prompt::InputOpts,
    ui,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Cancelled,
}

const CURRENT_MARKER: &str = " (current configuration)";

pub fn init_config(ctx: &AppCtx<'_>) -> Result<()> {
    if ctx.store.exists() {
        let go = ctx.prompter.confirm(
            "WARNING: This will overwrite your configuration file which is not empty. Do you want to continue?",
            false,
        )?;
        if go != Some(true) {
            return Ok(());
        }
    }
    ctx.store.init()?;
    log::info!("initialized {}", ctx.store.path().display());
    Ok(())
}

fn pick(ctx: &AppCtx<'_>, doc: &ProfileDocument, question: &str) -> Result<Option<String>> {
    let ids = doc.list_other_ids();
    let active = doc.active_id();
    let items: Vec<String> = ids
        .iter()
        .map(|id| {
            if Some(*id) == active {
                format!("{id}{CURRENT_MARKER}")
            } else {
                id.to_string()
            }
        })
        .collect();
    let default = ids.iter().position(|id| Some(*id) == active).unwrap_or(0);
    Ok(ctx
        .prompter
        .select(question, &items, default)?
        .map(|i| ids[i].to_string()))
}

fn recover_empty(ctx: &AppCtx<'_>) -> Result<Outcome> {
    log::error!("{}", AppError::EmptyCatalog);
    add_config(ctx)
}

pub fn change_config(ctx: &AppCtx<'_>) -> Result<Outcome> {
    let mut doc = ctx.store.load()?;
    if doc.is_empty() {
        return recover_empty(ctx);
    }
    let Some(id) = pick(ctx, &doc, "What configuration do you want to use?")? else {
        return Ok(Outcome::Cancelled);
    };
    doc.set_active(&id)?;
    ctx.store.save(&doc)?;
    log::info!("now using configuration {id}");
    Ok(Outcome::Done)
}

pub fn show_all(ctx: &AppCtx<'_>) -> Result<()> {
    let doc = ctx.store.load()?;
    ui::log_profiles(doc.profiles(), doc.active_id());
    Ok(())
}

pub fn show_current(p: &Profile) {
    ui::log_profile(p);
}

pub fn add_config(ctx: &AppCtx<'_>) -> Result<Outcome> {
    let mut doc = ctx.store.load()?;
    let Some(profile) = profile_form(ctx, &doc, None)? else {
        return Ok(Outcome::Cancelled);
    };
    let id = profile.id.clone();
    doc.add(profile)?;
    ctx.store.save(&doc)?;
    log::info!("added configuration {id}");
    Ok(Outcome::Done)
}

pub fn edit_config(ctx: &AppCtx<'_>) -> Result<()> {
    let mut doc = ctx.store.load()?;
    if doc.is_empty() {
        recover_empty(ctx)?;
        return Ok(());
    }
    let Some(id) = pick(ctx, &doc, "What configuration do you want to edit?")? else {
        return Ok(());
    };
    let Some(current) = doc.get(&id).cloned() else {
        return Ok(());
    };
    let Some(edited) = profile_form(ctx, &doc, Some(&current))? else {
        return Ok(());
    };
    let new_id = edited.id.clone();
    doc.edit(&id, edited)?;
    ctx.store.save(&doc)?;
    if new_id == id {
        log::info!("updated configuration {id}");
    } else {
        log::info!("renamed configuration {id} to {new_id}");
    }
    Ok(())
}

pub fn remove_config(ctx: &AppCtx<'_>) -> Result<()> {
    let mut doc = ctx.store.load()?;
    if doc.is_empty() {
        recover_empty(ctx)?;
        return Ok(());
    }
    let Some(id) = pick(ctx, &doc, "What configuration do you want to remove?")? else {
        return Ok(());
    };
    doc.remove(&id)?;
    ctx.store.save(&doc)?;
    log::info!("removed configuration {id}");
    Ok(())
}

fn required(s: &str) -> Result<(), String> {
    if s.trim().is_empty() {
        Err("A value is required".into())
    } else {
        Ok(())
    }
}

fn existing_dir(s: &str) -> Result<(), String> {
    if Path::new(s.trim()).is_dir() {
        Ok(())
    } else {
        Err("Directory does not exist".into())
    }
}

fn profile_form(
    ctx: &AppCtx<'_>,
    doc: &ProfileDocument,
    current: Option<&Profile>,
) -> Result<Option<Profile>> {
    let ask = ctx.prompter;
    let original_id = current.map(|p| p.id.as_str());

    let key_check = |s: &str| -> Result<(), String> {
        let s = s.trim();
        validate_id(s).map_err(|e| e.to_string())?;
        if Some(s) != original_id && doc.get(s).is_some() {
            return Err(format!("configuration '{s}' already exists"));
        }
        Ok(())
    };
    let Some(id) = ask.input(
        "Configuration key:",
        InputOpts {
            default: original_id,
            validate: Some(&key_check),
            ..Default::default()
        },
    )?
    else {
        return Ok(None);
    };

    let Some(database) = ask.input(
        "Database:",
        InputOpts {
            default: current.map(|p| p.database.as_str()),
            validate: Some(&required),
            ..Default::default()
        },
    )?
    else {
        return Ok(None);
    };

    let types: Vec<String> = DatabaseType::ALL.iter().map(|t| t.to_string()).collect();
    let type_default = current
        .and_then(|p| DatabaseType::ALL.iter().position(|t| *t == p.db_type))
        .unwrap_or(0);
    let Some(type_idx) = ask.select("Database type:", &types, type_default)? else {
        return Ok(None);
    };

    let folder_default = current.map(|p| p.dump_folder.to_string_lossy().into_owned());
    let Some(dump_folder) = ask.input(
        "Dump folder:",
        InputOpts {
            default: folder_default.as_deref(),
            validate: Some(&existing_dir),
            ..Default::default()
        },
    )?
    else {
        return Ok(None);
    };

    let Some(user) = ask.input(
        "Database user:",
        InputOpts {
            default: current.map(|p| p.user.as_str()),
            validate: Some(&required),
            ..Default::default()
        },
    )?
    else {
        return Ok(None);
    };

    // Blank keeps the stored password when editing.
    let Some(password) = ask.password("Database password:", true)? else {
        return Ok(None);
    };
    let password = match current {
        Some(p) if password.is_empty() => p.password.clone(),
        _ => password,
    };

    let was_container = current.is_some_and(|p| p.containerized);
    let Some(containerized) = ask.confirm("Is this a docker configuration", was_container)? else {
        return Ok(None);
    };

    let (container_name, container_port) = if containerized {
        let Some(name) = ask.input(
            "What is the docker container's name?",
            InputOpts {
                default: current.and_then(|p| p.container_name.as_deref()),
                validate: Some(&required),
                ..Default::default()
            },
        )?
        else {
            return Ok(None);
        };
        let Some(port) = ask.input(
            "On what port is the docker container running?",
            InputOpts {
                default: current.and_then(|p| p.container_port.as_deref()),
                allow_empty: true,
                ..Default::default()
            },
        )?
        else {
            return Ok(None);
        };
        let port = port.trim();
        (
            Some(name.trim().to_string()),
            (!port.is_empty()).then(|| port.to_string()),
        )
    } else {
        (None, None)
    };

    Ok(Some(Profile {
        id: id.trim().to_string(),
        database: database.trim().to_string(),
        dump_folder: PathBuf::from(dump_folder.trim()),
        user: user.trim().to_string(),
        password,
        db_type: DatabaseType::ALL[type_idx],
        containerized,
        container_name,
        container_port,
    }))
}
