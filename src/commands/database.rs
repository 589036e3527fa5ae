use std::fs;

use anyhow::{Context, Result};
use tracing as log;

use crate::{
    AppCtx,
    dumps::get_dumps,
    profile::Profile,
    prompt::InputOpts,
    tooling::{self, DbAction},
    ui,
    utils::{
        naming::{dump_path, dump_suffix, validate_dump_name},
        time::today,
    },
};

fn confirm_drop(ctx: &AppCtx<'_>, p: &Profile) -> Result<bool> {
    let answer = ctx
        .prompter
        .confirm(&format!("Are you sure you want to drop the {}", p.database), false)?;
    Ok(answer == Some(true))
}

pub fn restore_dump(ctx: &AppCtx<'_>, p: &Profile) -> Result<()> {
    let dumps = get_dumps(&p.dump_folder)?;
    if dumps.is_empty() {
        log::error!("No dumps found in '{}'", p.dump_folder.display());
        return Ok(());
    }

    let items: Vec<String> = dumps
        .iter()
        .map(|d| format!("{} {}", d.created_display(), d.name))
        .collect();
    let Some(idx) = ctx.prompter.select(
        "What dump would you like to restore?",
        &items,
        items.len() - 1,
    )?
    else {
        return Ok(());
    };
    let dump = &dumps[idx];

    if !confirm_drop(ctx, p)? {
        log::info!("restore aborted, {} left untouched", p.database);
        return Ok(());
    }

    let plan = tooling::build(DbAction::RestoreDump { from: &dump.path }, p, &ctx.settings.container)?;
    let Some((load, clean)) = plan.split_last() else {
        return Ok(());
    };
    ctx.runner.preflight(&plan)?;

    println!("Cleaning the current database...");
    ctx.runner.run_all(clean).context("clean before restore")?;

    println!("This can take a while depending on the size of the dump...");
    ctx.runner
        .run(load)
        .with_context(|| format!("restore {}", dump.name))?;
    log::info!("restored {} into {}", dump.name, p.database);
    Ok(())
}

pub fn create_dump(ctx: &AppCtx<'_>, p: &Profile) -> Result<()> {
    let date = today();
    let suffix = dump_suffix(date)?;
    let validate = |s: &str| validate_dump_name(s.trim()).map_err(|e| e.to_string());
    let Some(name) = ctx.prompter.input(
        &format!(
            "Name of the dump (will automatically be affixed by the current date and extension '{suffix}')"
        ),
        InputOpts {
            validate: Some(&validate),
            ..Default::default()
        },
    )?
    else {
        return Ok(());
    };

    let target = dump_path(&p.dump_folder, name.trim(), date)?;
    let plan = tooling::build(DbAction::CreateDump { to: &target }, p, &ctx.settings.container)?;
    ctx.runner.preflight(&plan)?;

    if let Err(e) = ctx.runner.run_all(&plan) {
        if target.exists() {
            match fs::remove_file(&target) {
                Ok(()) => log::warn!("removed partial dump {}", target.display()),
                Err(rm) => log::warn!("could not remove partial dump {}: {rm}", target.display()),
            }
        }
        return Err(e.context(format!("dump {} failed", p.database)));
    }
    log::info!("dump written to {}", target.display());
    Ok(())
}

pub fn clean_database(ctx: &AppCtx<'_>, p: &Profile) -> Result<()> {
    if !confirm_drop(ctx, p)? {
        return Ok(());
    }
    let plan = tooling::build(DbAction::Clean, p, &ctx.settings.container)?;
    ctx.runner.run_all(&plan)?;
    log::info!("{} is now empty", p.database);
    Ok(())
}

pub fn list_dumps(p: &Profile) -> Result<()> {
    let dumps = get_dumps(&p.dump_folder)?;
    ui::log_dumps(&p.dump_folder.display().to_string(), &dumps);
    Ok(())
}
