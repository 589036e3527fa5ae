use anyhow::Result;
use tracing as log;

use crate::{
    AppCtx,
    commands::{
        Action, Flow, Menu, dispatch,
        profiles::{Outcome, change_config},
    },
    error::AppError,
    profile::{Profile, Resolution},
    ui,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    Loading,
    SelectingProfile,
    Ready(Profile),
    Executing(Action, Profile),
    Exiting,
}

pub fn run(ctx: &AppCtx<'_>) -> Result<()> {
    let mut state = MenuState::Loading;
    while state != MenuState::Exiting {
        state = step(ctx, state)?;
    }
    Ok(())
}

pub fn step(ctx: &AppCtx<'_>, state: MenuState) -> Result<MenuState> {
    match state {
        MenuState::Loading => {
            let doc = ctx.store.load()?;
            Ok(match doc.resolve_active() {
                Resolution::Ready(p) => MenuState::Ready(p.clone()),
                Resolution::RequiresSelection(why) => {
                    log::error!("{why}");
                    MenuState::SelectingProfile
                }
            })
        }
        // Without an active profile there is nothing to go back to, so a cancel exits.
        MenuState::SelectingProfile => Ok(match change_config(ctx)? {
            Outcome::Done => MenuState::Loading,
            Outcome::Cancelled => MenuState::Exiting,
        }),
        MenuState::Ready(p) => {
            ui::print_current(&p.id);
            let menu = Menu::for_profile(&p);
            let picked = ctx
                .prompter
                .select_menu("What do you want to do?", &menu.entries)?;
            Ok(match picked.map(|i| menu.action_at(i)) {
                None => MenuState::Exiting,
                Some(Some(action)) => MenuState::Executing(action, p),
                Some(None) => MenuState::Ready(p),
            })
        }
        MenuState::Executing(action, p) => match dispatch(ctx, action, &p) {
            Ok(Flow::Exit) => Ok(MenuState::Exiting),
            Ok(Flow::Continue) => Ok(MenuState::Loading),
            Err(e) if matches!(e.downcast_ref::<AppError>(), Some(AppError::ConfigParse { .. })) => {
                Err(e)
            }
            Err(e) => {
                log::error!("{e:#}");
                Ok(MenuState::Loading)
            }
        },
        MenuState::Exiting => Ok(MenuState::Exiting),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        commands::testing::ctx,
        profile::{
            ProfileDocument, ProfileStore,
            fixtures::{mysql, postgres_in_container},
        },
        prompt::testing::{Answer, ScriptedPrompter},
        utils::process::testing::RecordingRunner,
    };

    fn seed(home: &TempDir, profiles: Vec<Profile>, active: Option<&str>) {
        let mut doc = ProfileDocument::default();
        for p in profiles {
            doc.add(p).unwrap();
        }
        if let Some(a) = active {
            doc.set_active(a).unwrap();
        }
        ProfileStore::new(home.path().join("config.yml"))
            .save(&doc)
            .unwrap();
    }

    #[test]
    fn loading_resolves_active_profile() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a")], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([]);
        let c = ctx(&home, &runner, &prompter);
        assert_eq!(
            step(&c, MenuState::Loading).unwrap(),
            MenuState::Ready(mysql("a"))
        );
    }

    #[test]
    fn removing_the_active_profile_forces_selection() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a"), mysql("b")], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([
            Answer::Pick("Remove a configuration"),
            Answer::Pick("a (current configuration)"),
        ]);
        let c = ctx(&home, &runner, &prompter);

        let mut state = step(&c, MenuState::Loading).unwrap();
        state = step(&c, state).unwrap();
        assert_eq!(
            state,
            MenuState::Executing(Action::RemoveConfig, mysql("a"))
        );
        state = step(&c, state).unwrap();
        assert_eq!(state, MenuState::Loading);
        assert_eq!(step(&c, state).unwrap(), MenuState::SelectingProfile);
    }

    #[test]
    fn unset_pointer_selects_then_resumes() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a"), postgres_in_container("pg")], None);
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([Answer::Pick("pg")]);
        let c = ctx(&home, &runner, &prompter);

        let state = step(&c, MenuState::Loading).unwrap();
        assert_eq!(state, MenuState::SelectingProfile);
        let state = step(&c, state).unwrap();
        assert_eq!(state, MenuState::Loading);
        assert_eq!(
            step(&c, state).unwrap(),
            MenuState::Ready(postgres_in_container("pg"))
        );
    }

    #[test]
    fn cancelling_forced_selection_exits() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a")], Some("gone"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([Answer::Cancel]);
        let c = ctx(&home, &runner, &prompter);
        run(&c).unwrap();
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn cancelling_the_menu_exits() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a")], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([Answer::Cancel]);
        let c = ctx(&home, &runner, &prompter);
        assert_eq!(
            step(&c, MenuState::Ready(mysql("a"))).unwrap(),
            MenuState::Exiting
        );
    }

    #[test]
    fn cancelling_change_from_menu_returns_to_menu() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a"), mysql("b")], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([
            Answer::Pick("Change the current configuration"),
            Answer::Cancel,
            Answer::Pick("Exit"),
        ]);
        let c = ctx(&home, &runner, &prompter);
        run(&c).unwrap();
        assert_eq!(prompter.menus.borrow().len(), 2);
    }

    #[test]
    fn failed_action_is_logged_and_loop_continues() {
        let home = TempDir::new().unwrap();
        let mut p = mysql("a");
        p.dump_folder = home.path().join("missing");
        seed(&home, vec![p.clone()], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([]);
        let c = ctx(&home, &runner, &prompter);
        assert_eq!(
            step(&c, MenuState::Executing(Action::ListDumps, p)).unwrap(),
            MenuState::Loading
        );
    }

    #[test]
    fn parse_error_ends_the_loop() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.yml"), "configToUse: [oops").unwrap();
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([]);
        let c = ctx(&home, &runner, &prompter);
        let err = run(&c).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::ConfigParse { .. })
        ));
    }

    #[test]
    fn menu_shows_grouped_actions_for_current_profile() {
        let home = TempDir::new().unwrap();
        seed(&home, vec![mysql("a")], Some("a"));
        let runner = RecordingRunner::default();
        let prompter = ScriptedPrompter::new([Answer::Pick("Exit")]);
        let c = ctx(&home, &runner, &prompter);
        run(&c).unwrap();
        let menus = prompter.menus.borrow();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0], Menu::for_profile(&mysql("a")).entries);
    }
}
