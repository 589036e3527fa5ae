use anyhow::Result;

use crate::{AppCtx, profile::Profile, prompt::MenuEntry};

pub mod database;
pub mod menu;
pub mod profiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionGroup {
    Database,
    Configuration,
    Other,
}

impl ActionGroup {
    pub const ALL: [ActionGroup; 3] = [
        ActionGroup::Database,
        ActionGroup::Configuration,
        ActionGroup::Other,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ActionGroup::Database => "Database actions",
            ActionGroup::Configuration => "Configuration actions",
            ActionGroup::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RestoreDump,
    CreateDump,
    CleanDatabase,
    ListDumps,
    InitConfig,
    ChangeConfig,
    ShowAllConfigs,
    ShowCurrentConfig,
    AddConfig,
    EditConfig,
    RemoveConfig,
    Exit,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::RestoreDump,
        Action::CreateDump,
        Action::CleanDatabase,
        Action::ListDumps,
        Action::InitConfig,
        Action::ChangeConfig,
        Action::ShowAllConfigs,
        Action::ShowCurrentConfig,
        Action::AddConfig,
        Action::EditConfig,
        Action::RemoveConfig,
        Action::Exit,
    ];

    pub fn group(self) -> ActionGroup {
        match self {
            Action::RestoreDump
            | Action::CreateDump
            | Action::CleanDatabase
            | Action::ListDumps => ActionGroup::Database,
            Action::InitConfig
            | Action::ChangeConfig
            | Action::ShowAllConfigs
            | Action::ShowCurrentConfig
            | Action::AddConfig
            | Action::EditConfig
            | Action::RemoveConfig => ActionGroup::Configuration,
            Action::Exit => ActionGroup::Other,
        }
    }

    pub fn label(self, p: &Profile) -> String {
        match self {
            Action::RestoreDump => "Restore a dump".into(),
            Action::CreateDump => format!("Create a dump from {}", p.database),
            Action::CleanDatabase => format!("Make {} empty.", p.database),
            Action::ListDumps => format!("List all dumps in {}", p.dump_folder.display()),
            Action::InitConfig => "Initialize the configuration file".into(),
            Action::ChangeConfig => "Change the current configuration".into(),
            Action::ShowAllConfigs => "Show all configurations".into(),
            Action::ShowCurrentConfig => "Show current configuration".into(),
            Action::AddConfig => "Add a configuration".into(),
            Action::EditConfig => "Edit a configuration".into(),
            Action::RemoveConfig => "Remove a configuration".into(),
            Action::Exit => "Exit".into(),
        }
    }
}

pub struct Menu {
    pub entries: Vec<MenuEntry>,
    actions: Vec<Option<Action>>,
}

impl Menu {
    pub fn for_profile(p: &Profile) -> Self {
        let mut entries = Vec::with_capacity(Action::ALL.len() + 2 * ActionGroup::ALL.len());
        let mut actions = Vec::with_capacity(entries.capacity());
        for group in ActionGroup::ALL {
            entries.push(MenuEntry::Separator(format!(
                "{0} {1} {0}",
                "-".repeat(7),
                group.title()
            )));
            actions.push(None);
            for action in Action::ALL.into_iter().filter(|a| a.group() == group) {
                entries.push(MenuEntry::Item(action.label(p)));
                actions.push(Some(action));
            }
            entries.push(MenuEntry::Separator(" ".into()));
            actions.push(None);
        }
        Self { entries, actions }
    }

    pub fn action_at(&self, idx: usize) -> Option<Action> {
        self.actions.get(idx).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn dispatch(ctx: &AppCtx<'_>, action: Action, p: &Profile) -> Result<Flow> {
    match action {
        Action::RestoreDump => database::restore_dump(ctx, p)?,
        Action::CreateDump => database::create_dump(ctx, p)?,
        Action::CleanDatabase => database::clean_database(ctx, p)?,
        Action::ListDumps => database::list_dumps(p)?,
        Action::InitConfig => profiles::init_config(ctx)?,
        Action::ChangeConfig => {
            profiles::change_config(ctx)?;
        }
        Action::ShowAllConfigs => profiles::show_all(ctx)?,
        Action::ShowCurrentConfig => profiles::show_current(p),
        Action::AddConfig => {
            profiles::add_config(ctx)?;
        }
        Action::EditConfig => profiles::edit_config(ctx)?,
        Action::RemoveConfig => profiles::remove_config(ctx)?,
        Action::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}
