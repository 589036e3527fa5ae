use std::io;

use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select, console::Term, theme::ColorfulTheme};

pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Separator(String),
    Item(String),
}

#[derive(Default, Clone, Copy)]
pub struct InputOpts<'a> {
    pub default: Option<&'a str>,
    pub allow_empty: bool,
    pub validate: Option<Validator<'a>>,
}

pub trait Prompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>>;

    fn select_menu(&self, prompt: &str, entries: &[MenuEntry]) -> Result<Option<usize>>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>>;

    fn input(&self, prompt: &str, opts: InputOpts<'_>) -> Result<Option<String>>;

    // Not echoed.
    fn password(&self, prompt: &str, allow_empty: bool) -> Result<Option<String>>;
}

#[derive(Default)]
pub struct TermPrompter {
    theme: ColorfulTheme,
}

impl TermPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

fn cancellable<T>(r: Result<T, dialoguer::Error>) -> Result<Option<T>> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => {
            let _ = Term::stderr().show_cursor();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn flatten<T>(r: Result<Option<Option<T>>>) -> Result<Option<T>> {
    r.map(Option::flatten)
}

impl Prompter for TermPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>> {
        flatten(cancellable(
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(items)
                .default(default.min(items.len().saturating_sub(1)))
                .interact_opt(),
        ))
    }

    fn select_menu(&self, prompt: &str, entries: &[MenuEntry]) -> Result<Option<usize>> {
        let labels: Vec<&str> = entries
            .iter()
            .map(|e| match e {
                MenuEntry::Separator(s) | MenuEntry::Item(s) => s.as_str(),
            })
            .collect();
        let first_item = |from: usize| {
            (from..entries.len())
                .chain(0..from)
                .find(|&i| matches!(entries[i], MenuEntry::Item(_)))
                .unwrap_or(0)
        };
        let mut cursor = first_item(0);
        loop {
            let picked = flatten(cancellable(
                Select::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .items(&labels)
                    .default(cursor)
                    .interact_opt(),
            ))?;
            match picked {
                None => return Ok(None),
                Some(i) if matches!(entries[i], MenuEntry::Item(_)) => return Ok(Some(i)),
                // Headers are not actions; land on the entry after it.
                Some(i) => cursor = first_item(i),
            }
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>> {
        flatten(cancellable(
            Confirm::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default)
                .interact_opt(),
        ))
    }

    fn input(&self, prompt: &str, opts: InputOpts<'_>) -> Result<Option<String>> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(opts.allow_empty);
        if let Some(d) = opts.default {
            input = input.default(d.to_string());
        }
        if let Some(validate) = opts.validate {
            input = input.validate_with(move |s: &String| validate(s));
        }
        cancellable(input.interact_text())
    }

    fn password(&self, prompt: &str, allow_empty: bool) -> Result<Option<String>> {
        cancellable(
            Password::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty_password(allow_empty)
                .interact(),
        )
    }
}

#[cfg(test)]
pub mod testing {
    use std::{cell::RefCell, collections::VecDeque};

    use anyhow::{Result, bail};

    use super::{InputOpts, MenuEntry, Prompter};

    #[derive(Debug, Clone)]
    pub enum Answer {
        Pick(&'static str),
        Index(usize),
        Confirm(bool),
        Text(&'static str),
        Cancel,
    }

    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: RefCell<VecDeque<Answer>>,
        pub asked: RefCell<Vec<String>>,
        pub rejected: RefCell<Vec<String>>,
        pub menus: RefCell<Vec<Vec<MenuEntry>>>,
        pub secrets: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: RefCell::new(answers.into_iter().collect()),
                ..Default::default()
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.borrow().len()
        }

        fn next(&self, prompt: &str) -> Result<Answer> {
            self.asked.borrow_mut().push(prompt.to_string());
            match self.answers.borrow_mut().pop_front() {
                Some(a) => Ok(a),
                None => bail!("script exhausted at prompt: {prompt}"),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn select(&self, prompt: &str, items: &[String], _default: usize) -> Result<Option<usize>> {
            match self.next(prompt)? {
                Answer::Cancel => Ok(None),
                Answer::Index(i) if i < items.len() => Ok(Some(i)),
                Answer::Pick(label) => match items.iter().position(|i| i == label) {
                    Some(i) => Ok(Some(i)),
                    None => bail!("'{label}' not among {items:?}"),
                },
                other => bail!("expected a pick for '{prompt}', got {other:?}"),
            }
        }

        fn select_menu(&self, prompt: &str, entries: &[MenuEntry]) -> Result<Option<usize>> {
            self.menus.borrow_mut().push(entries.to_vec());
            match self.next(prompt)? {
                Answer::Cancel => Ok(None),
                Answer::Pick(label) => entries
                    .iter()
                    .position(|e| matches!(e, MenuEntry::Item(s) if s.starts_with(label)))
                    .map(Some)
                    .ok_or_else(|| anyhow::anyhow!("no menu item starting with '{label}'")),
                other => bail!("expected a menu pick, got {other:?}"),
            }
        }

        fn confirm(&self, prompt: &str, _default: bool) -> Result<Option<bool>> {
            match self.next(prompt)? {
                Answer::Cancel => Ok(None),
                Answer::Confirm(b) => Ok(Some(b)),
                other => bail!("expected a confirmation for '{prompt}', got {other:?}"),
            }
        }

        fn input(&self, prompt: &str, opts: InputOpts<'_>) -> Result<Option<String>> {
            loop {
                let text = match self.next(prompt)? {
                    Answer::Cancel => return Ok(None),
                    Answer::Text(t) => t,
                    other => bail!("expected text for '{prompt}', got {other:?}"),
                };
                let value = match (text.is_empty(), opts.default) {
                    (true, Some(d)) => d.to_string(),
                    _ => text.to_string(),
                };
                if value.is_empty() && !opts.allow_empty {
                    self.rejected.borrow_mut().push(prompt.to_string());
                    continue;
                }
                if let Some(validate) = opts.validate
                    && let Err(msg) = validate(&value)
                {
                    self.rejected.borrow_mut().push(msg);
                    continue;
                }
                return Ok(Some(value));
            }
        }

        fn password(&self, prompt: &str, allow_empty: bool) -> Result<Option<String>> {
            self.secrets.borrow_mut().push(prompt.to_string());
            self.input(
                prompt,
                InputOpts {
                    allow_empty,
                    ..Default::default()
                },
            )
        }
    }
}
