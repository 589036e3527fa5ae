use dialoguer::console::style;
use prettytable::{Cell, Row, Table};
use tracing as log;

use crate::{dumps::Dump, profile::Profile};

const MASK: &str = "********";

pub fn print_current(id: &str) {
    println!();
    println!("Current configuration: {}", style(id).red().bold());
}

pub fn log_dumps(folder: &str, dumps: &[Dump]) {
    if dumps.is_empty() {
        log::info!("<no dumps in {folder}>");
        return;
    }
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("Created"), Cell::new("Dump")]));
    for d in dumps {
        table.add_row(Row::new(vec![
            Cell::new(&d.created_display()),
            Cell::new(&d.name),
        ]));
    }
    table.printstd();
}

fn profile_rows(p: &Profile) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("database", p.database.clone()),
        ("dumpFolder", p.dump_folder.display().to_string()),
        ("databaseUser", p.user.clone()),
        ("databasePassword", MASK.to_string()),
        ("databaseType", p.db_type.to_string()),
        ("isDocker", p.containerized.to_string()),
    ];
    if p.containerized {
        rows.push((
            "dockerPort",
            p.container_port.clone().unwrap_or_else(|| "<none>".into()),
        ));
        rows.push((
            "dockerContainerName",
            p.container_name.clone().unwrap_or_else(|| "<none>".into()),
        ));
    }
    rows
}

pub fn log_profile(p: &Profile) {
    println!();
    println!("{}", style(format!("Using configuration: {}", p.id)).blue().bold());
    let mut table = Table::new();
    for (k, v) in profile_rows(p) {
        table.add_row(Row::new(vec![Cell::new(k), Cell::new(&v)]));
    }
    table.printstd();
}

pub fn log_profiles(profiles: &[Profile], active: Option<&str>) {
    if profiles.is_empty() {
        log::info!("<no configurations>");
        return;
    }
    for p in profiles {
        let marker = if Some(p.id.as_str()) == active {
            " (current configuration)"
        } else {
            ""
        };
        println!(
            "{}",
            style(format!("Configuration: {}{marker}", p.id)).blue().bold()
        );
        let mut table = Table::new();
        for (k, v) in profile_rows(p) {
            table.add_row(Row::new(vec![Cell::new(k), Cell::new(&v)]));
        }
        table.printstd();
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::fixtures::{mysql, postgres_in_container};

    #[test]
    fn rows_mask_password() {
        let rows = profile_rows(&mysql("a"));
        assert!(rows.iter().all(|(_, v)| v != "hunter2"));
        assert!(rows.iter().any(|(k, v)| *k == "databasePassword" && v == MASK));
    }

    #[test]
    fn container_rows_only_for_containerized() {
        assert_eq!(profile_rows(&mysql("a")).len(), 6);
        let rows = profile_rows(&postgres_in_container("pg"));
        assert!(rows.contains(&("dockerContainerName", "pg_main".to_string())));
        assert!(rows.contains(&("dockerPort", "5432".to_string())));
    }
}
