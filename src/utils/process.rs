use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

use anyhow::{Context, Result};
use tracing as log;

use crate::{
    error::AppError,
    utils::bins::{ensure_bins, which},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvValue {
    Plain(String),
    Secret(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Plain(String),
    /// Rendered as `{flag}<redacted>`, passed as `{flag}{value}`.
    Secret { flag: String, value: String },
}

impl ArgValue {
    fn expose(&self) -> String {
        match self {
            ArgValue::Plain(s) => s.clone(),
            ArgValue::Secret { flag, value } => format!("{flag}{value}"),
        }
    }

    fn render(&self) -> String {
        match self {
            ArgValue::Plain(s) => sh_quote(s),
            ArgValue::Secret { flag, .. } => format!("{flag}<redacted>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StdioSpec {
    Inherit,
    ReadFrom(PathBuf),
    WriteTo(PathBuf),
}

impl StdioSpec {
    fn to_stdio(&self) -> Result<Stdio> {
        Ok(match self {
            StdioSpec::Inherit => Stdio::inherit(),
            StdioSpec::ReadFrom(p) => Stdio::from(
                File::open(p).with_context(|| format!("open {} for reading", p.display()))?,
            ),
            StdioSpec::WriteTo(p) => Stdio::from(
                File::create(p).with_context(|| format!("create {}", p.display()))?,
            ),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmdSpec {
    program: String,
    args: Vec<ArgValue>,
    envs: Vec<(String, EnvValue)>,
    stdin: StdioSpec,
    stdout: StdioSpec,
}

impl CmdSpec {
    #[must_use]
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            stdin: StdioSpec::Inherit,
            stdout: StdioSpec::Inherit,
        }
    }

    #[must_use]
    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(ArgValue::Plain(a.into()));
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, it: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(it.into_iter().map(|a| ArgValue::Plain(a.into())));
        self
    }

    #[must_use]
    pub fn secret_arg(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push(ArgValue::Secret {
            flag: flag.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn env(mut self, k: impl Into<String>, v: EnvValue) -> Self {
        self.envs.push((k.into(), v));
        self
    }

    #[must_use]
    pub fn stdin(mut self, s: StdioSpec) -> Self {
        self.stdin = s;
        self
    }

    #[must_use]
    pub fn stdout(mut self, s: StdioSpec) -> Self {
        self.stdout = s;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> Vec<String> {
        self.args.iter().map(ArgValue::expose).collect()
    }

    pub fn envs(&self) -> &[(String, EnvValue)] {
        &self.envs
    }

    pub fn stdin_spec(&self) -> &StdioSpec {
        &self.stdin
    }

    pub fn stdout_spec(&self) -> &StdioSpec {
        &self.stdout
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.envs {
            match v {
                EnvValue::Plain(val) => out.push_str(&format!("{k}={} ", sh_quote(val))),
                EnvValue::Secret(_) => out.push_str(&format!("{k}=<redacted> ")),
            }
        }
        out.push_str(&sh_quote(&self.program));
        for a in &self.args {
            out.push(' ');
            out.push_str(&a.render());
        }
        if let StdioSpec::ReadFrom(p) = &self.stdin {
            out.push_str(&format!(" < {}", sh_quote(&p.display().to_string())));
        }
        if let StdioSpec::WriteTo(p) = &self.stdout {
            out.push_str(&format!(" > {}", sh_quote(&p.display().to_string())));
        }
        out
    }

    fn to_command(&self, bin: &str) -> Result<Command> {
        let mut cmd = Command::new(bin);
        cmd.args(self.argv());
        for (k, v) in &self.envs {
            match v {
                EnvValue::Plain(val) | EnvValue::Secret(val) => cmd.env(k, val),
            };
        }
        cmd.stdin(self.stdin.to_stdio()?);
        cmd.stdout(self.stdout.to_stdio()?);
        cmd.stderr(Stdio::piped());
        Ok(cmd)
    }
}

pub trait Runner {
    fn run(&self, cmd: &CmdSpec) -> Result<()>;

    fn preflight(&self, _steps: &[CmdSpec]) -> Result<()> {
        Ok(())
    }

    fn run_all(&self, steps: &[CmdSpec]) -> Result<()> {
        self.preflight(steps)?;
        for (i, step) in steps.iter().enumerate() {
            self.run(step)
                .with_context(|| format!("step {}/{}", i + 1, steps.len()))?;
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct ProcessRunner {
    bin_overrides: HashMap<String, String>,
    dry_run: bool,
}

impl ProcessRunner {
    pub fn new(bin_overrides: HashMap<String, String>, dry_run: bool) -> Self {
        Self {
            bin_overrides,
            dry_run,
        }
    }

    fn resolve_bin<'a>(&'a self, bin: &'a str) -> &'a str {
        self.bin_overrides
            .get(bin)
            .map(|s| s.as_str())
            .unwrap_or(bin)
    }
}

impl Runner for ProcessRunner {
    fn preflight(&self, steps: &[CmdSpec]) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        ensure_bins(steps.iter().map(|s| self.resolve_bin(&s.program)))
    }

    fn run(&self, spec: &CmdSpec) -> Result<()> {
        if self.dry_run {
            log::info!("[DRY-RUN] {}", spec.render());
            return Ok(());
        }
        log::debug!("exec: {}", spec.render());

        let bin = self.resolve_bin(&spec.program);
        if which(bin).is_none() {
            return Err(AppError::MissingBinary(bin.to_string()).into());
        }

        let out = spec
            .to_command(bin)?
            .output()
            .with_context(|| format!("spawn {}", spec.render()))?;

        // stderr is captured for the error report but still shown to the operator.
        let _ = std::io::stderr().write_all(&out.stderr);

        if !out.status.success() {
            return Err(AppError::CommandFailed {
                command: spec.render(),
                status: out.status.to_string(),
                stderr: stderr_tail(&out.stderr),
            }
            .into());
        }
        Ok(())
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    const KEEP: usize = 5;
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(KEEP);
    lines[start..].join("\n")
}

pub fn sh_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".into();
    }
    if !s.bytes().any(|b| {
        matches!(
            b,
            b' ' | b'\'' | b'"' | b'\\' | b'$' | b'`' | b';' | b'&' | b'|' | b'<' | b'>' | b'*'
                | b'?' | b'(' | b')' | b'\t' | b'\n'
        )
    }) {
        return s.to_string();
    }
    let mut out = String::from("'");
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;

    use anyhow::{Result, bail};

    use super::{CmdSpec, Runner};

    #[derive(Default)]
    pub struct RecordingRunner {
        pub seen: RefCell<Vec<CmdSpec>>,
        pub fail_at: Option<usize>,
    }

    impl Runner for RecordingRunner {
        fn run(&self, cmd: &CmdSpec) -> Result<()> {
            let idx = self.seen.borrow().len();
            self.seen.borrow_mut().push(cmd.clone());
            if self.fail_at == Some(idx) {
                bail!("simulated failure: {}", cmd.render());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;

    #[test]
    fn sh_quote_empty() {
        assert_eq!(sh_quote(""), "''");
    }

    #[test]
    fn sh_quote_simple() {
        assert_eq!(sh_quote("shop_db"), "shop_db");
    }

    #[test]
    fn sh_quote_with_space() {
        assert_eq!(sh_quote("my db"), "'my db'");
    }

    #[test]
    fn sh_quote_with_single_quote() {
        assert_eq!(sh_quote("don't"), "'don'\\''t'");
    }

    #[test]
    fn sh_quote_dollar() {
        assert_eq!(sh_quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn render_masks_secret_arg_and_env() {
        let cmd = CmdSpec::new("mysqldump")
            .args(["-u", "root"])
            .secret_arg("-p", "hunter2")
            .arg("shop")
            .env("PGPASSWORD", EnvValue::Secret("hunter2".into()))
            .stdout(StdioSpec::WriteTo("/tmp/out.sql".into()));
        let r = cmd.render();
        assert_eq!(
            r,
            "PGPASSWORD=<redacted> mysqldump -u root -p<redacted> shop > /tmp/out.sql"
        );
        assert!(!r.contains("hunter2"));
        assert_eq!(cmd.argv(), vec!["-u", "root", "-phunter2", "shop"]);
    }

    #[test]
    fn render_stdin_redirect() {
        let cmd = CmdSpec::new("psql")
            .args(["-U", "app"])
            .stdin(StdioSpec::ReadFrom("/dumps/a b.sql".into()));
        assert_eq!(cmd.render(), "psql -U app < '/dumps/a b.sql'");
    }

    #[test]
    fn run_all_stops_at_first_failure() {
        let runner = RecordingRunner {
            fail_at: Some(0),
            ..Default::default()
        };
        let steps = vec![CmdSpec::new("dropdb"), CmdSpec::new("createdb")];
        let err = runner.run_all(&steps).unwrap_err();
        assert!(format!("{err:#}").contains("step 1/2"));
        assert_eq!(runner.seen.borrow().len(), 1);
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let runner = ProcessRunner::new(HashMap::new(), true);
        runner
            .run(&CmdSpec::new("definitely-not-a-real-binary-xyz"))
            .unwrap();
    }

    #[test]
    fn missing_binary_is_reported() {
        let runner = ProcessRunner::new(HashMap::new(), false);
        let err = runner
            .run(&CmdSpec::new("definitely-not-a-real-binary-xyz"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::MissingBinary(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_status_and_stderr() {
        let runner = ProcessRunner::new(HashMap::new(), false);
        let err = runner
            .run(&CmdSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .unwrap_err();
        match err.downcast_ref::<AppError>() {
            Some(AppError::CommandFailed { stderr, status, .. }) => {
                assert_eq!(stderr, "boom");
                assert!(status.contains('3'), "status was {status}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn overrides_and_redirects_apply() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out.sql");
        let mut overrides = HashMap::new();
        overrides.insert("mysqldump".to_string(), "echo".to_string());
        let runner = ProcessRunner::new(overrides, false);
        runner
            .run(
                &CmdSpec::new("mysqldump")
                    .arg("hello")
                    .stdout(StdioSpec::WriteTo(out.clone())),
            )
            .unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "hello\n");
    }
}
