use std::path::Path;

use crate::utils::process::{CmdSpec, StdioSpec};

pub const RUNTIME: &str = "docker";

#[derive(Debug, Clone, Copy)]
pub enum Stream<'a> {
    None,
    In(&'a Path),
    Out(&'a Path),
}

pub fn exec(container: &str, script: String, stream: Stream<'_>) -> CmdSpec {
    let mut cmd = CmdSpec::new(RUNTIME).arg("exec");
    if matches!(stream, Stream::In(_)) {
        cmd = cmd.arg("-i");
    }
    cmd = cmd.args([container, "sh", "-c"]).arg(script);
    match stream {
        Stream::None => cmd,
        Stream::In(p) => cmd.stdin(StdioSpec::ReadFrom(p.to_path_buf())),
        Stream::Out(p) => cmd.stdout(StdioSpec::WriteTo(p.to_path_buf())),
    }
}

pub fn env_ref(name: &str) -> String {
    format!("\"${name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_without_stream_has_no_interactive_flag() {
        let cmd = exec("db", "true".into(), Stream::None);
        assert_eq!(cmd.argv(), vec!["exec", "db", "sh", "-c", "true"]);
    }

    #[test]
    fn exec_with_input_is_interactive() {
        let cmd = exec("db", "cat".into(), Stream::In(Path::new("/tmp/x.sql")));
        assert_eq!(cmd.render(), "docker exec -i db sh -c cat < /tmp/x.sql");
    }

    #[test]
    fn env_ref_is_double_quoted() {
        assert_eq!(env_ref("POSTGRES_PASSWORD"), "\"$POSTGRES_PASSWORD\"");
    }
}
