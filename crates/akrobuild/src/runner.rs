// akro: A declarative build front end for native artifacts.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! Runs one synthesized command through the shell, with combined output
//! captured to a scratch file that is deleted on every exit path. A failing
//! command prints a banner and a bounded tail of its output; a succeeding
//! one prints nothing. Each invocation owns all of its state, so scheduler
//! workers may call this concurrently.

use anyhow::Context;
use colored::Colorize;
use log::debug;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// How many trailing output lines a failing command reports by default.
pub const DEFAULT_ERROR_TAIL: usize = 200;

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// The command as the failure banner and verbose echo show it, with any
/// environment overrides rendered as leading `KEY=value` pairs.
fn render_command(command: &str, env: Option<&HashMap<String, String>>) -> String {
    match env {
        Some(env) if !env.is_empty() => {
            let mut pairs: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
            pairs.sort();
            format!("{} {command}", pairs.join(" "))
        }
        _ => command.to_string(),
    }
}

fn tail_lines(text: &str, limit: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(limit);
    lines[start..].to_vec()
}

/// [`run_command_with_tail`] with the default error tail.
pub fn run_command(
    command: &str,
    env: Option<&HashMap<String, String>>,
    verbose: bool,
) -> anyhow::Result<bool> {
    run_command_with_tail(command, env, verbose, DEFAULT_ERROR_TAIL)
}

/// Runs `command` through the shell and returns whether it exited zero.
/// Non-zero exit is reported (banner plus at most `error_tail` trailing
/// output lines) but is not an error of the harness itself; failing to set
/// up or read back the scratch capture is.
pub fn run_command_with_tail(
    command: &str,
    env: Option<&HashMap<String, String>>,
    verbose: bool,
    error_tail: usize,
) -> anyhow::Result<bool> {
    let scratch =
        NamedTempFile::new().context("failed to create a scratch file for build output")?;
    let stdout = scratch
        .reopen()
        .context("failed to open the scratch file for stdout")?;
    let stderr = scratch
        .reopen()
        .context("failed to open the scratch file for stderr")?;

    if verbose {
        eprintln!("{}", render_command(command, env));
    }

    let mut cmd = shell_command(command);
    if let Some(env) = env {
        cmd.envs(env);
    }
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status()
        .with_context(|| format!("failed to spawn `{command}`"))?;
    debug!("`{command}` exited with {status}");

    if status.success() {
        return Ok(true);
    }

    let output = std::fs::read(scratch.path())
        .with_context(|| format!("failed to read captured output of `{command}`"))?;
    let output = String::from_utf8_lossy(&output);
    eprintln!(
        "{} {}",
        "Command failed:".red().bold(),
        render_command(command, env)
    );
    for line in tail_lines(&output, error_tail) {
        eprintln!("{line}");
    }
    Ok(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn env_overrides_render_as_sorted_pairs() {
        assert_eq!(render_command("make all", None), "make all");
        assert_eq!(render_command("make all", Some(&HashMap::new())), "make all");
        let env = HashMap::from([
            ("CC".to_string(), "clang++".to_string()),
            ("ARFLAGS".to_string(), "rcs".to_string()),
        ]);
        assert_eq!(
            render_command("make all", Some(&env)),
            "ARFLAGS=rcs CC=clang++ make all"
        );
    }

    #[test]
    fn tail_is_bounded() {
        let text = "one\ntwo\nthree\nfour\n";
        assert_eq!(tail_lines(text, 2), ["three", "four"]);
        assert_eq!(tail_lines(text, 200), ["one", "two", "three", "four"]);
        assert!(tail_lines("", 2).is_empty());
    }
}
