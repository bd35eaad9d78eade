// trailer-core - $ARG substitution and external command execution
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Configured-command invocation
//!
//! A trailer entry may name a shell command instead of (or in addition to) a
//! literal value. The command is handed to `sh -c` verbatim, with the first
//! occurrence of the literal substring `$ARG` replaced by the trailer's
//! argument, if any. Failure to produce a value is non-fatal: the caller gets
//! back an empty string and a warning is logged, the same way a missing
//! editor or pager falls back to a default elsewhere in this codebase rather
//! than aborting the whole run.
//!

use std::process::{Command, Stdio};

const ARG_PLACEHOLDER: &str = "$ARG";

/// Substitute the first occurrence of `$ARG` in `command` with `arg`
///
/// If `command` contains no `$ARG`, it is returned unchanged; the caller is
/// responsible for appending the argument itself in that case.
pub fn substitute_arg(command: &str, arg: &str) -> String {
    match command.find(ARG_PLACEHOLDER) {
        Some(idx) => {
            let mut out = String::with_capacity(command.len() + arg.len());
            out.push_str(&command[..idx]);
            out.push_str(arg);
            out.push_str(&command[idx + ARG_PLACEHOLDER.len()..]);
            out
        }
        None => command.to_owned(),
    }
}

/// Run `command` through `sh -c` and return its trimmed stdout
///
/// stdin is closed, stdout is captured, stderr is inherited so the child's
/// own diagnostics still reach the user. Any failure to spawn, a non-zero
/// exit, or non-UTF8 output is logged and yields an empty string rather than
/// propagating an error: a misconfigured generator trailer should not abort
/// the whole merge.
pub fn run(command: &str) -> String {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output();

    match output {
        Ok(output) if output.status.success() => match String::from_utf8(output.stdout) {
            Ok(text) => text.trim().to_owned(),
            Err(_) => {
                log::warn!("command '{}' produced non-UTF8 output, ignoring", command);
                String::new()
            }
        },
        Ok(output) => {
            log::warn!("command '{}' exited with {}", command, output.status);
            String::new()
        }
        Err(err) => {
            log::warn!("could not run command '{}': {}", command, err);
            String::new()
        }
    }
}

/// Substitute `$ARG` (if present) and run the resulting command
pub fn apply(command: &str, arg: Option<&str>) -> String {
    let resolved = match arg {
        Some(arg) => substitute_arg(command, arg),
        None => command.to_owned(),
    };
    run(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_first_occurrence_only() {
        assert_eq!(substitute_arg("echo $ARG-$ARG", "x"), "echo x-$ARG");
    }

    #[test]
    fn substitute_without_placeholder_is_unchanged() {
        assert_eq!(substitute_arg("echo hi", "x"), "echo hi");
    }

    #[test]
    fn run_captures_trimmed_stdout() {
        assert_eq!(run("printf ' hi \\n'"), "hi");
    }

    #[test]
    fn run_failure_yields_empty_string() {
        assert_eq!(run("exit 7"), "");
    }

    #[test]
    fn apply_substitutes_before_running() {
        assert_eq!(apply("echo $ARG", Some("value")), "value");
    }

    #[test]
    fn apply_without_arg_runs_command_verbatim() {
        assert_eq!(apply("echo fixed", None), "fixed");
    }
}
