//   interpret-trailers - merges command-line and configured trailers into a message
//   Copyright (C) 2016 Matthias Beyer <mail@beyermatthias.de>
//   Copyright (C) 2016 Julian Ganz <neither@nut.email>
//
//   This program is free software; you can redistribute it and/or modify
//   it under the terms of the GNU General Public License version 2 as
//   published by the Free Software Foundation.
//

mod logger;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use trailer_core::command;
use trailer_core::config::ConfigRegistry;
use trailer_core::configsrc;
use trailer_core::error::{Result, ResultExt};
use trailer_core::lex;
use trailer_core::list::{Item, TrailerList};
use trailer_core::locate;
use trailer_core::merge;
use trailer_core::policy::Policy;

use logger::{LoggableError, Logger};

/// Merge trailers into the trailing "Key: Value" block of a message read from stdin
#[derive(Parser)]
#[command(name = "interpret-trailers", version, about)]
struct Cli {
    /// Suppress trailers whose value ends up empty
    #[arg(long = "trim-empty")]
    trim_empty: bool,

    /// Path to a git-config-flavored trailer configuration source
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Trailer specifications of the form TOKEN(=|:)VALUE
    trailers: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    Logger::init(Logger::level_for_verbosity(cli.verbose)).expect("logger already initialized");

    if let Err(err) = run(cli) {
        err.log();
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = load_config(&cli)?;

    let mut input_text = String::new();
    io::stdin()
        .read_to_string(&mut input_text)
        .chain_err(|| trailer_core::error::ErrorKind::StdinReadError)?;

    let lines = lines_with_terminators(&input_text);
    let start = locate::locate(&lines);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &lines[..start] {
        out.write_all(line.as_bytes()).chain_err(|| trailer_core::error::ErrorKind::StdinReadError)?;
    }

    let mut input_list = build_input_list(&lines[start..], &registry);
    let arg_list = build_argument_list(&cli.trailers, &registry);

    merge::merge(&mut input_list, arg_list);

    for (_, item) in input_list.iter() {
        if cli.trim_empty && item.value.is_empty() {
            continue;
        }
        writeln!(out, "{}", item).chain_err(|| trailer_core::error::ErrorKind::StdinReadError)?;
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ConfigRegistry> {
    let mut registry = ConfigRegistry::new();

    let path = cli.config.clone().or_else(|| std::env::var("TRAILER_CONFIG").ok().map(PathBuf::from));
    if let Some(path) = path {
        match std::fs::read_to_string(&path) {
            Ok(text) => registry.load(configsrc::parse(&text)),
            Err(err) => log::warn!("could not read config source '{}': {}", path.display(), err),
        }
    }

    Ok(registry)
}

/// Split `text` on `\n`, keeping each terminator attached to the line it ends
fn lines_with_terminators(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (idx, &byte) in bytes.iter().enumerate() {
        if byte == b'\n' {
            lines.push(text[start..=idx].to_owned());
            start = idx + 1;
        }
    }
    if start < text.len() {
        lines.push(text[start..].to_owned());
    }
    lines
}

fn build_input_list(lines: &[String], registry: &ConfigRegistry) -> TrailerList {
    let mut list = TrailerList::new();
    for line in lines {
        let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        let (token, value) = lex::parse(trimmed);
        let mut item = Item::new(token, value);
        consult_input_item(&mut item, registry);
        list.push_back(item);
    }
    list
}

fn build_argument_list(args: &[String], registry: &ConfigRegistry) -> TrailerList {
    let mut list = TrailerList::new();
    for raw in args {
        let (token, value) = lex::parse(raw);
        let mut item = Item::new(token, value);
        consult_argument_item(&mut item, registry);
        list.push_back(item);
    }
    for entry in registry.iter_commands_without_arg() {
        let value = command::apply(entry.command.as_ref().expect("filtered by iter_commands_without_arg"), None);
        let token = entry.key.clone().unwrap_or_else(|| entry.name.clone());
        let mut item = Item::new(token, value);
        item.policy = Policy { where_: entry.where_, if_exists: entry.if_exists, if_missing: entry.if_missing };
        item.conf_name = Some(entry.name.clone());
        list.push_back(item);
    }
    list
}

/// Rewrite an input-item's canonical token and policy from a matching configured entry
///
/// Input items keep their authored value untouched: silently overwriting
/// text the user already wrote into the message with a command's output
/// would be surprising. Commands only ever produce *new* trailers (via
/// `build_argument_list`'s synthetic entries) or fill in an argument
/// explicitly invoked by short name (`consult_argument_item`).
fn consult_input_item(item: &mut Item, registry: &ConfigRegistry) {
    if let Some(entry) = registry.find_by_key_or_name_prefix(&item.token) {
        adopt_entry_identity(item, entry);
    }
}

/// Like `consult_input_item`, but also resolves a configured command
///
/// An argument named by its configured short name with no `=value` (or
/// whose command ignores `$ARG` entirely) gets its value from the command.
fn consult_argument_item(item: &mut Item, registry: &ConfigRegistry) {
    let entry = match registry.find_by_key_or_name_prefix(&item.token) {
        Some(entry) => entry.clone(),
        None => return,
    };
    adopt_entry_identity(item, &entry);

    if let Some(command) = &entry.command {
        if !entry.command_uses_arg() || item.value.is_empty() {
            let arg = if entry.command_uses_arg() && !item.value.is_empty() {
                Some(item.value.as_str())
            } else {
                None
            };
            item.value = command::apply(command, arg);
        }
    }
}

fn adopt_entry_identity(item: &mut Item, entry: &trailer_core::config::ConfigEntry) {
    if let Some(key) = &entry.key {
        item.token = key.clone();
    }
    item.policy = Policy { where_: entry.where_, if_exists: entry.if_exists, if_missing: entry.if_missing };
    item.conf_name = Some(entry.name.clone());
}
