//! logless - Commit-by-Commit Git Log Pager
//!
//! Reads `git log` output from stdin, or runs `git log` itself when stdin is
//! a terminal, and pages through it one commit at a time.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use logless::cache::CacheManager;
use logless::render::{ColorTheme, TerminalUI};
use logless::source::{spawn_log, GitShow};
use logless::stream::{open_reader, InputFormat};
use logless::{Application, CommitStore, ConfigOverrides, PagerConfig, Session};
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::new("logless")
        .version(logless::VERSION)
        .about("A commit-by-commit pager for git log")
        .long_about(
            "logless shows a git log one commit at a time. Pipe `git log` (or \
             `git log --pretty=format:%H`) into it, or run it inside a repository \
             with no input to page the current branch.",
        )
        .arg(
            Arg::new("file")
                .help("Read the log from a file instead of stdin")
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: $CONFIG_DIR/logless/config.toml)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Input record shape")
                .value_parser(["auto", "ids", "log"]),
        )
        .arg(
            Arg::new("cache-limit")
                .long("cache-limit")
                .value_name("BYTES")
                .help("Resident commit text before eviction starts")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("query-limit")
                .long("query-limit")
                .value_name("BYTES")
                .help("Longest search query accepted")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("show-command")
                .long("show-command")
                .value_name("CMD")
                .help("Command printing one commit, the id is appended (default: git show)"),
        )
        .arg(
            Arg::new("log-command")
                .long("log-command")
                .value_name("CMD")
                .help("Command listing commit ids when stdin is a terminal"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write diagnostics to this file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("monochrome")
                .long("monochrome")
                .help("Disable diff colors")
                .action(ArgAction::SetTrue),
        )
}

fn overrides(matches: &ArgMatches) -> Result<ConfigOverrides> {
    let input_format = matches
        .get_one::<String>("format")
        .map(|format| format.parse::<InputFormat>())
        .transpose()?;
    let command = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect())
    };

    Ok(ConfigOverrides {
        cache_limit: matches.get_one::<usize>("cache-limit").copied(),
        input_format,
        show_command: command("show-command"),
        log_command: command("log-command"),
        query_limit: matches.get_one::<usize>("query-limit").copied(),
        log_file: matches.get_one::<PathBuf>("log-file").cloned(),
        monochrome: matches.get_flag("monochrome"),
    })
}

/// stderr shares the pager's terminal, so logging stays off unless `RUST_LOG`
/// asks for it or a log file is given.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn open_input(file: Option<&PathBuf>, config: &PagerConfig) -> Result<Box<dyn Read>> {
    if let Some(path) = file {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        return Ok(Box::new(file));
    }
    if io::stdin().is_terminal() {
        log::info!("stdin is a terminal, running {:?}", config.log_command);
        return Ok(Box::new(spawn_log(&config.log_command)?));
    }
    Ok(Box::new(io::stdin()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = PagerConfig::resolve(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
        overrides(&matches)?,
    )?;
    init_logging(config.log_file.as_deref())?;
    log::debug!("configuration: {config:?}");

    let input = open_input(matches.get_one::<PathBuf>("file"), &config)?;
    let reader = open_reader(config.input_format, input)?;
    let source = GitShow::new(&config.show_command)?;
    let store = CommitStore::open(
        reader,
        Box::new(source),
        CacheManager::new(config.cache_limit),
    )?;
    let session = Session::new(store, config.query_limit)?;

    let theme = if config.monochrome {
        ColorTheme::monochrome()
    } else {
        ColorTheme::default()
    };
    let mut app = Application::new(session, TerminalUI::with_theme(theme));

    // `run` has already restored the terminal
    if let Err(err) = app.run().await {
        let commit = app.session().store().current_node().commit_id().to_string();
        log::error!("fatal error at commit {commit}: {err}");
        return Err(anyhow::Error::new(err).context(format!("logless stopped at commit {commit}")));
    }

    Ok(())
}
