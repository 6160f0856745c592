// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod table_file;

use anyhow::{Context, Result, anyhow};
use config::Config;
use log::{info, warn};
use quickedit_app::QuickEdit;
use simplelog::WriteLogger;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `quickedit --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(&config)?;

    let table_path = options
        .table_path
        .clone()
        .or_else(|| config.default_table())
        .ok_or_else(|| anyhow!("no table file; pass --table <path> or set [editor].default_table"))?;
    let table = table_file::load(&table_path)?;
    info!(
        "loaded {} rows and {} columns from {}",
        table.row_count(),
        table.columns().len(),
        table_path.display()
    );

    let options_for_editor = config.editor_options();
    for key in &options_for_editor.changes_always_include {
        if table.column(key.as_str()).is_none() {
            warn!("changes_always_include key {key} is not a column; rows without it report null");
        }
    }
    if options.check_only {
        return Ok(());
    }

    let mut editor = QuickEdit::new(table, options_for_editor);
    let saved = quickedit_tui::run_app(&mut editor)?;
    if let Some(changes) = saved {
        let encoded = serde_json::to_string_pretty(&changes).context("encode change set")?;
        println!("{encoded}");
    }
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    WriteLogger::init(config.log_level()?, simplelog::Config::default(), log_file)
        .context("install logger")?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    table_path: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        table_path: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--table" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--table requires a file path"))?;
                options.table_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("quickedit");
    println!("  --config <path>          Use a specific config path");
    println!("  --table <path>           Open a TOML table file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + table file and exit");
    println!("  --help                   Show this help");
}
