use anyhow::Result;
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use refweb::handlers::{
    build_engine, handle_comments, handle_graph, handle_init, handle_populate, handle_purge,
    handle_status, load_config, open_store, population_options,
};
use refweb_core::config::Config;
use std::path::PathBuf;
use tracing::Level;

mod commands;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");

    tracing_subscriber::fmt()
        .with_max_level(if quiet { Level::WARN } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&matches, quiet).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches, quiet: bool) -> Result<()> {
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("init", args)) => {
            let path = args
                .get_one::<PathBuf>("PATH")
                .unwrap_or(&config.database)
                .clone();
            handle_init(&path, args.get_flag("force"), &config)?;
        }
        Some(("graph", args)) => {
            let engine = build_engine(&config, corpus_dir(args))?;
            let json = handle_graph(
                &engine,
                name(args),
                depth(args, &config),
                args.get_flag("population"),
            )?;
            println!("{}", json);
        }
        Some(("comments", args)) => {
            let engine = build_engine(&config, corpus_dir(args))?;
            println!("{}", handle_comments(&engine, name(args), depth(args, &config))?);
        }
        Some(("populate", args)) => {
            let engine = build_engine(&config, corpus_dir(args))?;
            let options = population_options(
                &config,
                args.get_one::<u32>("depth").copied(),
                args.get_one::<u64>("max-storage").copied(),
                args.get_one::<u64>("pacing-ms").copied(),
                quiet,
            );
            let manifest = handle_populate(engine, options, quiet).await?;
            if quiet {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Some(("purge", _)) => {
            handle_purge(open_store(&config)?, &config.population.denylist)?;
        }
        Some(("status", _)) => {
            handle_status(open_store(&config)?)?;
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
    Ok(())
}

fn name(args: &ArgMatches) -> &str {
    args.get_one::<String>("name")
        .map(String::as_str)
        .unwrap_or_default()
}

fn depth(args: &ArgMatches, config: &Config) -> u32 {
    args.get_one::<u32>("depth")
        .copied()
        .unwrap_or(config.population.depth)
}

fn corpus_dir(args: &ArgMatches) -> Option<&std::path::Path> {
    args.get_one::<PathBuf>("corpus").map(PathBuf::as_path)
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
