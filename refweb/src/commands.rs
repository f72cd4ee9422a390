use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("refweb")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("refweb")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress non-essential output and progress bars")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to a JSON config file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Creates the graph cache database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the database file (default: from config)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Deletes any existing database at the location first")
                        .required(false),
                ),
        )
        .subcommand(
            command!("graph")
                .about("Prints the connected-document graph around a document as JSON")
                .arg(
                    arg!(-n --"name" <TITLE>)
                        .required(true)
                        .help("Title of the seed document"),
                )
                .arg(depth_arg())
                .arg(
                    arg!(--"population")
                        .required(false)
                        .help("Recompute entries that were not written today")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(corpus_arg()),
        )
        .subcommand(
            command!("comments")
                .about("Prints the comments in the neighborhood of a document as JSON")
                .arg(
                    arg!(-n --"name" <TITLE>)
                        .required(true)
                        .help("Title of the seed document"),
                )
                .arg(depth_arg())
                .arg(corpus_arg()),
        )
        .subcommand(
            command!("populate")
                .about("Refreshes the cache for every document under a storage ceiling")
                .arg(depth_arg())
                .arg(
                    arg!(--"max-storage" <BYTES>)
                        .required(false)
                        .help("Stop once the database reaches this many bytes")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"pacing-ms" <MS>)
                        .required(false)
                        .help("Delay between documents in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(corpus_arg()),
        )
        .subcommand(command!("purge").about("Deletes cache entries matching the denylist"))
        .subcommand(command!("status").about("Shows cache entry count and storage size"))
}

fn depth_arg() -> clap::Arg {
    arg!(-d --"depth" <DEPTH>)
        .required(false)
        .help("Traversal depth (default: from config)")
        .value_parser(clap::value_parser!(u32))
}

fn corpus_arg() -> clap::Arg {
    arg!(-C --"corpus" <DIR>)
        .required(false)
        .help("Directory holding documents.jsonl and comments.jsonl")
        .value_parser(clap::value_parser!(PathBuf))
}
