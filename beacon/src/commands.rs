use crate::CLAP_STYLING;
use beacon_core::config::DEFAULT_CONFIG_FILE;
use clap::{arg, command};

fn config_arg() -> clap::Arg {
    arg!(-c --"config" <PATH>)
        .required(false)
        .help("Path to the JSON configuration file")
        .value_parser(clap::value_parser!(std::path::PathBuf))
        .default_value(DEFAULT_CONFIG_FILE)
}

fn base_url_arg() -> clap::Arg {
    arg!(-u --"base-url" <URL>)
        .required(false)
        .help("Site root to audit (overrides baseUrl from the config file)")
}

fn max_pages_arg() -> clap::Arg {
    arg!(-m --"max-pages" <COUNT>)
        .required(false)
        .help("Stop crawling after this many pages (default: unbounded)")
        .value_parser(clap::value_parser!(usize))
}

fn concurrency_arg() -> clap::Arg {
    arg!(-t --"concurrency" <NUM_PAGES>)
        .required(false)
        .help("Number of pages loaded at once")
        .value_parser(clap::value_parser!(usize))
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("beacon")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("beacon")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(arg!(-v --"verbose" "Log pipeline progress (RUST_LOG takes precedence)").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("scan")
                .about(
                    "Crawl a site (or the configured relative paths), audit every page for WCAG \
                violations and write the results and reports.",
                )
                .arg(config_arg())
                .arg(base_url_arg())
                .arg(max_pages_arg())
                .arg(concurrency_arg())
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory for the results dataset and reports")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-p --"paths-file" <PATH>)
                        .required(false)
                        .help("Newline-delimited file of paths to audit instead of crawling")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("crawl")
                .about("Crawl a site and list the in-scope pages without auditing them.")
                .arg(config_arg())
                .arg(base_url_arg())
                .arg(max_pages_arg())
                .arg(concurrency_arg())
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the page list to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("report")
                .about("Regenerate reports from a saved results dataset without crawling.")
                .arg(config_arg())
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory holding accessibility-results.json")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, html, markdown (repeatable)")
                        .value_parser(["text", "json", "html", "markdown", "md"])
                        .action(clap::ArgAction::Append),
                ),
        )
}
