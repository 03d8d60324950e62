use clap::{ArgGroup, arg, command};
use std::path::PathBuf;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn depth_arg() -> clap::Arg {
    arg!(-d --"depth" <N>)
        .required(false)
        .help("How many results to return (0 is treated as 1)")
        .value_parser(clap::value_parser!(usize))
        .default_value("1")
}

fn url_arg() -> clap::Arg {
    arg!(-u --"url" <URL>)
        .required(true)
        .help("The URL to process")
        .value_parser(clap::value_parser!(Url))
}

fn hosts_file_arg() -> clap::Arg {
    arg!(-H --"hosts-file" <PATH>)
        .required(false)
        .help("Path to a newline-delimited file of URLs")
        .value_parser(clap::value_parser!(PathBuf))
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitetopic")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitetopic")
        .about("Crawl a site and classify its pages by keyword topics")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to the JSON config file (default: ~/.config/sitetopic/config.json)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"keywords" <PATH>)
                .required(false)
                .global(true)
                .help("Keyword to topic table (JSON object)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"categories" <PATH>)
                .required(false)
                .global(true)
                .help("Topic to category table (JSON object)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"cache" <PATH>)
                .required(false)
                .global(true)
                .help("URL result cache file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"render-endpoint" <URL>)
                .required(false)
                .global(true)
                .help("Render service queried as <URL>?url=<page>"),
        )
        .arg(
            arg!(-v --"verbose" "Log fetches and cache decisions")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .arg(
            arg!(-q --"quiet" "Only log warnings and errors")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(command!("ping").about("Check that the tool is alive"))
        .subcommand(
            command!("pages")
                .about("Discover the pages linked from a URL")
                .arg(url_arg())
                .arg(depth_arg()),
        )
        .subcommand(
            command!("check-url")
                .about("Classify one page by its keyword topics")
                .arg(url_arg())
                .arg(depth_arg()),
        )
        .subcommand(
            command!("check-urls")
                .about("Classify several pages, reporting failures per URL")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("A URL to classify, may be repeated")
                        .value_parser(clap::value_parser!(Url))
                        .action(clap::ArgAction::Append),
                )
                .arg(hosts_file_arg())
                .group(
                    ArgGroup::new("source")
                        .args(["url", "hosts-file"])
                        .required(true),
                )
                .arg(depth_arg()),
        )
        .subcommand(
            command!("check-domain")
                .about("Crawl a URL and classify the pages it links to")
                .arg(url_arg())
                .arg(depth_arg()),
        )
        .subcommand(
            command!("analyze")
                .about("Report topic scores and keyword hits per page, bypassing the cache")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to analyze")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(hosts_file_arg().conflicts_with("url"))
                .group(
                    ArgGroup::new("source")
                        .args(["url", "hosts-file"])
                        .required(true),
                ),
        )
}
