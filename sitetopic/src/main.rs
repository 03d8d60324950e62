use anyhow::Context;
use sitetopic::commands::command_argument_builder;
use sitetopic::handlers::{
    build_config, build_service, handle_analyze, handle_check_domain, handle_check_url,
    handle_check_urls, handle_pages, print_json,
};
use sitetopic_core::api;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command_argument_builder().get_matches();
    let verbose = matches.get_flag("verbose");
    let quiet = matches.get_flag("quiet");

    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let Some((name, sub_matches)) = matches.subcommand() else {
        unreachable!("clap should ensure we don't get here")
    };

    if name == "ping" {
        return print_json(&api::ping());
    }

    let config = build_config(sub_matches)?;
    let service = build_service(&config)?;

    let response = match name {
        "pages" => handle_pages(&service, sub_matches).await,
        "check-url" => handle_check_url(&service, sub_matches).await,
        "check-urls" => handle_check_urls(&service, sub_matches).await,
        "check-domain" => handle_check_domain(&service, sub_matches).await,
        "analyze" => handle_analyze(&service, sub_matches, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
    .with_context(|| format!("{} failed", name))?;

    print_json(&response)
}
