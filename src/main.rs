mod args;
mod block;
mod decoder;
mod document;
mod error;
mod http;
mod ini;
mod render;
mod url;
mod vars;

use crate::args::{CommandLineArgs, ConnectionArgs};
use crate::block::{first_request_line, RequestBlockParser};
use crate::document::Document;
use crate::error::Error;
use crate::http::{request_headers, HttpClient};
use crate::ini::IniProfile;
use crate::vars::{parse_assignments, Variables};

use anyhow::{Context, Result};
use colored::*;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "httpbuf=debug" } else { "httpbuf=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cmd_args = CommandLineArgs::parse()?;
    init_tracing(cmd_args.verbose());

    let doc = if cmd_args.reads_stdin() {
        Document::from_stdin()?
    } else {
        Document::open(cmd_args.file())
            .with_context(|| format!("failed to read {}", cmd_args.file().display()))?
    };

    if cmd_args.list() {
        for (line, text) in doc.request_lines() {
            println!("{line}: {text}");
        }
        return Ok(());
    }

    let profile = IniProfile::load(cmd_args.config(), cmd_args.profile())?;
    let vars = Variables::new(
        parse_assignments(cmd_args.vars())?,
        profile.as_ref().map(|p| p.variables().clone()).unwrap_or_default(),
    );

    let cursor = match cmd_args.line() {
        Some(line) => line,
        None => first_request_line(doc.lines()).ok_or(Error::NoRequestFound(1))?,
    };

    let parsed = RequestBlockParser::new(&vars, doc.base_dir()).parse(doc.lines(), cursor)?;
    for warning in &parsed.warnings {
        tracing::warn!("{warning}");
    }
    let block = parsed.block;

    let client = HttpClient::new(&ConnectionArgs::merge(&cmd_args, profile.as_ref()))?;
    let target_url = client.target_url(&block);

    if cmd_args.dry_run() {
        println!("{}", render::render_dry_run(&block, &target_url)?);
        return Ok(());
    }

    let method_url = format!("{} {}", block.method(), target_url);
    if cmd_args.verbose() {
        eprintln!("> {method_url}");
        for (name, value) in &request_headers(&block, cmd_args.headers()) {
            eprintln!("> {name}: {value}");
        }
    }

    let res = client.execute(&block, cmd_args.headers()).await?;

    if cmd_args.verbose() {
        eprintln!("< {}", render::status_line(res.version(), res.status()));
    }

    print!("{}", render::render_response(&method_url, &res, !cmd_args.raw()));
    Ok(())
}
