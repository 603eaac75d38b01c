use crate::error::{Error, Result};
use crate::http::HttpConnectionProfile;
use crate::ini::{IniProfile, DEFAULT_INI_FILE_PATH, DEFAULT_INI_SECTION};

use std::collections::HashMap;
use std::path::PathBuf;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ClapArgs {
    #[clap(help = "request file to read, or '-' for stdin")]
    file: PathBuf,
    #[clap(
        short = 'l',
        long,
        help = "cursor line; the request at or above it is run (default: first request)"
    )]
    line: Option<usize>,
    #[clap(short = 'p', long, default_value = DEFAULT_INI_SECTION, help = "profile name")]
    profile: String,
    #[clap(long, default_value = DEFAULT_INI_FILE_PATH, help = "profile file path")]
    config: String,
    #[clap(short = 'u', long, help = "username for basic authentication")]
    user: Option<String>,
    #[clap(short = 'w', long, help = "password for basic authentication")]
    password: Option<String>,
    #[clap(short = 'r', long, help = "CA certificate PEM file path")]
    ca_cert: Option<String>,
    #[clap(
        short = 'k',
        long,
        help = "Allow insecure server connections when using SSL"
    )]
    insecure: bool,
    #[clap(
        short = 'H',
        long = "header",
        value_name = "KEY: VALUE",
        help = "HTTP header to send on top of the request's own"
    )]
    headers: Vec<String>,
    #[clap(
        short = 'e',
        long = "env",
        value_name = "NAME=VALUE",
        help = "value for a {{NAME}} placeholder, overriding the environment"
    )]
    vars: Vec<String>,
    #[clap(short = 'n', long, help = "print the parsed request as JSON without sending it")]
    dry_run: bool,
    #[clap(long, help = "list the request lines of the file and exit")]
    list: bool,
    #[clap(long, help = "do not pretty-print JSON response bodies")]
    raw: bool,
    #[clap(
        short = 'v',
        long,
        help = "Print verbose message",
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug)]
pub struct CommandLineArgs {
    file: PathBuf,
    line: Option<usize>,
    profile: String,
    config: String,
    user: Option<String>,
    password: Option<String>,
    ca_cert: Option<String>,
    insecure: bool,
    headers: HashMap<String, String>,
    vars: Vec<String>,
    dry_run: bool,
    list: bool,
    raw: bool,
    verbose: bool,
}

fn vec_to_hashmap(vec: Vec<String>) -> Result<HashMap<String, String>> {
    vec.into_iter()
        .map(|s| match s.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_lowercase(), value.trim().to_string()))
            }
            _ => Err(Error::InvalidArgument(format!("Invalid header format: {s}"))),
        })
        .collect()
}

impl CommandLineArgs {
    pub fn parse() -> Result<Self> {
        Self::from_clap(ClapArgs::parse())
    }

    fn from_clap(args: ClapArgs) -> Result<Self> {
        Ok(Self {
            file: args.file,
            line: args.line,
            profile: args.profile,
            config: args.config,
            user: args.user,
            password: args.password,
            ca_cert: args.ca_cert,
            insecure: args.insecure,
            headers: vec_to_hashmap(args.headers)?,
            vars: args.vars,
            dry_run: args.dry_run,
            list: args.list,
            raw: args.raw,
            verbose: args.verbose,
        })
    }

    pub fn file(&self) -> &PathBuf {
        &self.file
    }

    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn list(&self) -> bool {
        self.list
    }

    pub fn raw(&self) -> bool {
        self.raw
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
impl CommandLineArgs {
    pub fn parse_from<I, T>(itr: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }
}

/// Connection settings with command line values taking precedence over the
/// profile file.
#[derive(Debug, Default)]
pub struct ConnectionArgs {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    insecure: bool,
    ca_cert: Option<String>,
    headers: HashMap<String, String>,
}

impl ConnectionArgs {
    pub fn merge(cmd: &CommandLineArgs, profile: Option<&IniProfile>) -> Self {
        ConnectionArgs {
            host: profile.and_then(|p| p.host()).cloned(),
            user: cmd.user.clone().or_else(|| profile.and_then(|p| p.user()).cloned()),
            password: cmd
                .password
                .clone()
                .or_else(|| profile.and_then(|p| p.password()).cloned()),
            insecure: cmd.insecure || profile.map(|p| p.insecure()).unwrap_or(false),
            ca_cert: cmd
                .ca_cert
                .clone()
                .or_else(|| profile.and_then(|p| p.ca_cert()).cloned()),
            headers: profile.map(|p| p.headers().clone()).unwrap_or_default(),
        }
    }
}

impl HttpConnectionProfile for ConnectionArgs {
    fn host(&self) -> Option<&String> {
        self.host.as_ref()
    }

    fn user(&self) -> Option<&String> {
        self.user.as_ref()
    }

    fn password(&self) -> Option<&String> {
        self.password.as_ref()
    }

    fn insecure(&self) -> bool {
        self.insecure
    }

    fn ca_cert(&self) -> Option<&String> {
        self.ca_cert.as_ref()
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}
