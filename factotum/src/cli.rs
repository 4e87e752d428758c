//! Command line parameters of the `fauth` binary.
//!
//! [CliArgs::run] is called by the main function and does the actual work
//! while the main function just sets up logging.

use std::io::{self, Write};
use std::net::TcpStream;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};

use crate::auth::Factotum;
use crate::config::FactotumConfig;
use crate::key::KeyResolver;

/// Talk to the factotum key agent.
///
/// Used for parsing with [clap].
#[derive(Parser, Debug)]
#[command(name = "fauth", author, version, about, long_about, arg_required_else_help = true)]
pub struct CliArgs {
    /// Lowest log level to show
    #[arg(long = "log-level", value_name = "LOG_LEVEL", group = "log-level")]
    log_level: Option<log::LevelFilter>,

    /// Show verbose log output – sets log level to "debug"
    #[arg(short, long, group = "log-level")]
    verbose: bool,

    /// Show no log output – sets log level to "error"
    #[arg(short, long, group = "log-level")]
    quiet: bool,

    /// Configuration file to read
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where factotum is mounted, overrides the configuration file
    #[arg(short, long, value_name = "DIR")]
    pub mount: Option<PathBuf>,

    /// Fail instead of prompting for missing keys
    #[arg(long)]
    pub no_prompt: bool,

    /// The subcommand to be invoked
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Print the man page to stdout and exit
    #[arg(long)]
    pub print_manpage: bool,

    /// Generate completion file for a shell
    #[arg(long, value_name = "SHELL")]
    pub print_completions: Option<clap_complete::Shell>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print user name and password of a `proto=pass` key
    ///
    /// Example: fauth userpasswd proto=pass service=imap server=mail.example.com
    Userpasswd {
        /// Attribute-value pairs selecting the key
        #[arg(required = true)]
        params: Vec<String>,
    },

    /// Print the authentication info of the conversation on a fresh rpc file
    Authinfo,

    /// Dial a server and authenticate to it through factotum
    ///
    /// Example: fauth proxy --dial plan9.example.com:567 proto=p9sk1 role=client
    Proxy {
        /// Address to connect to, `host:port`
        #[arg(long, value_name = "ADDR")]
        dial: String,

        /// Attribute-value pairs describing the protocol
        #[arg(required = true)]
        params: Vec<String>,
    },
}

impl CliArgs {
    /// returns the log level filter set by CLI args
    /// returns `None` if the user did not specify any log level filter via CLI
    ///
    /// NOTE: the clap argument group ensures that at most one of the log level
    /// arguments is given.
    pub fn get_log_level(&self) -> Option<log::LevelFilter> {
        if self.verbose {
            return Some(log::LevelFilter::Debug);
        }
        if self.quiet {
            return Some(log::LevelFilter::Error);
        }
        self.log_level
    }

    /// Merge the command line parameters into the configuration
    pub fn apply_to_config(&self, config: &mut FactotumConfig) {
        if let Some(mount) = &self.mount {
            config.mount_point = mount.clone();
        }
        if self.no_prompt {
            config.prompt = false;
        }
    }

    /// Load the configuration file if any, with command line overrides applied
    pub fn config(&self) -> anyhow::Result<FactotumConfig> {
        let mut config = match &self.config {
            Some(path) => FactotumConfig::load(path)?,
            None => FactotumConfig::default(),
        };
        self.apply_to_config(&mut config);
        Ok(config)
    }

    /// Runs the subcommand; without one there is nothing to do
    pub fn run(&self) -> anyhow::Result<()> {
        let Some(command) = &self.command else {
            return Ok(());
        };

        let config = self.config()?;
        let factotum = Factotum::from_config(&config);
        let mut resolver = config.key_resolver();
        if let Some(resolver) = &resolver {
            debug!("missing keys are prompted for with {:?}", resolver.helpers());
        }
        let getkey = resolver.as_mut().map(|r| r as &mut dyn KeyResolver);

        let mut stdout = io::stdout().lock();
        match command {
            CliCommand::Userpasswd { params } => {
                let params = params.join(" ");
                let up = factotum
                    .get_user_password(getkey, &params)
                    .with_context(|| format!("could not find password for {params}"))?;
                writeln!(stdout, "{}", up.user)?;
                writeln!(stdout, "{}", up.password)?;
            }
            CliCommand::Authinfo => {
                let ai = factotum.get_info().context("could not read authinfo")?;
                writeln!(stdout, "caller {}", ai.caller_id)?;
                writeln!(stdout, "server {}", ai.server_id)?;
                writeln!(stdout, "cap {}", ai.cap)?;
            }
            CliCommand::Proxy { dial, params } => {
                let params = params.join(" ");
                let mut conn = TcpStream::connect(dial)
                    .with_context(|| format!("could not dial {dial}"))?;
                info!("connected to {dial}");
                let ai = factotum
                    .proxy(&mut conn, getkey, &params)
                    .with_context(|| format!("authentication with {dial} failed"))?;
                writeln!(stdout, "caller {}", ai.caller_id)?;
                writeln!(stdout, "server {}", ai.server_id)?;
            }
        }
        Ok(())
    }
}
