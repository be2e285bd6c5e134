use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the tidings binary.
#[derive(Debug, Parser)]
#[command(name = "tidings", version, about = "Tidings blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TIDINGS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the blog HTTP server.
    Serve(Box<ServeArgs>),
    /// Render a stored post document and print the result.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the CMS base URL.
    #[arg(long = "cms-url", value_name = "URL")]
    pub cms_url: Option<String>,

    /// Override the CMS request timeout.
    #[arg(long = "cms-timeout-seconds", value_name = "SECONDS")]
    pub cms_timeout_seconds: Option<u64>,

    /// Override the public site URL used in feeds.
    #[arg(long = "site-url", value_name = "URL")]
    pub site_url: Option<String>,

    /// Toggle the `Secure` attribute on the session cookie.
    #[arg(
        long = "session-secure-cookie",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub session_secure_cookie: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum RenderFormat {
    /// HTML body.
    #[default]
    Html,
    /// Bounded plain-text excerpt.
    Text,
    /// Source of the first image, if any.
    Image,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// JSON document to render; anything that is not JSON is treated as text.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// What to print.
    #[arg(long, value_enum, default_value_t = RenderFormat::Html)]
    pub format: RenderFormat,

    /// Character bound for `--format text`.
    #[arg(long = "max-length", value_name = "CHARS")]
    pub max_length: Option<usize>,
}
