//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, RenderArgs, RenderFormat, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tidings";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CMS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CMS_PAGE_SIZE: u32 = 10;
const DEFAULT_SITE_URL: &str = "http://localhost:3000";
const DEFAULT_SITE_TITLE: &str = "Tidings";
const DEFAULT_FEED_LIMIT: u32 = 20;
const DEFAULT_SESSION_COOKIE: &str = "tidings_session";
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
pub(crate) const DEFAULT_META_DESCRIPTION_CHARS: usize = 160;
pub(crate) const DEFAULT_CARD_EXCERPT_CHARS: usize = 240;
pub(crate) const DEFAULT_FEED_EXCERPT_CHARS: usize = 200;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub site: SiteSettings,
    pub session: SessionSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CmsSettings {
    /// Required to serve; optional so offline commands can run without it.
    pub base_url: Option<Url>,
    /// Read-only API token attached to public requests, if the CMS needs one.
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub public_url: String,
    pub title: String,
    pub description: String,
    pub feed_limit: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure: bool,
    pub max_age: Duration,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub meta_description_chars: usize,
    pub card_excerpt_chars: usize,
    pub feed_excerpt_chars: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TIDINGS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    site: RawSiteSettings,
    session: RawSessionSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.cms_url.as_ref() {
            self.cms.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.cms_timeout_seconds {
            self.cms.timeout_seconds = Some(seconds);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.public_url = Some(url.clone());
        }
        if let Some(secure) = overrides.session_secure_cookie {
            self.session.secure = Some(secure);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            site,
            session,
            render,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            site: build_site_settings(site)?,
            session: build_session_settings(session)?,
            render: build_render_settings(render)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let base_url = match non_blank(cms.base_url) {
        Some(value) => {
            let url = Url::parse(&value)
                .map_err(|err| LoadError::invalid("cms.base_url", err.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "cms.base_url",
                    "scheme must be http or https",
                ));
            }
            Some(url)
        }
        None => None,
    };

    let timeout_secs = cms.timeout_seconds.unwrap_or(DEFAULT_CMS_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "cms.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let page_size = non_zero_u32(
        cms.page_size.unwrap_or(DEFAULT_CMS_PAGE_SIZE.into()),
        "cms.page_size",
    )?;

    Ok(CmsSettings {
        base_url,
        api_token: non_blank(cms.api_token),
        timeout: Duration::from_secs(timeout_secs),
        page_size,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let public_url = non_blank(site.public_url).unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    Url::parse(&public_url).map_err(|err| LoadError::invalid("site.public_url", err.to_string()))?;

    Ok(SiteSettings {
        public_url,
        title: non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: site.description.unwrap_or_default(),
        feed_limit: non_zero_u32(
            site.feed_limit.unwrap_or(DEFAULT_FEED_LIMIT.into()),
            "site.feed_limit",
        )?,
    })
}

fn build_session_settings(session: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let cookie_name =
        non_blank(session.cookie_name).unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
    if !cookie_name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(LoadError::invalid(
            "session.cookie_name",
            "only ASCII letters, digits, `_` and `-` are allowed",
        ));
    }

    let max_age_secs = session
        .max_age_seconds
        .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS);
    if max_age_secs == 0 {
        return Err(LoadError::invalid(
            "session.max_age_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SessionSettings {
        cookie_name,
        secure: session.secure.unwrap_or(true),
        max_age: Duration::from_secs(max_age_secs),
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    Ok(RenderSettings {
        meta_description_chars: positive(
            render
                .meta_description_chars
                .unwrap_or(DEFAULT_META_DESCRIPTION_CHARS),
            "render.meta_description_chars",
        )?,
        card_excerpt_chars: positive(
            render
                .card_excerpt_chars
                .unwrap_or(DEFAULT_CARD_EXCERPT_CHARS),
            "render.card_excerpt_chars",
        )?,
        feed_excerpt_chars: positive(
            render
                .feed_excerpt_chars
                .unwrap_or(DEFAULT_FEED_EXCERPT_CHARS),
            "render.feed_excerpt_chars",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_seconds: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    public_url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    feed_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    cookie_name: Option<String>,
    secure: Option<bool>,
    max_age_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    meta_description_chars: Option<usize>,
    card_excerpt_chars: Option<usize>,
    feed_excerpt_chars: Option<usize>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive(value: usize, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
