// # zonebotd - DNS console daemon
//
// Thin integration layer around `zonebot-core`:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the credential store, Cloudflare client and session engine
// 4. Long-polling Telegram and dispatching each update on its own task
//
// No DNS or session logic lives here.
//
// ## Configuration
//
// - `ZONEBOT_BOT_TOKEN`: Telegram bot token (required)
// - `ZONEBOT_OPERATOR_IDS`: Comma-separated Telegram user ids allowed to operate the bot (required)
// - `ZONEBOT_ACCOUNTS_FILE`: Path of the account credential file (default `accounts.json`)
// - `ZONEBOT_API_URL`: Cloudflare API base URL
// - `ZONEBOT_TELEGRAM_URL`: Telegram Bot API base URL (default `https://api.telegram.org`)
// - `ZONEBOT_HTTP_TIMEOUT_SECS`: Timeout for every outbound request (default 25)
// - `ZONEBOT_POLL_TIMEOUT_SECS`: Long-poll timeout for `getUpdates` (default 30)
// - `ZONEBOT_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ZONEBOT_BOT_TOKEN=123456:ABC-DEF
// export ZONEBOT_OPERATOR_IDS=123456789
// export ZONEBOT_ACCOUNTS_FILE=/var/lib/zonebot/accounts.json
//
// zonebotd
// ```

mod telegram;

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use zonebot_core::config::DEFAULT_API_BASE_URL;
use zonebot_core::engine::views;
use zonebot_core::state::open_credential_store;
use zonebot_core::traits::DnsApi;
use zonebot_core::{
    AccessPolicy, AllowList, BotConfig, CredentialStoreConfig, EngineEvent, MemorySessionRepository,
    Response, Screen, SessionEngine,
};
use zonebot_provider_cloudflare::CloudflareApi;

use telegram::{BotApi, Inbound};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default Telegram Bot API base URL
const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

/// Pause after a failed `getUpdates` before polling again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ZonebotExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ZonebotExitCode> for ExitCode {
    fn from(code: ZonebotExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bot_token: String,
    operator_ids: Vec<i64>,
    accounts_file: String,
    api_url: String,
    telegram_url: String,
    http_timeout_secs: u64,
    poll_timeout_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: env::var("ZONEBOT_BOT_TOKEN").context("ZONEBOT_BOT_TOKEN is required")?,
            operator_ids: parse_operator_ids(
                &env::var("ZONEBOT_OPERATOR_IDS").context("ZONEBOT_OPERATOR_IDS is required")?,
            )?,
            accounts_file: env::var("ZONEBOT_ACCOUNTS_FILE")
                .unwrap_or_else(|_| "accounts.json".to_string()),
            api_url: env::var("ZONEBOT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            telegram_url: env::var("ZONEBOT_TELEGRAM_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_URL.to_string()),
            http_timeout_secs: parse_secs("ZONEBOT_HTTP_TIMEOUT_SECS", 25)?,
            poll_timeout_secs: parse_secs("ZONEBOT_POLL_TIMEOUT_SECS", 30)?,
            log_level: env::var("ZONEBOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Library-level settings are checked by `BotConfig::validate`; this
    /// covers what only the daemon knows about.
    fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!(
                "ZONEBOT_BOT_TOKEN is required. \
                Set it via: export ZONEBOT_BOT_TOKEN=123456:ABC-DEF"
            );
        }

        // Telegram tokens look like `<bot id>:<secret>`
        if !self.bot_token.contains(':') {
            anyhow::bail!(
                "ZONEBOT_BOT_TOKEN does not look like a Telegram bot token. \
                Copy it exactly as BotFather printed it."
            );
        }

        if !self.telegram_url.starts_with("https://") && !self.telegram_url.starts_with("http://") {
            anyhow::bail!(
                "ZONEBOT_TELEGRAM_URL must use HTTP or HTTPS scheme. Got: {}",
                self.telegram_url
            );
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "ZONEBOT_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        if self.poll_timeout_secs > 50 {
            anyhow::bail!(
                "ZONEBOT_POLL_TIMEOUT_SECS must be between 0 and 50 seconds. Got: {}",
                self.poll_timeout_secs
            );
        }

        if let Some(parent) = std::path::Path::new(&self.accounts_file).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "ZONEBOT_ACCOUNTS_FILE parent directory does not exist: {}. \
                    Create it first: mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        parse_level(&self.log_level)?;

        self.bot_config().validate()?;
        Ok(())
    }

    /// Library configuration derived from the environment
    fn bot_config(&self) -> BotConfig {
        let mut config = BotConfig::new(self.operator_ids.clone());
        config.provider.api_base_url = self.api_url.trim_end_matches('/').to_string();
        config.provider.request_timeout_secs = self.http_timeout_secs;
        config.credentials = CredentialStoreConfig::File {
            path: self.accounts_file.clone(),
        };
        config
    }
}

fn parse_operator_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("ZONEBOT_OPERATOR_IDS contains a non-numeric id: '{}'", s))
        })
        .collect()
}

fn parse_secs(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds. Got: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ZONEBOT_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonebotExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonebotExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonebotExitCode::ConfigError.into();
    }

    info!("Starting zonebotd daemon");
    info!(
        "Configuration loaded: {} operator(s)",
        config.operator_ids.len()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonebotExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            ZonebotExitCode::RuntimeError
        } else {
            ZonebotExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let bot_config = config.bot_config();

    let credentials = open_credential_store(&bot_config.credentials).await?;
    let api = Arc::new(CloudflareApi::new(&bot_config.provider)?);
    info!("DNS provider: {} ({})", api.provider_name(), api.base_url());

    let (engine, events) = SessionEngine::new(
        credentials,
        Arc::new(MemorySessionRepository::new()),
        api,
        bot_config.engine.clone(),
    )?;
    let engine = Arc::new(engine);
    let policy: Arc<dyn AccessPolicy> = Arc::new(AllowList::from(&bot_config.access));

    let bot = Arc::new(BotApi::new(
        &config.telegram_url,
        &config.bot_token,
        Duration::from_secs(config.http_timeout_secs),
    )?);
    bot.delete_webhook(true)
        .await
        .context("Failed to switch the bot to long polling")?;

    let event_logger = tokio::spawn(log_events(events));

    info!("Polling for updates");
    let poll_timeout = Duration::from_secs(config.poll_timeout_secs);
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut offset = 0;
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                let signal = signal?;
                info!("Received shutdown signal: {}", signal);
                break;
            }
            updates = bot.get_updates(offset, poll_timeout) => match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(inbound) = Inbound::from_update(update) else {
                            continue;
                        };
                        if !policy.permits(inbound.user()) {
                            debug!(user = inbound.user(), "Dropping update from unknown identity");
                            continue;
                        }
                        tokio::spawn(dispatch(bot.clone(), engine.clone(), inbound));
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {:#}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    info!("Shutting down daemon");
    event_logger.abort();
    Ok(())
}

/// Run one update through the engine and deliver the result
async fn dispatch(bot: Arc<BotApi>, engine: Arc<SessionEngine>, inbound: Inbound) {
    let response = match engine.handle(inbound.event()).await {
        Ok(response) => response,
        Err(e) => {
            error!(user = inbound.user(), "Engine failed: {}", e);
            Response::alert(e.user_message())
        }
    };

    if let Err(e) = deliver(&bot, &inbound, &response).await {
        warn!(user = inbound.user(), "Failed to deliver response: {:#}", e);
    }
}

/// Text answers are new messages; button presses edit the pressed message
async fn deliver(bot: &BotApi, inbound: &Inbound, response: &Response) -> Result<()> {
    match inbound {
        Inbound::Text { chat, .. } => {
            if let Some(notice) = &response.notice {
                bot.send_message(*chat, &Screen::text(views::escape(&notice.text)))
                    .await?;
            }
            if let Some(screen) = &response.screen {
                bot.send_message(*chat, screen).await?;
            }
        }
        Inbound::Callback {
            id,
            chat,
            message_id,
            ..
        } => {
            bot.answer_callback(id, response.notice.as_ref()).await?;
            if let Some(screen) = &response.screen {
                bot.edit_message(*chat, *message_id, screen).await?;
            }
        }
    }
    Ok(())
}

/// Drain engine events into the log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::StaleSelector { user, token } => {
                debug!(user, %token, "Stale selection")
            }
            EngineEvent::HandlerFailed { user, error } => {
                warn!(user, %error, "Operation failed")
            }
            EngineEvent::WizardStarted { user, kind } => {
                debug!(user, %kind, "Wizard started")
            }
            EngineEvent::WizardDiscarded { user, kind } => {
                debug!(user, %kind, "Wizard discarded")
            }
            other => info!(event = ?other, "Engine event"),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
