//! Shared context, error types and prompts for command handlers.

use std::fmt::{self, Display, Formatter};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use romanizer_client::{
    AlwaysConfirm, ClientConfig, ClientError, Confirm, HttpApi, HydrationSettings,
    PrimingSettings,
};
use romanizer_events::EventBus;
use url::Url;

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Map a client error onto the CLI's validation/failure split.
///
/// Rejections the user can fix by changing arguments (bad ids, 4xx answers)
/// are validation errors; everything else is an operational failure.
pub(crate) fn client_failure(err: ClientError) -> CliError {
    let operation = err.operation();
    match err {
        ClientError::InvalidRequest { reason, .. } => {
            CliError::validation(format!("{operation}: {reason}"))
        }
        ClientError::NotFound { resource, .. } => {
            CliError::validation(format!("{operation}: '{resource}' not found"))
        }
        ClientError::Server {
            status: Some(400..=499),
            message: Some(message),
            ..
        } => CliError::validation(format!("{operation}: {message}")),
        other => CliError::failure(anyhow::Error::new(other).context(format!("{operation} failed"))),
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) api: Arc<HttpApi>,
    pub(crate) config: ClientConfig,
    pub(crate) events: EventBus,
}

impl AppContext {
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut config = ClientConfig::new(cli.api_url.clone());
        config.request_timeout = Duration::from_secs(cli.timeout);
        config.hydration = HydrationSettings {
            interval: Duration::from_millis(cli.track_poll_ms),
            max_attempts: cli.track_max_attempts,
        };
        config.priming = PrimingSettings {
            interval: Duration::from_millis(cli.priming_poll_ms),
        };
        Self::new(config)
    }

    pub(crate) fn new(config: ClientConfig) -> CliResult<Self> {
        config
            .validate()
            .map_err(|err| CliError::validation(err.to_string()))?;
        let api = HttpApi::new(&config).map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context("failed to build HTTP client"))
        })?;
        Ok(Self {
            api: Arc::new(api),
            config,
            events: EventBus::new(),
        })
    }
}

/// Reads a yes/no answer from stdin after printing the prompt on stderr.
pub(crate) struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_affirmative(&answer)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Pick the confirmation source for a destructive command.
///
/// `--yes` always confirms; otherwise stdin must be a terminal so the prompt
/// can be answered.
pub(crate) fn confirmer(assume_yes: bool) -> CliResult<Box<dyn Confirm>> {
    if assume_yes {
        return Ok(Box::new(AlwaysConfirm));
    }
    if io::stdin().is_terminal() {
        Ok(Box::new(StdinConfirm))
    } else {
        Err(CliError::validation(
            "confirmation required; pass --yes when stdin is not a terminal",
        ))
    }
}

pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Trim identifiers and reject blank ones.
pub(crate) fn normalize_ids(ids: &[String], what: &str) -> CliResult<Vec<String>> {
    let mut normalized = Vec::with_capacity(ids.len());
    for id in ids {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CliError::validation(format!("{what} must not be empty")));
        }
        normalized.push(trimmed.to_string());
    }
    if normalized.is_empty() {
        return Err(CliError::validation(format!("at least one {what} is required")));
    }
    Ok(normalized)
}
