use async_trait::async_trait;
use doibot_metadata::{DoiPreviewService, PreviewError, WorkPreview};
use thiserror::Error;
use tracing::error;

use crate::embeds::{self, Reply};

/// One slash-command invocation as delivered by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    /// Value of the first string option, when the command takes one.
    pub option: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    pub user_display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Greet,
    Doi { input: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

/// Map a payload onto the bot's command set. A registered `doi` invocation
/// always carries its required option; a missing one is treated as empty
/// input and rejected downstream.
pub fn parse_slash_command(
    payload: &SlashCommandPayload,
) -> Result<BotCommand, CommandParseError> {
    match payload.command.trim_start_matches('/') {
        "greet" => Ok(BotCommand::Greet),
        "doi" => Ok(BotCommand::Doi { input: payload.option.clone().unwrap_or_default() }),
        other => Err(CommandParseError::UnsupportedCommand(other.to_owned())),
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: DoiPreviewService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Every recognized command resolves to exactly one reply; preview
    /// failures are converted to their user-facing message here instead of
    /// propagating.
    pub async fn route(&self, payload: &SlashCommandPayload) -> Result<Reply, CommandParseError> {
        match parse_slash_command(payload)? {
            BotCommand::Greet => Ok(embeds::greet_message(&payload.user_display_name)),
            BotCommand::Doi { input } => Ok(match self.service.preview(&input).await {
                Ok(preview) => embeds::work_preview_message(&preview),
                Err(preview_error) => preview_error_reply(&preview_error),
            }),
        }
    }
}

pub fn preview_error_reply(error: &PreviewError) -> Reply {
    match error {
        PreviewError::NotAResolverLink { input } => Reply::text(format!(
            "The provided link `{input}` does not appear to be a DOI.org link."
        )),
        PreviewError::EmptyInput => Reply::text("Please provide a DOI or a doi.org link."),
        PreviewError::NotFound { doi } => Reply::text(format!(
            "Could not find information for DOI: `{doi}`. It might be invalid."
        )),
        PreviewError::Api { status } => Reply::text(format!(
            "An error occurred while fetching DOI information (Status: {status})."
        )),
        PreviewError::Unreachable => {
            Reply::text("Could not connect to the Crossref API. Please try again later.")
        }
        PreviewError::Unexpected(detail) => {
            error!(detail = %detail, "unexpected preview failure");
            Reply::text("An unexpected error occurred while processing your request.")
        }
    }
}

/// Stand-in service for wiring and tests; replies as if the metadata API
/// were unreachable.
#[derive(Default)]
pub struct NoopPreviewService;

#[async_trait]
impl DoiPreviewService for NoopPreviewService {
    async fn preview(&self, _input: &str) -> Result<WorkPreview, PreviewError> {
        Err(PreviewError::Unreachable)
    }
}
