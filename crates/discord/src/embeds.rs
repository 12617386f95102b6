use doibot_metadata::WorkPreview;
use serde::Serialize;

/// Default accent color for preview embeds (Discord blue).
pub const EMBED_COLOR_BLUE: u32 = 0x3498db;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

pub struct EmbedBuilder {
    embed: Embed,
}

impl EmbedBuilder {
    pub fn new() -> Self {
        Self {
            embed: Embed {
                title: None,
                url: None,
                description: None,
                color: None,
                fields: Vec::new(),
                footer: None,
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.embed.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.embed.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.embed.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.embed.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.embed.fields.push(EmbedField { name: name.into(), value: value.into(), inline });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.embed.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn build(self) -> Embed {
        self.embed
    }
}

impl Default for EmbedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One user-visible follow-up message: plain text, rich embeds, or both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), embeds: Vec::new() }
    }

    pub fn embed(embed: Embed) -> Self {
        Self { content: None, embeds: vec![embed] }
    }
}

pub fn greet_message(display_name: &str) -> Reply {
    Reply::text(format!("Hello, {display_name}!"))
}

/// The rich preview for a resolved work: title linked to the resolver, the
/// truncated abstract as body, author/venue/year fields and a DOI footer.
pub fn work_preview_message(preview: &WorkPreview) -> Reply {
    let summary = &preview.summary;

    Reply::embed(
        EmbedBuilder::new()
            .title(summary.title_display())
            .url(preview.doi.resolver_url())
            .description(summary.description())
            .color(EMBED_COLOR_BLUE)
            .field("Authors", summary.authors_display(), false)
            .field("Journal/Conference", summary.venue_display(), true)
            .field("Published Year", summary.year_display(), true)
            .footer(format!("DOI: {}", preview.doi))
            .build(),
    )
}
