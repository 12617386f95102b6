use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_ABSTRACT: &str = "No abstract available.";

const JATS_OPEN: &str = "<jats:p>";
const JATS_CLOSE: &str = "</jats:p>";

/// Display truncation limit for the abstract, in characters.
pub const DESCRIPTION_LIMIT: usize = 300;

/// One Crossref work, reduced to the fields the preview shows.
///
/// Built once per successful lookup and never mutated. Every field is
/// best-effort; display accessors degrade absent fields to `"N/A"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkSummary {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub venue: Option<String>,
    pub year: Option<i64>,
    pub abstract_text: Option<String>,
}

impl WorkSummary {
    /// Shape the raw `/works/{doi}` response body into a summary.
    ///
    /// The interesting payload sits under the optional top-level `message`
    /// object. Each field applies its own ordered fallback chain and is
    /// independent of the others.
    pub fn from_response(body: &Value) -> Self {
        let message = &body["message"];

        Self {
            title: first_string(&message["title"]),
            authors: author_names(&message["author"]),
            venue: venue(message),
            year: year(message),
            abstract_text: abstract_text(message),
        }
    }

    pub fn title_display(&self) -> &str {
        self.title.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn authors_display(&self) -> String {
        if self.authors.is_empty() {
            NOT_AVAILABLE.to_owned()
        } else {
            self.authors.join(", ")
        }
    }

    pub fn venue_display(&self) -> &str {
        self.venue.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn year_display(&self) -> String {
        self.year.map_or_else(|| NOT_AVAILABLE.to_owned(), |year| year.to_string())
    }

    pub fn abstract_display(&self) -> &str {
        self.abstract_text.as_deref().unwrap_or(NO_ABSTRACT)
    }

    /// The abstract as shown in the embed body, truncated to
    /// [`DESCRIPTION_LIMIT`] characters at a word boundary.
    pub fn description(&self) -> String {
        truncate_description(self.abstract_display())
    }
}

fn first_string(value: &Value) -> Option<String> {
    value.as_array()?.first()?.as_str().map(str::to_owned)
}

/// Venue precedence: container-title, then the event name (conferences),
/// then the publisher.
fn venue(message: &Value) -> Option<String> {
    if let Some(container) = first_string(&message["container-title"]) {
        return Some(container);
    }

    match &message["event"] {
        Value::Object(event) => {
            if let Some(name) = event.get("name").and_then(Value::as_str) {
                return Some(name.to_owned());
            }
            // A structured event without a name has nothing displayable.
        }
        Value::String(event) => return Some(event.clone()),
        _ => {}
    }

    message["publisher"].as_str().map(str::to_owned)
}

/// Year precedence: published-print, published-online, created. Each source
/// nests the year as `date-parts[0][0]`.
fn year(message: &Value) -> Option<i64> {
    ["published-print", "published-online", "created"]
        .into_iter()
        .find_map(|source| message[source]["date-parts"][0][0].as_i64())
}

fn author_names(value: &Value) -> Vec<String> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let parts: Vec<&str> = [&entry["given"], &entry["family"]]
                .into_iter()
                .filter_map(Value::as_str)
                .filter(|part| !part.is_empty())
                .collect();

            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        })
        .collect()
}

fn abstract_text(message: &Value) -> Option<String> {
    let raw = message["abstract"].as_str()?;
    Some(strip_jats(raw))
}

/// Crossref abstracts often arrive wrapped in JATS paragraph markup. When
/// the text starts with the opening tag, every occurrence of the pair is
/// removed, not just the first.
fn strip_jats(raw: &str) -> String {
    if raw.starts_with(JATS_OPEN) {
        raw.replace(JATS_OPEN, "").replace(JATS_CLOSE, "")
    } else {
        raw.to_owned()
    }
}

/// Truncate to [`DESCRIPTION_LIMIT`] characters at the last word boundary
/// within the limit, appending `...`. Counts characters rather than bytes so
/// a multi-byte abstract is never split inside a code point. A prefix with
/// no space at all is hard-cut at the limit.
pub fn truncate_description(text: &str) -> String {
    let Some((cut, _)) = text.char_indices().nth(DESCRIPTION_LIMIT) else {
        return text.to_owned();
    };

    let prefix = &text[..cut];
    let boundary = prefix.rfind(' ').unwrap_or(prefix.len());
    format!("{}...", &prefix[..boundary])
}
