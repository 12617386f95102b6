//! Crossref metadata lookup and formatting for doibot.
//!
//! - **Works client** (`client`) - `GET {base}/works/{doi}` with typed
//!   failure classification
//! - **Work summary** (`work`) - ordered fallback rules over the untyped
//!   Crossref payload
//! - **Preview service** (`preview`) - normalize -> fetch -> format

pub mod client;
pub mod preview;
pub mod work;

pub use client::{CrossrefClient, FetchError, WorksClient};
pub use preview::{CrossrefPreviewService, DoiPreviewService, PreviewError, WorkPreview};
pub use work::WorkSummary;
