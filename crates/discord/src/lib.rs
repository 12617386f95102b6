//! Discord integration - slash-command bot interface
//!
//! This crate provides the Discord interface for doibot:
//! - **Gateway** (`gateway`) - connection loop behind a transport trait
//! - **Slash Commands** (`commands`) - `/greet`, `/doi <identifier>`
//! - **Events** (`events`) - interaction envelopes and dispatch
//! - **Embeds** (`embeds`) - rich reply builders (embeds, fields, footer)
//!
//! # Getting Started
//!
//! 1. Create an application at https://discord.com/developers/applications
//! 2. Add a bot user and copy its token
//! 3. Register the `greet` and `doi` slash commands
//! 4. Set env var: `DOIBOT_DISCORD_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Discord Interactions → EventDispatcher → CommandRouter → Preview Service
//!                             ↓
//!                       Embed Reply → GatewayTransport
//! ```
//!
//! # Key Types
//!
//! - `GatewayRunner` - envelope loop with reconnection logic
//! - `EventDispatcher` - routes interactions to handlers
//! - `CommandRouter` - maps slash commands to replies
//! - `DoiPreviewService` - seam to the metadata pipeline

pub mod commands;
pub mod embeds;
pub mod events;
pub mod gateway;
