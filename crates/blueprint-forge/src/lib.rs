//! Chat-driven project scaffolder.
//!
//! Two-phase pipeline: a drafting phase asks the generation service for a
//! bounded file manifest (a "blueprint"), the requester confirms it, then a
//! build phase synthesizes each file in manifest order with a rolling
//! context of everything written so far, archives the sandbox, and ships
//! the result through the transport collaborator.
//!
//! The transport (Telegram) and the generation backend are consumed through
//! the [`transport::Notifier`] and [`client::ChatService`] traits; the core
//! pipeline never talks HTTP directly.

pub mod blueprint;
pub mod client;
pub mod config;
pub mod context;
pub mod draft;
pub mod error;
pub mod fences;
pub mod health;
pub mod naming;
pub mod orchestrator;
pub mod package;
pub mod pipeline;
pub mod prompts;
pub mod sandbox;
pub mod store;
pub mod transport;
pub mod verify;
