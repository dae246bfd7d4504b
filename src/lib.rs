//! Session lifecycle and connectivity core for the SUBG QUIZ client.
//!
//! Two long-lived components are built once at startup and shared through an
//! [`context::AppContext`]:
//!
//! - [`session::SessionStore`] owns who is logged in, keeps a persisted
//!   token/user snapshot, and re-verifies it with the server at boot.
//! - [`network::NetworkMonitor`] tracks connectivity and raises one notice per
//!   connectivity class change.
//!
//! Neither component returns errors to its callers: credential flows resolve
//! to `bool` and user-visible failures go through a [`notify::Notifier`].

pub mod api;
pub mod config;
pub mod context;
pub mod network;
pub mod notify;
pub mod retry;
pub mod session;
pub mod storage;
