//! RabbitMQ management API collection
//!
//! Fetches the `overview`, `queues`, `exchanges` and `nodes/<id>` collections
//! and exposes them as [`ResourceDocument`]s.
//!
//! # Example
//!
//! ```ignore
//! use rabbitmq_watcher::collector::{ManagementClient, Resource};
//!
//! let client = ManagementClient::new("http://127.0.0.1:15672", 5000)?.with_auth("guest", "guest");
//! let overview = client.get(&Resource::Overview).await?;
//! ```

mod client;
mod document;

pub use client::{ManagementClient, Resource};
pub use document::{coerce_number, CollectResult, ResourceDocument, Section};
