//! cadence-client - HTTP client for the cadence scheduling service.
//!
//! [`ScheduleClient`] implements [`cadence_core::ScheduleService`] over the
//! service's JSON routes, so it can be handed straight to a
//! [`cadence_core::Dashboard`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cadence_client::ScheduleClient;
//! use cadence_core::Dashboard;
//!
//! let client = ScheduleClient::new("http://localhost:5000")?;
//! let dashboard = Dashboard::new(Arc::new(client));
//! dashboard.load().await?;
//! ```

mod client;

pub use cadence_core::traits::ScheduleService;
pub use client::ScheduleClient;
