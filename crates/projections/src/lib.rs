//! Read models fed by appointment events.
//!
//! This crate provides the query side of the booking core:
//! - [`Projection`] trait for folding appointment events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for fanning events out to projections, either
//!   directly or through a [`ChannelPublisher`]
//! - Two views: open windows per staff day, and staff agendas
//!
//! Read models are best-effort. Booking decisions never consult them.

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::{ChannelPublisher, EventReceiver, ProjectionProcessor};
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{AgendaEntry, AvailableSlotsView, StaffAgendaView};
