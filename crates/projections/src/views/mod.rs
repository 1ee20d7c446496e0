//! Read model views for the query side.

pub mod available_slots;
pub mod staff_agenda;

pub use available_slots::AvailableSlotsView;
pub use staff_agenda::{AgendaEntry, StaffAgendaView};
