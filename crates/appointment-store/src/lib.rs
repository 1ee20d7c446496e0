pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{AppointmentId, StaffId, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryAppointmentStore;
pub use postgres::PostgresAppointmentStore;
pub use query::AppointmentQuery;
pub use store::{AppointmentStore, AppointmentStoreExt};
