pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod clock;
pub mod rooms;

pub use availability::{AvailabilityQuery, AvailabilityResolver};
pub use bookings::{BookingGuard, NewBooking};
pub use catalog::{load_catalog, sync_catalog};
pub use clock::Clock;
pub use rooms::{RoomDirectory, RoomPatch};
