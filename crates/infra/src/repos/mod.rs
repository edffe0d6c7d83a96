pub mod bookings;
pub mod rooms;
pub mod time_slots;

pub use bookings::{BookingFilter, BookingStatus, CreateBooking};
pub use rooms::{CreateRoom, RoomScope, UpdateRoom};
