pub mod bookings;
pub mod extract;
pub mod rooms;
pub mod timeslots;
