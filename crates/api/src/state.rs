use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BookingConfig;
use crate::services::{AvailabilityResolver, BookingGuard, Clock, RoomDirectory};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    config: Arc<BookingConfig>,
    clock: Clock,
    rooms: RoomDirectory,
    availability: AvailabilityResolver,
    bookings: BookingGuard,
}

impl AppState {
    pub fn new(db: PgPool, config: BookingConfig) -> Self {
        Self::with_clock(db, config, Clock::System)
    }

    pub fn with_clock(db: PgPool, config: BookingConfig, clock: Clock) -> Self {
        let config = Arc::new(config);

        Self {
            rooms: RoomDirectory::new(db.clone()),
            availability: AvailabilityResolver::new(db.clone()),
            bookings: BookingGuard::new(db.clone(), config.clone(), clock),
            db,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    pub fn availability(&self) -> &AvailabilityResolver {
        &self.availability
    }

    pub fn bookings(&self) -> &BookingGuard {
        &self.bookings
    }
}
