//! Input readers.

mod bookings;

pub use bookings::{parse_month, read_bookings, read_bookings_file, BookingEvent};
