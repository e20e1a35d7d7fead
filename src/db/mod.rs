//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{BookingOutcome, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const BOOKINGS: &str = "bookings";
    pub const ZONES: &str = "zones";
    pub const EQUIPMENT: &str = "equipment";
    pub const GROUP_CLASSES: &str = "group_classes";
}
