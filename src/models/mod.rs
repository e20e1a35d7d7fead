// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod achievement;
pub mod booking;
pub mod gym;
pub mod user;

pub use booking::{Booking, BookingStatus, BookingType};
pub use gym::{Equipment, GroupClass, Zone};
pub use user::{Gamification, Profile, User};
