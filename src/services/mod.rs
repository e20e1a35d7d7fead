// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod achievements;
pub mod assistant;
pub mod booking;
pub mod google_identity;

pub use assistant::AssistantService;
pub use booking::{BookingRequest, BookingService};
pub use google_identity::{GoogleIdentity, GoogleIdentityVerifier, IdentityError};
