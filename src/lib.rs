// SPDX-License-Identifier: MIT

//! GRINDZONE: gym membership backend.
//!
//! This crate provides the booking and gamification API: equipment and
//! group-class reservations with conflict and capacity checks, a daily
//! activity streak, achievement unlocks, and XP/leveling.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AssistantService, BookingService, GoogleIdentityVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub booking_service: BookingService,
    pub identity_verifier: Arc<GoogleIdentityVerifier>,
    pub assistant_service: AssistantService,
}
