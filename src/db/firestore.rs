// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + gamification storage)
//! - Bookings (reservation log)
//! - Gym catalog (zones, equipment, group classes)
//!
//! The multi-document sequences the booking engine needs (booking write +
//! class roster + XP counters, and the streak/achievement refresh) run as
//! Firestore transactions. Reads inside those sequences carry the
//! transaction's consistency selector, so a concurrent commit that
//! invalidates a read aborts the transaction; aborted attempts are retried
//! with fresh reads up to a bounded number of times.

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::XpAward;
use crate::models::{Booking, BookingType, Equipment, GroupClass, User, Zone};
use crate::services::achievements;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use firestore::FirestoreConsistencySelector;

/// Attempts per optimistic transaction before giving up.
const MAX_TXN_ATTEMPTS: u32 = 3;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Result of the transactional booking write.
#[derive(Debug)]
pub enum BookingOutcome {
    /// Booking committed; XP/level counters were updated in the same
    /// transaction.
    Created { booking: Booking, award: XpAward },
    /// A booking with this request ID already exists; nothing was written.
    Replayed { booking: Booking },
}

/// Outcome of one transaction attempt.
enum TxnError {
    /// The commit lost a read-write conflict; retry with fresh reads.
    Aborted(String),
    /// A business or infrastructure failure; surface it as is.
    Fatal(AppError),
}

impl From<AppError> for TxnError {
    fn from(e: AppError) -> Self {
        TxnError::Fatal(e)
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return 503 if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Unavailable("Database not connected (offline mode)".to_string())
        })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user by their Google subject claim.
    pub async fn find_user_by_google_id(
        &self,
        google_id: &str,
    ) -> Result<Option<User>, AppError> {
        let google_id = google_id.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("google_id").eq(google_id.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    // ─── Gym Catalog Operations ──────────────────────────────────

    /// All zones in the gym.
    pub async fn get_zones(&self) -> Result<Vec<Zone>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ZONES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a piece of equipment by ID.
    pub async fn get_equipment(&self, item_id: &str) -> Result<Option<Equipment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EQUIPMENT)
            .obj()
            .one(item_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a group class by ID.
    pub async fn get_class(&self, class_id: &str) -> Result<Option<GroupClass>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GROUP_CLASSES)
            .obj()
            .one(class_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a zone (catalog administration).
    pub async fn upsert_zone(&self, zone: &Zone) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ZONES)
            .document_id(&zone.id)
            .object(zone)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create or update a piece of equipment (catalog administration).
    pub async fn upsert_equipment(&self, equipment: &Equipment) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EQUIPMENT)
            .document_id(&equipment.id)
            .object(equipment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create or update a group class (catalog administration).
    pub async fn upsert_class(&self, class: &GroupClass) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GROUP_CLASSES)
            .document_id(&class.id)
            .object(class)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Booking Operations ──────────────────────────────────────

    /// Get a booking by ID.
    pub async fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BOOKINGS)
            .obj()
            .one(booking_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All bookings for a user, newest first.
    pub async fn get_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Confirmed bookings for one item on one day (conflict scan input).
    pub async fn get_confirmed_bookings_for_item(
        &self,
        item_id: &str,
        day: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let item_id = item_id.to_string();
        let day = format_utc_rfc3339(day);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(move |q| {
                q.for_all([
                    q.field("item_id").eq(item_id.clone()),
                    q.field("booking_date").eq(day.clone()),
                    q.field("status").eq("confirmed"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Booking Creation ─────────────────────────────────

    /// Atomically create a booking: persist the booking document, add the
    /// user to the class roster (for class bookings), and update the
    /// user's XP/level counters.
    ///
    /// All reads carry the transaction's consistency selector and all
    /// writes are staged on the same transaction, so two requests racing
    /// for the last class seat cannot both commit: the loser aborts at
    /// commit, retries with a fresh roster read, and fails the capacity
    /// check. The same mechanism keeps concurrent XP awards for one user
    /// from overwriting each other.
    ///
    /// If a booking with this ID already exists (client retry with the same
    /// request ID), nothing is written and the stored booking is returned;
    /// a request ID that belongs to a different user is rejected.
    pub async fn create_booking_atomic(
        &self,
        booking: &Booking,
    ) -> Result<BookingOutcome, AppError> {
        let mut last_abort = String::new();

        for attempt in 1..=MAX_TXN_ATTEMPTS {
            match self.try_create_booking(booking).await {
                Ok(outcome) => return Ok(outcome),
                Err(TxnError::Fatal(e)) => return Err(e),
                Err(TxnError::Aborted(msg)) => {
                    tracing::debug!(
                        booking_id = %booking.id,
                        attempt,
                        error = %msg,
                        "Booking transaction aborted; retrying"
                    );
                    last_abort = msg;
                }
            }
        }

        Err(AppError::Database(format!(
            "Booking transaction failed after {} attempts: {}",
            MAX_TXN_ATTEMPTS, last_abort
        )))
    }

    /// One optimistic attempt of the booking transaction.
    async fn try_create_booking(&self, booking: &Booking) -> Result<BookingOutcome, TxnError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let consistency =
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone());

        // 1. Idempotency: a retry with the same request ID maps to the same
        //    document ID and must not double-book or double-award XP. The
        //    stored booking is only replayed to its own user.
        let existing: Option<Booking> = self
            .get_client()?
            .clone_with_consistency_selector(consistency.clone())
            .fluent()
            .select()
            .by_id_in(collections::BOOKINGS)
            .obj()
            .one(&booking.id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(existing) = existing {
            let _ = transaction.rollback().await;
            if existing.user_id != booking.user_id {
                return Err(TxnError::Fatal(AppError::Conflict(
                    "This requestId is already in use".to_string(),
                )));
            }
            tracing::debug!(
                booking_id = %booking.id,
                user_id = %booking.user_id,
                "Booking already exists (idempotent replay)"
            );
            return Ok(BookingOutcome::Replayed { booking: existing });
        }

        // 2. For class bookings, re-check capacity and membership on the
        //    roster read registered on the transaction. This is the
        //    authoritative check; the pre-flight check in the service is
        //    only for fast failure.
        let updated_class = if booking.booking_type == BookingType::Class {
            let class: GroupClass = self
                .get_client()?
                .clone_with_consistency_selector(consistency.clone())
                .fluent()
                .select()
                .by_id_in(collections::GROUP_CLASSES)
                .obj()
                .one(&booking.item_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Class {} not found", booking.item_id))
                })?;

            if class.has_member(&booking.user_id) {
                let _ = transaction.rollback().await;
                return Err(TxnError::Fatal(AppError::Conflict(format!(
                    "You are already booked into \"{}\"",
                    class.title
                ))));
            }
            if class.is_full() {
                let _ = transaction.rollback().await;
                return Err(TxnError::Fatal(AppError::Conflict(format!(
                    "Class \"{}\" is full ({} of {} spots taken)",
                    class.title,
                    class.booked_user_ids.len(),
                    class.max_capacity
                ))));
            }

            let mut class = class;
            class.booked_user_ids.push(booking.user_id.clone());
            Some(class)
        } else {
            None
        };

        // 3. Read the user on the transaction and apply the XP award in
        //    memory.
        let mut user: User = self
            .get_client()?
            .clone_with_consistency_selector(consistency)
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&booking.user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", booking.user_id)))?;

        let award = user.gamification.award_xp(booking.duration_minutes);

        // 4. Stage all writes in the transaction.
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::BOOKINGS)
            .document_id(&booking.id)
            .object(booking)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add booking to transaction: {}", e))
            })?;

        if let Some(class) = &updated_class {
            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::GROUP_CLASSES)
                .document_id(&class.id)
                .object(class)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add roster to transaction: {}", e))
                })?;
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        // 5. Commit; a conflict with a concurrent commit aborts here.
        transaction
            .commit()
            .await
            .map_err(|e| TxnError::Aborted(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            gained_xp = award.gained_xp,
            level = award.level,
            leveled_up = award.leveled_up,
            "Booking created atomically"
        );

        Ok(BookingOutcome::Created {
            booking: booking.clone(),
            award,
        })
    }

    // ─── Atomic Profile Refresh ──────────────────────────────────

    /// Advance the user's activity streak and re-evaluate achievements,
    /// committing the user document through a transaction.
    ///
    /// The user read carries the transaction's consistency selector, so a
    /// concurrent XP award or second profile fetch aborts the commit and
    /// the attempt is retried against the fresh state. `bookings` and
    /// `zones` are query results fetched by the caller; achievement
    /// unlocks are monotonic unions, so stale query input can only delay
    /// an unlock, never revoke one. Re-running the refresh is always safe:
    /// the same-day streak branch is a no-op and skips the write entirely.
    ///
    /// Returns the refreshed user.
    pub async fn refresh_profile_atomic(
        &self,
        user_id: &str,
        bookings: &[Booking],
        zones: &[Zone],
        today: DateTime<Utc>,
    ) -> Result<User, AppError> {
        self.user_txn_with_retry(user_id, "Profile refresh", |user| {
            let streak_changed = user.gamification.advance_streak(today);
            let newly_unlocked = achievements::evaluate(user, bookings, zones, today);

            if !streak_changed && newly_unlocked.is_empty() {
                return false;
            }

            for id in &newly_unlocked {
                user.unlocked_achievements.insert(id.to_string());
            }
            if !newly_unlocked.is_empty() {
                tracing::info!(
                    user_id,
                    achievements = ?newly_unlocked,
                    "Achievements unlocked"
                );
            }
            true
        })
        .await
    }

    /// Apply profile field edits and re-evaluate achievements,
    /// committing the user document through a transaction.
    ///
    /// The edits run against the freshly-read document on every attempt,
    /// so a concurrent XP award committed between read and write aborts
    /// the commit instead of being clobbered by a stale gamification
    /// snapshot.
    pub async fn update_profile_atomic<F>(
        &self,
        user_id: &str,
        apply: F,
        bookings: &[Booking],
        zones: &[Zone],
        today: DateTime<Utc>,
    ) -> Result<User, AppError>
    where
        F: Fn(&mut User),
    {
        self.user_txn_with_retry(user_id, "Profile update", |user| {
            apply(user);
            let newly_unlocked = achievements::evaluate(user, bookings, zones, today);
            for id in &newly_unlocked {
                user.unlocked_achievements.insert(id.to_string());
            }
            if !newly_unlocked.is_empty() {
                tracing::info!(
                    user_id,
                    achievements = ?newly_unlocked,
                    "Achievements unlocked on profile update"
                );
            }
            true
        })
        .await
    }

    /// Transactional read-modify-write of one user document with retry on
    /// commit abort. `mutate` returns whether the document changed; when
    /// it did not, the transaction is rolled back and no write happens.
    async fn user_txn_with_retry<M>(
        &self,
        user_id: &str,
        op: &'static str,
        mutate: M,
    ) -> Result<User, AppError>
    where
        M: Fn(&mut User) -> bool,
    {
        let mut last_abort = String::new();

        for attempt in 1..=MAX_TXN_ATTEMPTS {
            match self.try_user_txn(user_id, &mutate).await {
                Ok(user) => return Ok(user),
                Err(TxnError::Fatal(e)) => return Err(e),
                Err(TxnError::Aborted(msg)) => {
                    tracing::debug!(
                        user_id,
                        attempt,
                        error = %msg,
                        "{} transaction aborted; retrying", op
                    );
                    last_abort = msg;
                }
            }
        }

        Err(AppError::Database(format!(
            "{} transaction failed after {} attempts: {}",
            op, MAX_TXN_ATTEMPTS, last_abort
        )))
    }

    /// One optimistic attempt of a user read-modify-write.
    async fn try_user_txn<M>(&self, user_id: &str, mutate: &M) -> Result<User, TxnError>
    where
        M: Fn(&mut User) -> bool,
    {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let consistency =
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone());

        let mut user: User = self
            .get_client()?
            .clone_with_consistency_selector(consistency)
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if !mutate(&mut user) {
            let _ = transaction.rollback().await;
            return Ok(user);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| TxnError::Aborted(format!("Transaction commit failed: {}", e)))?;

        Ok(user)
    }
}
