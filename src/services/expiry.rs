//! Expiry-horizon classification for stored lots.
//!
//! The classification is a derived view, never persisted: it is recomputed
//! on every read against the caller-supplied reference date, so a lot's
//! tier shifts automatically as time passes without any background job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryStatus {
    Expired,
    Critical,
    Warning,
    Normal,
}

/// Whole days from `today` until `expiry`; negative once past.
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// Classifies an expiry date relative to `today`.
pub fn classify(expiry: NaiveDate, today: NaiveDate) -> ExpiryStatus {
    match days_until_expiry(expiry, today) {
        d if d < 0 => ExpiryStatus::Expired,
        0..=7 => ExpiryStatus::Critical,
        8..=30 => ExpiryStatus::Warning,
        _ => ExpiryStatus::Normal,
    }
}
