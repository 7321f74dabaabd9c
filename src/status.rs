use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::types::FoodStatus;

/// Items expiring within this many days (inclusive) count as `Expiring`.
/// Unrelated to the notification lead times in app settings.
pub const EXPIRING_WINDOW_DAYS: i64 = 3;

/// Past this many days out, labels switch from a relative phrase to an
/// absolute date. Deliberately not the same constant as the status window.
const ABSOLUTE_LABEL_AFTER_DAYS: i64 = 7;

/// Current UTC calendar date, the reference date for all derivations.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Signed whole days from `today` until `expiration`. Negative once past.
pub fn days_until(expiration: Date, today: Date) -> i64 {
    (expiration - today).whole_days()
}

pub fn compute_status(expiration: Date, today: Date) -> FoodStatus {
    let days = days_until(expiration, today);
    if days < 0 {
        FoodStatus::Expired
    } else if days <= EXPIRING_WINDOW_DAYS {
        FoodStatus::Expiring
    } else {
        FoodStatus::Fresh
    }
}

/// Human-readable phrase for an expiration date relative to `today`.
pub fn expiration_label(expiration: Date, today: Date) -> String {
    let days = days_until(expiration, today);
    if days < 0 {
        let ago = -days;
        let plural = if ago == 1 { "" } else { "s" };
        format!("expired {ago} day{plural} ago")
    } else if days == 0 {
        "expires today".to_string()
    } else if days == 1 {
        "expires tomorrow".to_string()
    } else if days <= ABSOLUTE_LABEL_AFTER_DAYS {
        format!("expires in {days} days")
    } else {
        format!("expires on {}", format_short_date(expiration))
    }
}

/// "Aug 12" style date, used once labels go absolute.
pub fn format_short_date(date: Date) -> String {
    date.format(format_description!("[month repr:short] [day padding:none]"))
        .unwrap_or_else(|_| date.to_string())
}
