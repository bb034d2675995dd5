//! Location capacity checks.
//!
//! Deliberately side-effect-free so callers can probe speculatively (a UI
//! hint, a dry run) without risk; the ledger owns making check-and-commit
//! atomic against concurrent writers.

use crate::entities::location;

/// Free capacity left at a location.
pub fn headroom(location: &location::Model) -> i32 {
    location.max_qty - location.current_qty
}

/// Whether `qty` more units fit without exceeding `max_qty`.
pub fn fits(location: &location::Model, qty: i32) -> bool {
    qty <= headroom(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn location(max_qty: i32, current_qty: i32) -> location::Model {
        location::Model {
            id: Uuid::new_v4(),
            code: "COLD-A-01".into(),
            zone: "COLD-A".into(),
            max_qty,
            current_qty,
            status: "OPEN".into(),
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        }
    }

    #[test]
    fn headroom_is_free_capacity() {
        assert_eq!(headroom(&location(1000, 950)), 50);
        assert_eq!(headroom(&location(1000, 0)), 1000);
        assert_eq!(headroom(&location(1000, 1000)), 0);
    }

    #[test]
    fn fits_at_the_boundary() {
        let loc = location(1000, 950);
        assert!(fits(&loc, 50));
        assert!(!fits(&loc, 51));
        assert!(fits(&loc, 0));
    }

    #[test]
    fn full_location_fits_nothing() {
        let loc = location(200, 200);
        assert!(!fits(&loc, 1));
        assert!(fits(&loc, 0));
    }
}
