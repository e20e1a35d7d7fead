//! Static achievement catalog.
//!
//! The unlock predicates live in `services::achievements`; this module only
//! holds the badge metadata returned to clients.

/// A named, one-way-unlockable badge.
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// All badge definitions, in catalog order.
pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "ach01",
        name: "First Steps",
        description: "Complete your first training",
    },
    Achievement {
        id: "ach02",
        name: "Iron Month",
        description: "Stay active 30 days in a row",
    },
    Achievement {
        id: "ach03",
        name: "Early Bird",
        description: "Complete 20 trainings starting before 7:00",
    },
    Achievement {
        id: "ach04",
        name: "Centurion",
        description: "Complete 100 trainings",
    },
    Achievement {
        id: "ach05",
        name: "Explorer",
        description: "Train in every zone of the gym",
    },
    Achievement {
        id: "ach06",
        name: "Team Player",
        description: "Book 5 group classes",
    },
    Achievement {
        id: "ach07",
        name: "Night Owl",
        description: "Complete 10 trainings starting at 22:00 or later",
    },
    Achievement {
        id: "ach08",
        name: "Open Book",
        description: "Fill out your whole profile",
    },
    Achievement {
        id: "ach09",
        name: "Planner",
        description: "Have 7 upcoming confirmed bookings",
    },
    Achievement {
        id: "ach10",
        name: "Fast Starter",
        description: "Complete a training within 3 days of joining",
    },
    Achievement {
        id: "ach11",
        name: "Habit Machine",
        description: "Keep a 30-day activity streak",
    },
];

/// Look up a badge by ID.
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("ach01").unwrap().name, "First Steps");
        assert!(find("ach99").is_none());
    }
}
