//! Gym catalog documents: zones, equipment, group classes.

use serde::{Deserialize, Serialize};

/// A gym zone. Consulted by the "visited all zones" achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A bookable piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub zone_id: String,
}

/// A scheduled group class with a capped roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupClass {
    pub id: String,
    pub title: String,
    pub zone_id: String,
    pub coach: String,
    /// Class date ("YYYY-MM-DD" or RFC3339, normalized on booking)
    pub date: String,
    /// "HH:mm"
    pub start_time: String,
    /// "HH:mm"
    pub end_time: String,
    pub duration_minutes: u32,
    pub max_capacity: u32,
    /// Roster with set semantics; `len <= max_capacity` is enforced at
    /// booking time inside the booking transaction
    #[serde(default)]
    pub booked_user_ids: Vec<String>,
}

impl GroupClass {
    pub fn is_full(&self) -> bool {
        self.booked_user_ids.len() as u32 >= self.max_capacity
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.booked_user_ids.iter().any(|id| id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_with_roster(max_capacity: u32, roster: &[&str]) -> GroupClass {
        GroupClass {
            id: "cls1".to_string(),
            title: "Spin".to_string(),
            zone_id: "z1".to_string(),
            coach: "Alex".to_string(),
            date: "2024-03-05".to_string(),
            start_time: "18:00".to_string(),
            end_time: "19:00".to_string(),
            duration_minutes: 60,
            max_capacity,
            booked_user_ids: roster.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_is_full() {
        assert!(!class_with_roster(2, &["u1"]).is_full());
        assert!(class_with_roster(2, &["u1", "u2"]).is_full());
        assert!(class_with_roster(1, &["u1"]).is_full());
    }

    #[test]
    fn test_has_member() {
        let class = class_with_roster(5, &["u1", "u2"]);
        assert!(class.has_member("u1"));
        assert!(!class.has_member("u3"));
    }
}
