use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::credit::activity_credit;
use crate::models::{Activity, ActivityType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortMode {
    /// Newest first
    #[default]
    #[value(name = "desc-date")]
    NewestFirst,
    /// Oldest first
    #[value(name = "asc-date")]
    OldestFirst,
    /// Highest credit first
    #[value(name = "desc-credit")]
    HighestCredit,
    /// Lowest credit first
    #[value(name = "asc-credit")]
    LowestCredit,
}

pub fn activity_timestamp(activity: &Activity) -> Option<DateTime<Utc>> {
    activity
        .created_at
        .or_else(|| object_id_timestamp(&activity.id))
}

/// Object ids are 24 hex digits whose first 8 encode creation seconds.
pub fn object_id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    if id.len() != 24 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let seconds = u32::from_str_radix(&id[..8], 16).ok()?;
    DateTime::from_timestamp(i64::from(seconds), 0)
}

pub fn matches_filter(activity: &Activity, filter: Option<ActivityType>) -> bool {
    match filter {
        Some(activity_type) => activity.activity_type == activity_type.label(),
        None => true,
    }
}

pub fn filter_and_sort(
    activities: &[Activity],
    filter: Option<ActivityType>,
    sort: SortMode,
) -> Vec<&Activity> {
    let mut visible: Vec<&Activity> = activities
        .iter()
        .filter(|activity| matches_filter(activity, filter))
        .collect();

    match sort {
        SortMode::NewestFirst => {
            visible.sort_by(|a, b| activity_timestamp(b).cmp(&activity_timestamp(a)))
        }
        SortMode::OldestFirst => {
            visible.sort_by(|a, b| activity_timestamp(a).cmp(&activity_timestamp(b)))
        }
        SortMode::HighestCredit => visible.sort_by(|a, b| compare_credit(b, a)),
        SortMode::LowestCredit => visible.sort_by(|a, b| compare_credit(a, b)),
    }

    visible
}

fn compare_credit(a: &Activity, b: &Activity) -> Ordering {
    activity_credit(a)
        .partial_cmp(&activity_credit(b))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::total_credit;
    use chrono::TimeZone;

    fn activity(id: &str, activity_type: &str, amount: f64, day: u32) -> Activity {
        Activity {
            id: id.to_string(),
            wallet_address: "0xabc".to_string(),
            activity_type: activity_type.to_string(),
            amount,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()),
        }
    }

    fn sample() -> Vec<Activity> {
        vec![
            activity("a", "bisiklet", 10.0, 3),
            activity("b", "yürüyüş", 5.0, 1),
            activity("c", "metro", 12.0, 7),
            activity("d", "bisiklet", 2.0, 5),
        ]
    }

    fn ids(list: &[&Activity]) -> Vec<String> {
        list.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn newest_first_by_created_at() {
        let activities = sample();
        let sorted = filter_and_sort(&activities, None, SortMode::NewestFirst);
        assert_eq!(ids(&sorted), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn date_orders_are_reverses() {
        let activities = sample();
        let newest = ids(&filter_and_sort(&activities, None, SortMode::NewestFirst));
        let mut oldest = ids(&filter_and_sort(&activities, None, SortMode::OldestFirst));
        oldest.reverse();
        assert_eq!(newest, oldest);
    }

    #[test]
    fn credit_orders_are_reverses() {
        let activities = sample();
        let highest = ids(&filter_and_sort(&activities, None, SortMode::HighestCredit));
        assert_eq!(highest, vec!["a", "c", "b", "d"]);
        let mut lowest = ids(&filter_and_sort(&activities, None, SortMode::LowestCredit));
        lowest.reverse();
        assert_eq!(highest, lowest);
    }

    #[test]
    fn filter_keeps_exact_type_matches_only() {
        let activities = sample();
        let cycling = filter_and_sort(&activities, Some(ActivityType::Cycling), SortMode::NewestFirst);
        assert_eq!(ids(&cycling), vec!["d", "a"]);
        assert!(cycling.iter().all(|a| a.activity_type == "bisiklet"));
        assert_eq!(total_credit(cycling.iter().copied()), 36.0);
    }

    #[test]
    fn filter_is_exact_not_case_insensitive() {
        let activities = vec![activity("x", "Metro", 1.0, 1)];
        assert!(filter_and_sort(&activities, Some(ActivityType::Metro), SortMode::NewestFirst).is_empty());
    }

    #[test]
    fn object_id_supplies_missing_timestamp() {
        let stamp = object_id_timestamp("665f1c2e9b1d4a0012345678").unwrap();
        assert_eq!(stamp.timestamp(), 0x665f1c2e);
        assert!(object_id_timestamp("42").is_none());
        assert!(object_id_timestamp("zz5f1c2e9b1d4a0012345678").is_none());
    }

    #[test]
    fn records_without_dates_sort_after_dated_when_newest_first() {
        let mut activities = sample();
        activities.push(Activity {
            id: "local".to_string(),
            wallet_address: String::new(),
            activity_type: "metro".to_string(),
            amount: 1.0,
            created_at: None,
        });
        let newest = filter_and_sort(&activities, None, SortMode::NewestFirst);
        assert_eq!(newest.last().unwrap().id, "local");
        let oldest = filter_and_sort(&activities, None, SortMode::OldestFirst);
        assert_eq!(oldest.first().unwrap().id, "local");
    }
}
