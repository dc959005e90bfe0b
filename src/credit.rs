use crate::models::{Activity, ActivityType};

/// Multiplier for activity types outside the table.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

pub fn multiplier(activity_type: ActivityType) -> f64 {
    match activity_type {
        ActivityType::Walking => 4.0,
        ActivityType::Cycling => 3.0,
        ActivityType::PublicTransit | ActivityType::Bus | ActivityType::Metro | ActivityType::Tram => {
            2.0
        }
    }
}

pub fn multiplier_for(raw_type: &str) -> f64 {
    ActivityType::parse(raw_type)
        .map(multiplier)
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// NaN amounts stay NaN.
pub fn credit_score(raw_type: &str, amount: f64) -> f64 {
    amount * multiplier_for(raw_type)
}

pub fn activity_credit(activity: &Activity) -> f64 {
    credit_score(&activity.activity_type, activity.amount)
}

pub fn total_credit<'a>(activities: impl IntoIterator<Item = &'a Activity>) -> f64 {
    // f64's Sum starts from -0.0
    activities
        .into_iter()
        .fold(0.0, |total, activity| total + activity_credit(activity))
}
