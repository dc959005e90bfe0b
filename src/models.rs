use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UnknownActivityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Cycling,
    Walking,
    PublicTransit,
    Bus,
    Metro,
    Tram,
}

impl ActivityType {
    pub fn label(self) -> &'static str {
        match self {
            ActivityType::Cycling => "bisiklet",
            ActivityType::Walking => "yürüyüş",
            ActivityType::PublicTransit => "toplu taşıma",
            ActivityType::Bus => "otobüs",
            ActivityType::Metro => "metro",
            ActivityType::Tram => "tramvay",
        }
    }

    /// Case-insensitive match against the stored labels only.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "bisiklet" => Some(ActivityType::Cycling),
            "yürüyüş" => Some(ActivityType::Walking),
            "toplu taşıma" => Some(ActivityType::PublicTransit),
            "otobüs" => Some(ActivityType::Bus),
            "metro" => Some(ActivityType::Metro),
            "tramvay" => Some(ActivityType::Tram),
            _ => None,
        }
    }

    /// User input: stored labels plus English names.
    pub fn parse_input(raw: &str) -> Option<Self> {
        ActivityType::parse(raw).or_else(|| match raw.to_lowercase().as_str() {
            "cycling" => Some(ActivityType::Cycling),
            "walking" => Some(ActivityType::Walking),
            "transit" => Some(ActivityType::PublicTransit),
            "bus" => Some(ActivityType::Bus),
            "tram" => Some(ActivityType::Tram),
            _ => None,
        })
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::parse_input(s).ok_or_else(|| UnknownActivityType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ActivityRecord")]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub wallet_address: String,
    pub activity_type: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// Servers may send `_id`, `id` or both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRecord {
    #[serde(rename = "_id", default)]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    wallet_address: String,
    activity_type: String,
    #[serde(default = "missing_amount", deserialize_with = "amount_from_json")]
    amount: f64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ActivityRecord> for Activity {
    type Error = String;

    fn try_from(record: ActivityRecord) -> Result<Self, Self::Error> {
        let id = record
            .object_id
            .or(record.id)
            .ok_or_else(|| "missing field `_id`".to_string())?;
        Ok(Activity {
            id,
            wallet_address: record.wallet_address,
            activity_type: record.activity_type,
            amount: record.amount,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub wallet_address: String,
    pub activity_type: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreatedActivity {
    pub activity: Activity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    #[serde(default)]
    pub total_token: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TypeSummary {
    pub activity_type: String,
    pub count: usize,
    pub amount: f64,
    pub credit: f64,
}

/// Blank is zero, unparsable is NaN.
pub fn coerce_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn missing_amount() -> f64 {
    f64::NAN
}

fn amount_from_json<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
        Null(()),
    }

    Ok(match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(value) => value,
        RawAmount::Text(text) => coerce_amount(&text),
        RawAmount::Null(()) => 0.0,
    })
}
