use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Records that belong to a single platform user.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub name: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(alias = "author")]
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(alias = "author")]
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeAssignment {
    #[serde(alias = "userId")]
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFeedback {
    #[serde(alias = "author")]
    pub owner_id: String,
    pub author_name: String,
    pub feedback: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub title: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "author")]
    pub owner_id: String,
    pub author_name: String,
    #[serde(default)]
    pub feedback: Vec<ReviewFeedback>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRepo {
    pub name: String,
    pub url: String,
    #[serde(alias = "trackedBy")]
    pub owner_id: String,
    pub added_at: DateTime<Utc>,
}

/// One logged study session. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLog {
    #[serde(alias = "userId")]
    pub owner_id: String,
    pub topic: String,
    pub hours: u32,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: NaiveDate,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

macro_rules! impl_owned {
    ($($record:ty),* $(,)?) => {
        $(
            impl Owned for $record {
                fn owner_id(&self) -> &str {
                    &self.owner_id
                }
            }
        )*
    };
}

impl_owned!(
    Snippet,
    Goal,
    ChallengeAssignment,
    Review,
    TrackedRepo,
    ProgressLog
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_are_accepted() {
        let raw = r#"{
            "name": "fizzbuzz",
            "code": "for(;;){}",
            "language": "js",
            "tags": ["interview"],
            "author": "123",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let snippet: Snippet = serde_json::from_str(raw).unwrap();
        assert_eq!(snippet.owner_id, "123");

        let raw = r#"{
            "userId": "123",
            "title": "String Reversal",
            "description": "Reverse it",
            "difficulty": "Easy",
            "tags": [],
            "assignedAt": "2024-03-01T10:00:00.000Z",
            "completed": false
        }"#;
        let assignment: ChallengeAssignment = serde_json::from_str(raw).unwrap();
        assert_eq!(assignment.owner_id(), "123");
        assert_eq!(assignment.solution, None);
    }

    #[test]
    fn records_serialize_with_camel_case_owner() {
        let repo = TrackedRepo {
            name: "rust-lang/rust".into(),
            url: "https://github.com/rust-lang/rust".into(),
            owner_id: "9".into(),
            added_at: "2024-03-01T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&repo).unwrap();
        assert_eq!(value["ownerId"], "9");
        assert_eq!(value["addedAt"], "2024-03-01T10:00:00Z");
    }
}
