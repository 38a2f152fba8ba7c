use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// Opaque identifier of one row in a repeatable list.
///
/// Assigned once when the row is added and never derived from its position,
/// so removing a row leaves every other id untouched. Ids loaded from older
/// snapshots (e.g. millisecond timestamps) are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        EntryId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        EntryId(value)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        EntryId(value.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Closed status enums and their display labels
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    /// Older snapshots store the unselected state as an empty string.
    #[default]
    #[serde(alias = "")]
    Unspecified,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "男性",
            Gender::Female => "女性",
            Gender::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationStatus {
    #[default]
    Graduated,
    Enrolled,
    DroppedOut,
}

impl EducationStatus {
    pub fn label(self) -> &'static str {
        match self {
            EducationStatus::Graduated => "卒業",
            EducationStatus::Enrolled => "在学中",
            EducationStatus::DroppedOut => "中退",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Current,
    #[default]
    Resigned,
}

impl WorkStatus {
    pub fn label(self) -> &'static str {
        match self {
            WorkStatus::Current => "在職中",
            WorkStatus::Resigned => "退職",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Personal information
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    /// Phonetic reading of `name` (furigana).
    pub name_kana: String,
    /// Free-form label, e.g. "1990年4月1日".
    pub birth_date: String,
    #[serde(default)]
    pub gender: Gender,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Carried through storage; the current template does not print it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Repeatable entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: EntryId,
    /// Period label ("2012年4月"), not a calendar type.
    pub date: String,
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub status: EducationStatus,
}

impl EducationEntry {
    pub fn new(id: EntryId) -> Self {
        EducationEntry {
            id,
            date: String::new(),
            institution: String::new(),
            department: None,
            status: EducationStatus::Graduated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceEntry {
    pub id: EntryId,
    pub start_date: String,
    /// Ignored by the layout while `status` is `Current`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub company: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkStatus,
}

impl WorkExperienceEntry {
    pub fn new(id: EntryId) -> Self {
        WorkExperienceEntry {
            id,
            start_date: String::new(),
            end_date: None,
            company: String::new(),
            position: String::new(),
            description: None,
            status: WorkStatus::Resigned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationEntry {
    pub id: EntryId,
    pub date: String,
    /// Credential title.
    pub name: String,
    /// Issuing body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl QualificationEntry {
    pub fn new(id: EntryId) -> Self {
        QualificationEntry {
            id,
            date: String::new(),
            name: String::new(),
            organization: None,
        }
    }
}

/// Names one of the three repeatable lists of a résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryList {
    Education,
    WorkExperience,
    Qualifications,
}

impl EntryList {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryList::Education => "education",
            EntryList::WorkExperience => "workExperience",
            EntryList::Qualifications => "qualifications",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────────────────────────────────────

/// A complete résumé: the unit of validation, persistence and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    /// Display order = insertion order.
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperienceEntry>,
    #[serde(default)]
    pub qualifications: Vec<QualificationEntry>,
    #[serde(default)]
    pub motivation: String,
    #[serde(default, rename = "selfPR")]
    pub self_pr: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeData {
    /// Blank résumé: empty scalars, default enums, no entries, both
    /// timestamps at the construction instant.
    pub fn empty() -> Self {
        let now = Utc::now();
        ResumeData {
            personal_info: PersonalInfo::default(),
            education: Vec::new(),
            work_experience: Vec::new(),
            qualifications: Vec::new(),
            motivation: String::new(),
            self_pr: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn entry_count(&self, list: EntryList) -> usize {
        match list {
            EntryList::Education => self.education.len(),
            EntryList::WorkExperience => self.work_experience.len(),
            EntryList::Qualifications => self.qualifications.len(),
        }
    }
}

/// Returns the trimmed-non-empty content of an optional text field.
///
/// Older snapshots store `""` for an unset optional; every consumer treats
/// that the same as `None`.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
