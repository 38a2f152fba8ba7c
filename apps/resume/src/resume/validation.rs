//! Submission rules for a résumé.
//!
//! A résumé is rejected when a required field is blank, the email address is
//! malformed, or a free-text field exceeds its ceiling. Rows of the three
//! repeatable lists are checked one by one and their errors are keyed by the
//! row's id, so a bad row never reports against its neighbours.

use serde::{Deserialize, Serialize};

use crate::models::resume::{
    EducationEntry, EntryId, EntryList, PersonalInfo, QualificationEntry, ResumeData,
    WorkExperienceEntry,
};

/// Ceiling for `motivation` and `selfPR`, in characters.
pub const FREE_TEXT_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path: `personalInfo.email`, `education.<id>.date`, `selfPR`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: &str) -> Self {
        FieldError {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
impl ValidationReport {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// All errors raised by one row of a repeatable list.
    pub fn for_entry(&self, list: EntryList, id: &EntryId) -> Vec<&FieldError> {
        let prefix = format!("{}.{}.", list.as_str(), id);
        self.errors
            .iter()
            .filter(|e| e.field.starts_with(&prefix))
            .collect()
    }
}

/// Validates the full aggregate. Collects every failure rather than stopping
/// at the first one so the form can mark all offending inputs at once.
pub fn validate_resume(data: &ResumeData) -> ValidationReport {
    let mut errors = Vec::new();

    validate_personal_info(&data.personal_info, &mut errors);

    for entry in &data.education {
        validate_education(entry, &mut errors);
    }
    for entry in &data.work_experience {
        validate_work_experience(entry, &mut errors);
    }
    for entry in &data.qualifications {
        validate_qualification(entry, &mut errors);
    }

    if exceeds_ceiling(&data.motivation) {
        errors.push(FieldError::new(
            "motivation",
            "志望動機は1000文字以内で入力してください",
        ));
    }
    if exceeds_ceiling(&data.self_pr) {
        errors.push(FieldError::new(
            "selfPR",
            "自己PRは1000文字以内で入力してください",
        ));
    }

    ValidationReport { errors }
}

fn validate_personal_info(info: &PersonalInfo, errors: &mut Vec<FieldError>) {
    let required = [
        ("name", info.name.as_str(), "氏名は必須です"),
        ("nameKana", info.name_kana.as_str(), "フリガナは必須です"),
        ("birthDate", info.birth_date.as_str(), "生年月日は必須です"),
        ("address", info.address.as_str(), "住所は必須です"),
        ("phone", info.phone.as_str(), "電話番号は必須です"),
    ];
    for (field, value, message) in required {
        if is_blank(value) {
            errors.push(FieldError::new(format!("personalInfo.{field}"), message));
        }
    }

    if is_blank(&info.email) {
        errors.push(FieldError::new(
            "personalInfo.email",
            "メールアドレスは必須です",
        ));
    } else if !is_valid_email(info.email.trim()) {
        errors.push(FieldError::new(
            "personalInfo.email",
            "有効なメールアドレスを入力してください",
        ));
    }
}

fn validate_education(entry: &EducationEntry, errors: &mut Vec<FieldError>) {
    let path = entry_path(EntryList::Education, &entry.id);
    if is_blank(&entry.date) {
        errors.push(FieldError::new(format!("{path}.date"), "年月は必須です"));
    }
    if is_blank(&entry.institution) {
        errors.push(FieldError::new(
            format!("{path}.institution"),
            "学校名は必須です",
        ));
    }
}

fn validate_work_experience(entry: &WorkExperienceEntry, errors: &mut Vec<FieldError>) {
    let path = entry_path(EntryList::WorkExperience, &entry.id);
    if is_blank(&entry.start_date) {
        errors.push(FieldError::new(
            format!("{path}.startDate"),
            "開始年月は必須です",
        ));
    }
    if is_blank(&entry.company) {
        errors.push(FieldError::new(
            format!("{path}.company"),
            "会社名は必須です",
        ));
    }
    if is_blank(&entry.position) {
        errors.push(FieldError::new(
            format!("{path}.position"),
            "職種は必須です",
        ));
    }
}

fn validate_qualification(entry: &QualificationEntry, errors: &mut Vec<FieldError>) {
    let path = entry_path(EntryList::Qualifications, &entry.id);
    if is_blank(&entry.date) {
        errors.push(FieldError::new(
            format!("{path}.date"),
            "取得年月は必須です",
        ));
    }
    if is_blank(&entry.name) {
        errors.push(FieldError::new(format!("{path}.name"), "資格名は必須です"));
    }
}

fn entry_path(list: EntryList, id: &EntryId) -> String {
    format!("{}.{}", list.as_str(), id)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn exceeds_ceiling(text: &str) -> bool {
    text.chars().count() > FREE_TEXT_MAX_CHARS
}

/// Syntactic email check.
///
/// PASS: `local@domain.tld`, exactly one `@`, non-empty local part, no
/// whitespace, domain made of non-empty dot-separated labels (at least two),
/// labels do not start or end with `-`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || local.starts_with('.') || local.ends_with('.') || local.contains("..")
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
