//! Form Controller: owns the editable draft of the résumé.
//!
//! Setters, add/remove and patch calls only touch the in-memory draft.
//! `commit` and `begin_export` are the only paths that reach storage, and both
//! refuse to write a draft that fails validation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::export::ExportError;
use crate::models::resume::{
    EducationEntry, EducationStatus, EntryId, EntryList, Gender, QualificationEntry, ResumeData,
    WorkExperienceEntry, WorkStatus,
};
use crate::resume::validation::{validate_resume, ValidationReport};
use crate::store::ResumeRepository;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Resume has {} invalid field(s)", .0.errors.len())]
    Invalid(ValidationReport),

    #[error("Failed to persist resume: {0:#}")]
    Store(#[from] anyhow::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Field addressing and partial updates
// ────────────────────────────────────────────────────────────────────────────

/// Text fields of `PersonalInfo` that can be set one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalField {
    Name,
    NameKana,
    BirthDate,
    Address,
    Phone,
    Email,
}

/// Partial update of `PersonalInfo`; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoPatch {
    pub name: Option<String>,
    pub name_kana: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPatch {
    pub date: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub status: Option<EducationStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperiencePatch {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationPatch {
    pub date: Option<String>,
    pub name: Option<String>,
    pub organization: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Export ticket
// ────────────────────────────────────────────────────────────────────────────

/// Proof that an export is in flight, carrying the snapshot to render.
///
/// The in-flight flag is cleared when the ticket is dropped, whether the
/// export finished, failed or panicked.
#[derive(Debug)]
pub struct ExportTicket {
    pub snapshot: ResumeData,
    flag: Arc<AtomicBool>,
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct FormController {
    repository: ResumeRepository,
    draft: ResumeData,
    dirty: bool,
    last_saved: Option<DateTime<Utc>>,
    exporting: Arc<AtomicBool>,
}

impl FormController {
    /// Seeds the draft from the stored snapshot, or a blank résumé when
    /// nothing (or nothing readable) is stored.
    pub fn open(repository: ResumeRepository) -> Self {
        let (draft, last_saved) = match repository.load() {
            Some(data) => {
                let saved = data.updated_at;
                (data, Some(saved))
            }
            None => (ResumeData::empty(), None),
        };
        debug!(
            seeded_from_store = last_saved.is_some(),
            "Form controller opened"
        );

        FormController {
            repository,
            draft,
            dirty: false,
            last_saved,
            exporting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn draft(&self) -> &ResumeData {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    // ── Scalar setters ──────────────────────────────────────────────────────

    pub fn set_personal_field(&mut self, field: PersonalField, value: String) {
        let info = &mut self.draft.personal_info;
        let slot = match field {
            PersonalField::Name => &mut info.name,
            PersonalField::NameKana => &mut info.name_kana,
            PersonalField::BirthDate => &mut info.birth_date,
            PersonalField::Address => &mut info.address,
            PersonalField::Phone => &mut info.phone,
            PersonalField::Email => &mut info.email,
        };
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
    }

    pub fn set_gender(&mut self, gender: Gender) {
        if self.draft.personal_info.gender != gender {
            self.draft.personal_info.gender = gender;
            self.dirty = true;
        }
    }

    pub fn update_personal_info(&mut self, patch: PersonalInfoPatch) {
        let fields = [
            (PersonalField::Name, patch.name),
            (PersonalField::NameKana, patch.name_kana),
            (PersonalField::BirthDate, patch.birth_date),
            (PersonalField::Address, patch.address),
            (PersonalField::Phone, patch.phone),
            (PersonalField::Email, patch.email),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                self.set_personal_field(field, value);
            }
        }
        if let Some(gender) = patch.gender {
            self.set_gender(gender);
        }
        if let Some(photo) = patch.photo {
            let photo = Some(photo).filter(|p| !p.is_empty());
            if self.draft.personal_info.photo != photo {
                self.draft.personal_info.photo = photo;
                self.dirty = true;
            }
        }
    }

    pub fn set_motivation(&mut self, text: String) {
        if self.draft.motivation != text {
            self.draft.motivation = text;
            self.dirty = true;
        }
    }

    pub fn set_self_pr(&mut self, text: String) {
        if self.draft.self_pr != text {
            self.draft.self_pr = text;
            self.dirty = true;
        }
    }

    // ── Repeatable entries ─────────────────────────────────────────────────

    /// Appends a blank row to `list` and returns its fresh id.
    pub fn add_entry(&mut self, list: EntryList) -> EntryId {
        let id = EntryId::generate();
        match list {
            EntryList::Education => self.draft.education.push(EducationEntry::new(id.clone())),
            EntryList::WorkExperience => self
                .draft
                .work_experience
                .push(WorkExperienceEntry::new(id.clone())),
            EntryList::Qualifications => self
                .draft
                .qualifications
                .push(QualificationEntry::new(id.clone())),
        }
        self.dirty = true;
        let count = self.draft.entry_count(list);
        debug!(list = list.as_str(), %id, count, "Entry added");
        id
    }

    /// Removes the row with `id` from `list`. Returns false (and changes
    /// nothing) when no such row exists. Other rows keep their ids.
    pub fn remove_entry(&mut self, list: EntryList, id: &EntryId) -> bool {
        let removed = match list {
            EntryList::Education => remove_by_id(&mut self.draft.education, id, |e| &e.id),
            EntryList::WorkExperience => {
                remove_by_id(&mut self.draft.work_experience, id, |e| &e.id)
            }
            EntryList::Qualifications => {
                remove_by_id(&mut self.draft.qualifications, id, |e| &e.id)
            }
        };
        if removed {
            self.dirty = true;
            let count = self.draft.entry_count(list);
            debug!(list = list.as_str(), %id, count, "Entry removed");
        }
        removed
    }

    pub fn update_education(&mut self, id: &EntryId, patch: EducationPatch) -> bool {
        let Some(entry) = self.draft.education.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        let before = entry.clone();
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(institution) = patch.institution {
            entry.institution = institution;
        }
        if let Some(department) = patch.department {
            entry.department = Some(department).filter(|d| !d.is_empty());
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        self.dirty |= *entry != before;
        true
    }

    pub fn update_work_experience(&mut self, id: &EntryId, patch: WorkExperiencePatch) -> bool {
        let Some(entry) = self.draft.work_experience.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        let before = entry.clone();
        if let Some(start_date) = patch.start_date {
            entry.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            entry.end_date = Some(end_date).filter(|d| !d.is_empty());
        }
        if let Some(company) = patch.company {
            entry.company = company;
        }
        if let Some(position) = patch.position {
            entry.position = position;
        }
        if let Some(description) = patch.description {
            entry.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        self.dirty |= *entry != before;
        true
    }

    pub fn update_qualification(&mut self, id: &EntryId, patch: QualificationPatch) -> bool {
        let Some(entry) = self.draft.qualifications.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        let before = entry.clone();
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(organization) = patch.organization {
            entry.organization = Some(organization).filter(|o| !o.is_empty());
        }
        self.dirty |= *entry != before;
        true
    }

    // ── Validation and persistence ─────────────────────────────────────────

    /// Keystroke-level check. Informational only; never blocks editing.
    pub fn advisory(&self) -> ValidationReport {
        validate_resume(&self.draft)
    }

    /// Validates the draft and, when valid, writes it through the repository.
    pub fn commit(&mut self) -> Result<DateTime<Utc>, CommitError> {
        let report = validate_resume(&self.draft);
        if !report.is_valid() {
            debug!(errors = report.errors.len(), "Commit rejected by validation");
            return Err(CommitError::Invalid(report));
        }

        let saved_at = self.repository.save(&mut self.draft)?;
        self.last_saved = Some(saved_at);
        self.dirty = false;
        info!(updated_at = %saved_at, "Resume committed");
        Ok(saved_at)
    }

    /// Starts an export: validates and persists the draft (so storage always
    /// matches what is exported), raises the in-flight flag and hands back a
    /// snapshot to render. A second call while a ticket is alive is rejected.
    pub fn begin_export(&mut self) -> Result<ExportTicket, ExportError> {
        if self.is_exporting() {
            return Err(ExportError::InFlight);
        }

        match self.commit() {
            Ok(_) => {}
            Err(CommitError::Invalid(report)) => return Err(ExportError::Invalid(report)),
            Err(CommitError::Store(e)) => return Err(ExportError::Persist(e)),
        }

        self.exporting.store(true, Ordering::SeqCst);
        Ok(ExportTicket {
            snapshot: self.draft.clone(),
            flag: Arc::clone(&self.exporting),
        })
    }
}

fn remove_by_id<T>(entries: &mut Vec<T>, id: &EntryId, key: impl Fn(&T) -> &EntryId) -> bool {
    let before = entries.len();
    entries.retain(|e| key(e) != id);
    entries.len() != before
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
