//! Maps `ResumeData` onto the fixed template, section by section.
//!
//! Composition is purely logical: it decides what text goes in which cell.
//! Measuring and placing that text is `paginate`'s job.

use crate::layout::document::{SectionKind, SECTION_ORDER};
use crate::models::resume::{
    non_blank, EducationEntry, QualificationEntry, ResumeData, WorkExperienceEntry, WorkStatus,
};

pub const DOCUMENT_TITLE: &str = "履歴書";

/// Separator between a period's endpoints and between company and position.
const DASH: &str = " – ";

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub title: &'static str,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    /// Label/value rows.
    Fields(Vec<(&'static str, String)>),
    Table {
        header: [&'static str; 3],
        rows: Vec<[String; 3]>,
    },
    /// Bordered free text, printed verbatim.
    Text(String),
}

pub fn compose(data: &ResumeData) -> Template {
    let sections = SECTION_ORDER
        .iter()
        .map(|&kind| Section {
            kind,
            body: section_body(kind, data),
        })
        .collect();

    Template {
        title: DOCUMENT_TITLE,
        sections,
    }
}

fn section_body(kind: SectionKind, data: &ResumeData) -> SectionBody {
    match kind {
        SectionKind::PersonalInfo => {
            let info = &data.personal_info;
            SectionBody::Fields(vec![
                ("氏名", info.name.clone()),
                ("フリガナ", info.name_kana.clone()),
                ("生年月日", info.birth_date.clone()),
                ("性別", info.gender.label().to_string()),
                ("住所", info.address.clone()),
                ("電話番号", info.phone.clone()),
                ("メール", info.email.clone()),
            ])
        }
        SectionKind::Education => SectionBody::Table {
            header: ["年月", "学校名・学部・学科", "卒業・在学"],
            rows: data.education.iter().map(education_row).collect(),
        },
        SectionKind::WorkExperience => SectionBody::Table {
            header: ["年月", "会社名・職種", "在職・退職"],
            rows: data.work_experience.iter().map(work_row).collect(),
        },
        SectionKind::Qualifications => SectionBody::Table {
            header: ["年月", "資格・免許名", "発行機関"],
            rows: data.qualifications.iter().map(qualification_row).collect(),
        },
        SectionKind::Motivation => SectionBody::Text(data.motivation.clone()),
        SectionKind::SelfPr => SectionBody::Text(data.self_pr.clone()),
    }
}

fn education_row(entry: &EducationEntry) -> [String; 3] {
    let school = match non_blank(&entry.department) {
        Some(department) => format!("{} {}", entry.institution, department),
        None => entry.institution.clone(),
    };
    [entry.date.clone(), school, entry.status.label().to_string()]
}

/// A current job prints its start date only, even if a stale end date is
/// still stored.
fn work_period(entry: &WorkExperienceEntry) -> String {
    match (entry.status, non_blank(&entry.end_date)) {
        (WorkStatus::Resigned, Some(end)) => format!("{}{DASH}{}", entry.start_date, end),
        _ => entry.start_date.clone(),
    }
}

fn work_row(entry: &WorkExperienceEntry) -> [String; 3] {
    let mut body = format!("{}{DASH}{}", entry.company, entry.position);
    if let Some(description) = non_blank(&entry.description) {
        body.push('\n');
        body.push_str(description);
    }
    [work_period(entry), body, entry.status.label().to_string()]
}

fn qualification_row(entry: &QualificationEntry) -> [String; 3] {
    [
        entry.date.clone(),
        entry.name.clone(),
        non_blank(&entry.organization).unwrap_or_default().to_string(),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationStatus, EntryId, Gender};

    fn table_rows(template: &Template, kind: SectionKind) -> Vec<[String; 3]> {
        template
            .sections
            .iter()
            .find(|s| s.kind == kind)
            .and_then(|s| match &s.body {
                SectionBody::Table { rows, .. } => Some(rows.clone()),
                _ => None,
            })
            .unwrap()
    }

    fn row(a: &str, b: &str, c: &str) -> [String; 3] {
        [a.to_string(), b.to_string(), c.to_string()]
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let template = compose(&ResumeData::empty());
        assert_eq!(template.title, "履歴書");
        let kinds: Vec<_> = template.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SECTION_ORDER.to_vec());
    }

    #[test]
    fn test_personal_fields_and_gender_label() {
        let mut data = ResumeData::empty();
        data.personal_info.name = "山田太郎".to_string();
        data.personal_info.gender = Gender::Female;
        let template = compose(&data);

        let SectionBody::Fields(fields) = &template.sections[0].body else {
            panic!("personal info must be fields");
        };
        let labels: Vec<_> = fields.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            vec!["氏名", "フリガナ", "生年月日", "性別", "住所", "電話番号", "メール"]
        );
        assert_eq!(fields[0].1, "山田太郎");
        assert_eq!(fields[3].1, "女性");
    }

    #[test]
    fn test_unspecified_gender_prints_empty() {
        let template = compose(&ResumeData::empty());
        let SectionBody::Fields(fields) = &template.sections[0].body else {
            panic!("personal info must be fields");
        };
        assert_eq!(fields[3], ("性別", String::new()));
    }

    #[test]
    fn test_education_rows_in_entry_order() {
        let mut data = ResumeData::empty();
        let mut high_school = EducationEntry::new(EntryId::from("e1"));
        high_school.date = "2008年3月".to_string();
        high_school.institution = "A高校".to_string();
        let mut university = EducationEntry::new(EntryId::from("e2"));
        university.date = "2012年4月".to_string();
        university.institution = "B大学".to_string();
        university.department = Some("工学部".to_string());
        university.status = EducationStatus::Enrolled;
        data.education = vec![high_school, university];

        assert_eq!(
            table_rows(&compose(&data), SectionKind::Education),
            vec![
                row("2008年3月", "A高校", "卒業"),
                row("2012年4月", "B大学 工学部", "在学中"),
            ]
        );
    }

    #[test]
    fn test_blank_department_is_omitted() {
        let mut entry = EducationEntry::new(EntryId::from("e1"));
        entry.institution = "A大学".to_string();
        entry.department = Some("  ".to_string());
        assert_eq!(education_row(&entry)[1], "A大学");
    }

    #[test]
    fn test_resigned_job_prints_period_and_description() {
        let mut entry = WorkExperienceEntry::new(EntryId::from("w1"));
        entry.start_date = "2015年4月".to_string();
        entry.end_date = Some("2020年3月".to_string());
        entry.company = "B社".to_string();
        entry.position = "エンジニア".to_string();
        entry.description = Some("Webサービス開発".to_string());

        assert_eq!(
            work_row(&entry),
            row("2015年4月 – 2020年3月", "B社 – エンジニア\nWebサービス開発", "退職")
        );
    }

    #[test]
    fn test_current_job_ignores_stale_end_date() {
        let mut entry = WorkExperienceEntry::new(EntryId::from("w1"));
        entry.start_date = "2020年4月".to_string();
        entry.end_date = Some("2021年3月".to_string());
        entry.status = WorkStatus::Current;
        entry.company = "C社".to_string();
        entry.position = "リード".to_string();

        assert_eq!(work_row(&entry), row("2020年4月", "C社 – リード", "在職中"));
    }

    #[test]
    fn test_qualification_without_organization() {
        let mut entry = QualificationEntry::new(EntryId::from("q1"));
        entry.date = "2019年6月".to_string();
        entry.name = "基本情報技術者".to_string();
        assert_eq!(qualification_row(&entry), row("2019年6月", "基本情報技術者", ""));

        entry.organization = Some("IPA".to_string());
        assert_eq!(qualification_row(&entry)[2], "IPA");
    }

    #[test]
    fn test_free_text_is_verbatim() {
        let mut data = ResumeData::empty();
        data.motivation = "一行目\n二行目".to_string();
        let template = compose(&data);
        assert_eq!(
            template.sections[4].body,
            SectionBody::Text("一行目\n二行目".to_string())
        );
    }

    #[test]
    fn test_empty_tables_keep_their_header() {
        let template = compose(&ResumeData::empty());
        match &template.sections[2].body {
            SectionBody::Table { header, rows } => {
                assert_eq!(header, &["年月", "会社名・職種", "在職・退職"]);
                assert!(rows.is_empty());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
