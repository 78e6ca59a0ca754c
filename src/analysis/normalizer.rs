//! Turns an analysis result into a rendering-neutral display model: one
//! summary card, aggregate cards grouped by column or coordinates, and the
//! detail table.

use crate::analysis::types::{Action, AnalysisResult, DuplicateRecord, ErrorRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTone {
    Success,
    Error,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCard {
    pub tone: CardTone,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCard {
    pub tone: CardTone,
    pub title: String,
    pub count: usize,
    pub count_label: String,
    /// Contributing line numbers, first-seen order. Empty for error groups.
    pub lines: Vec<u64>,
}

impl GroupCard {
    pub fn headline(&self) -> String {
        format!("{} — {}", self.title, self.count_label)
    }

    pub fn lines_label(&self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.lines.iter().map(u64::to_string).collect();
        Some(format!("Lignes: {}", lines.join(", ")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    Line,
    Column,
    Value,
    Problem,
    Identifier,
    Latitude,
    Longitude,
}

impl TableColumn {
    pub fn label(&self) -> &'static str {
        match self {
            TableColumn::Line => "Ligne",
            TableColumn::Column => "Colonne",
            TableColumn::Value => "Valeur",
            TableColumn::Problem => "Problème",
            TableColumn::Identifier => "Identifiant",
            TableColumn::Latitude => "Latitude",
            TableColumn::Longitude => "Longitude",
        }
    }
}

pub const ERROR_COLUMNS: [TableColumn; 4] = [
    TableColumn::Line,
    TableColumn::Column,
    TableColumn::Value,
    TableColumn::Problem,
];

pub const DUPLICATE_COLUMNS: [TableColumn; 4] = [
    TableColumn::Line,
    TableColumn::Identifier,
    TableColumn::Latitude,
    TableColumn::Longitude,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    pub summary: SummaryCard,
    pub groups: Vec<GroupCard>,
    pub table: Option<Table>,
    pub download_enabled: bool,
}

/// `"1 erreur"`, `"0 erreurs"`, `"3 erreurs"`.
pub fn pluralize(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_suffix(count))
}

fn plural_suffix(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

pub fn normalize(result: &AnalysisResult, action: Action) -> DisplayModel {
    match (result, action) {
        (AnalysisResult::Empty { .. }, _) => empty_model(),
        (AnalysisResult::ErrorReport { errors }, _) if errors.is_empty() => empty_model(),
        (AnalysisResult::DuplicateReport { duplicates }, _) if duplicates.is_empty() => {
            empty_model()
        }
        (AnalysisResult::ErrorReport { errors }, action) => {
            if action != Action::DetectErrors {
                log::warn!("Error report received for action '{}'", action);
            }
            error_model(errors)
        }
        (AnalysisResult::DuplicateReport { duplicates }, action) => {
            if action != Action::DetectDuplicates {
                log::warn!("Duplicate report received for action '{}'", action);
            }
            duplicate_model(duplicates)
        }
    }
}

fn empty_model() -> DisplayModel {
    DisplayModel {
        summary: SummaryCard {
            tone: CardTone::Success,
            text: "Aucun problème détecté".to_string(),
        },
        groups: Vec::new(),
        table: None,
        download_enabled: false,
    }
}

fn error_model(errors: &[ErrorRecord]) -> DisplayModel {
    let count = errors.len();
    let suffix = plural_suffix(count);
    let summary = SummaryCard {
        tone: CardTone::Error,
        text: format!("{} erreur{} détectée{}", count, suffix, suffix),
    };

    let mut groups: Vec<GroupCard> = Vec::new();
    for error in errors {
        match groups.iter_mut().find(|g| g.title == error.column) {
            Some(group) => group.count += 1,
            None => groups.push(GroupCard {
                tone: CardTone::Error,
                title: error.column.clone(),
                count: 1,
                count_label: String::new(),
                lines: Vec::new(),
            }),
        }
    }
    for group in &mut groups {
        group.count_label = pluralize(group.count, "erreur");
    }

    let rows = errors
        .iter()
        .map(|error| {
            vec![
                error.line.to_string(),
                error.column.clone(),
                match error.value.as_deref() {
                    Some(value) if !value.is_empty() => value.to_string(),
                    _ => "N/A".to_string(),
                },
                error.problem.clone(),
            ]
        })
        .collect();

    DisplayModel {
        summary,
        groups,
        table: Some(Table {
            columns: ERROR_COLUMNS.to_vec(),
            rows,
        }),
        download_enabled: true,
    }
}

fn coordinate_key(record: &DuplicateRecord) -> String {
    format!("{},{}", record.latitude, record.longitude)
}

fn duplicate_model(duplicates: &[DuplicateRecord]) -> DisplayModel {
    let count = duplicates.len();
    let suffix = plural_suffix(count);
    let summary = SummaryCard {
        tone: CardTone::Duplicate,
        text: format!("{} doublon{} détecté{}", count, suffix, suffix),
    };

    let mut groups: Vec<GroupCard> = Vec::new();
    for record in duplicates {
        let key = coordinate_key(record);
        match groups.iter_mut().find(|g| g.title == key) {
            Some(group) => {
                group.count += 1;
                group.lines.push(record.line);
            }
            None => groups.push(GroupCard {
                tone: CardTone::Duplicate,
                title: key,
                count: 1,
                count_label: String::new(),
                lines: vec![record.line],
            }),
        }
    }
    for group in &mut groups {
        group.count_label = pluralize(group.count, "occurrence");
    }

    let rows = duplicates
        .iter()
        .map(|record| {
            vec![
                record.line.to_string(),
                record.identifier.clone(),
                record.latitude.to_string(),
                record.longitude.to_string(),
            ]
        })
        .collect();

    DisplayModel {
        summary,
        groups,
        table: Some(Table {
            columns: DUPLICATE_COLUMNS.to_vec(),
            rows,
        }),
        download_enabled: true,
    }
}
