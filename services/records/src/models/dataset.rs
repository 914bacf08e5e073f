//! Dataset metadata models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ColumnKind, RecordField};

/// Stored dataset metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub dataset_name: String,
    pub category: Option<String>,
    pub source: Option<String>,
    pub last_updated: Option<String>,
    pub record_count: Option<i64>,
    pub file_size_mb: Option<f64>,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset {}: {} ({:.2} MB, {} rows)",
            self.id,
            self.dataset_name,
            self.file_size_mb.unwrap_or(0.0),
            self.record_count.unwrap_or(0)
        )
    }
}

/// Dataset to insert
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDataset {
    pub dataset_name: String,
    pub category: Option<String>,
    pub source: Option<String>,
    pub last_updated: Option<String>,
    pub record_count: Option<i64>,
    pub file_size_mb: Option<f64>,
}

/// Updatable dataset columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetField {
    DatasetName,
    Category,
    Source,
    LastUpdated,
    RecordCount,
    FileSizeMb,
}

impl RecordField for DatasetField {
    fn column(&self) -> &'static str {
        match self {
            DatasetField::DatasetName => "dataset_name",
            DatasetField::Category => "category",
            DatasetField::Source => "source",
            DatasetField::LastUpdated => "last_updated",
            DatasetField::RecordCount => "record_count",
            DatasetField::FileSizeMb => "file_size_mb",
        }
    }

    fn kind(&self) -> ColumnKind {
        match self {
            DatasetField::RecordCount => ColumnKind::Integer,
            DatasetField::FileSizeMb => ColumnKind::Real,
            _ => ColumnKind::Text,
        }
    }

    fn nullable(&self) -> bool {
        !matches!(self, DatasetField::DatasetName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_size() {
        let dataset = Dataset {
            id: 3,
            dataset_name: "Churn".to_string(),
            category: None,
            source: None,
            last_updated: None,
            record_count: Some(1200),
            file_size_mb: Some(4.5),
        };
        assert_eq!(dataset.to_string(), "Dataset 3: Churn (4.50 MB, 1200 rows)");
    }
}
