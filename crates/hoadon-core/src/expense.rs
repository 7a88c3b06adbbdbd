//! Keyword classification of expenses into tax categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Expense category used for deductibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Materials,
    Rent,
    Utilities,
    Labor,
    Depreciation,
    Other,
}

/// Categories in matching order with their keywords.
const CATEGORY_KEYWORDS: &[(ExpenseCategory, &[&str])] = &[
    (
        ExpenseCategory::Materials,
        &["thực phẩm", "nguyên liệu", "hàng hóa", "vật liệu"],
    ),
    (ExpenseCategory::Rent, &["thuê", "mặt bằng", "nhà"]),
    (
        ExpenseCategory::Utilities,
        &["điện", "nước", "internet", "viễn thông"],
    ),
    (ExpenseCategory::Labor, &["lương", "công", "nhân viên"]),
    (ExpenseCategory::Depreciation, &["máy móc", "thiết bị"]),
];

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Materials => "materials",
            ExpenseCategory::Rent => "rent",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Labor => "labor",
            ExpenseCategory::Depreciation => "depreciation",
            ExpenseCategory::Other => "other",
        }
    }

    /// Vietnamese display name.
    pub fn name_vi(&self) -> &'static str {
        match self {
            ExpenseCategory::Materials => "Nguyên vật liệu",
            ExpenseCategory::Rent => "Thuê mặt bằng",
            ExpenseCategory::Utilities => "Điện nước internet",
            ExpenseCategory::Labor => "Nhân công",
            ExpenseCategory::Depreciation => "Khấu hao",
            ExpenseCategory::Other => "Khác",
        }
    }

    pub fn is_deductible(&self) -> bool {
        !matches!(self, ExpenseCategory::Other)
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category assigned to a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseClassification {
    pub category: ExpenseCategory,
    pub is_deductible: bool,
}

/// Classify a free-text description. The first category with a keyword
/// contained in the description wins.
pub fn classify(description: &str) -> ExpenseClassification {
    let lower: String = description.nfc().collect::<String>().to_lowercase();

    let category = CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(ExpenseCategory::Other);

    ExpenseClassification {
        category,
        is_deductible: category.is_deductible(),
    }
}
