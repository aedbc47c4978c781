//! Error category, derived from the code's leading digit

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Permission,
    Branch,
    Order,
    Payment,
    Pos,
    Kitchen,
    Delivery,
    /// 9xxx and anything past it
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        const BY_THOUSAND: [ErrorCategory; 9] = [
            ErrorCategory::General,
            ErrorCategory::Auth,
            ErrorCategory::Permission,
            ErrorCategory::Branch,
            ErrorCategory::Order,
            ErrorCategory::Payment,
            ErrorCategory::Pos,
            ErrorCategory::Kitchen,
            ErrorCategory::Delivery,
        ];
        BY_THOUSAND
            .get(usize::from(code / 1000))
            .copied()
            .unwrap_or(ErrorCategory::System)
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
