/// Tag assigned to a transaction description for billing-cycle purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Salary,
    CardSettlement,
    Other,
}

impl Tag {
    /// Salary and card settlements posted early in a month belong to the previous month.
    pub fn is_billing(&self) -> bool {
        !matches!(self, Tag::Other)
    }
}

/// Pattern recognition used by attribution, aggregation and ingestion.
pub trait Classifier {
    fn classify(&self, description: &str, amount: i64) -> Tag;
    fn is_transfer(&self, description: &str) -> bool;
}

pub const SALARY_PATTERNS: &[&str] = &["משכורת", "salary", "payroll"];

pub const CARD_PATTERNS: &[&str] = &[
    "ישראכרט",
    "מקס איט",
    "לאומי קארד",
    "כרטיסי אשראי ל",
    "אמריקן אקספרס",
    "דיינרס",
    "isracard",
    "max it",
];

/// Lump-sum postings that duplicate itemized card activity, and account-to-account moves.
pub const TRANSFER_PATTERNS: &[&str] = &[
    "מקס איט פיננסים",
    "ישראכרט בע\"מ",
    "לאומי קארד בע\"מ",
    "כרטיסי אשראי לישראל",
    "העברה בין חשבונות",
    "העברה לחשבון",
    "transfer to",
    "transfer from",
];

/// Case-insensitive substring matcher over three pattern lists.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    salary: Vec<String>,
    card: Vec<String>,
    transfer: Vec<String>,
}

impl PatternClassifier {
    pub fn new(salary: &[&str], card: &[&str], transfer: &[&str]) -> Self {
        let lower = |list: &[&str]| list.iter().map(|p| p.to_lowercase()).collect();
        Self {
            salary: lower(salary),
            card: lower(card),
            transfer: lower(transfer),
        }
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new(SALARY_PATTERNS, CARD_PATTERNS, TRANSFER_PATTERNS)
    }
}

fn contains_any(haystack: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| haystack.contains(p.as_str()))
}

impl Classifier for PatternClassifier {
    fn classify(&self, description: &str, amount: i64) -> Tag {
        let desc = description.to_lowercase();
        if amount > 0 && contains_any(&desc, &self.salary) {
            Tag::Salary
        } else if contains_any(&desc, &self.card) {
            Tag::CardSettlement
        } else {
            Tag::Other
        }
    }

    fn is_transfer(&self, description: &str) -> bool {
        contains_any(&description.to_lowercase(), &self.transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_requires_positive_amount() {
        let c = PatternClassifier::default();
        assert_eq!(c.classify("משכורת פברואר", 1_300_000), Tag::Salary);
        assert_eq!(c.classify("משכורת פברואר", -5_000), Tag::Other);
    }

    #[test]
    fn test_card_settlement_any_sign() {
        let c = PatternClassifier::default();
        assert_eq!(c.classify("ישראכרט חיוב חודשי", -450_000), Tag::CardSettlement);
        assert_eq!(c.classify("MAX IT FINANCE", -12_000), Tag::CardSettlement);
    }

    #[test]
    fn test_other_descriptions() {
        let c = PatternClassifier::default();
        assert_eq!(c.classify("שופרסל דיל", -23_450), Tag::Other);
        assert!(!Tag::Other.is_billing());
        assert!(Tag::Salary.is_billing());
    }

    #[test]
    fn test_transfer_is_case_insensitive() {
        let c = PatternClassifier::default();
        assert!(c.is_transfer("Online TRANSFER TO savings"));
        assert!(c.is_transfer("העברה בין חשבונות 123"));
        assert!(!c.is_transfer("רמי לוי"));
    }

    #[test]
    fn test_custom_lists() {
        let c = PatternClassifier::new(&["BONUS"], &[], &["Internal"]);
        assert_eq!(c.classify("yearly bonus", 100), Tag::Salary);
        assert!(c.is_transfer("internal move"));
        assert_eq!(c.classify("ישראכרט", -100), Tag::Other);
    }
}
