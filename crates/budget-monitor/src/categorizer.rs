//! Keyword Categorization
//!
//! Ordered `(pattern, category, subcategory)` rules matched case-insensitively
//! against `"{merchant} {name}"`. The first matching rule wins, so rule order
//! is part of the behaviour: "uber eats" must be tried before "uber".

use finance_core::{FinanceError, FinanceResult, TransactionRecord};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNCATEGORIZED: (&str, &str) = ("Uncategorized", "Other");

const DEFAULT_RULES: &[(&str, &str, &str)] = &[
    (r"netflix|spotify|hulu|disney\+|apple tv|hbo|peacock|paramount", "Entertainment", "Streaming"),
    (r"amazon|walmart|target|costco|sam'?s club|whole foods", "Shopping", "Retail"),
    (r"uber eats|doordash|grubhub|instacart|postmates", "Food & Dining", "Food Delivery"),
    (
        r"mcdonald|starbucks|chick-fil-a|chipotle|subway|pizza|restaurant|cafe|diner|sushi|tacos|burger",
        "Food & Dining",
        "Restaurants",
    ),
    (r"uber|lyft|taxi|transit|metro|mta|bart|caltrain|amtrak", "Transportation", "Transit"),
    (r"shell|chevron|bp|exxon|mobil|sunoco|marathon|speedway|gas station", "Transportation", "Gas & Fuel"),
    (r"cvs|walgreens|rite aid|pharmacy|rx|prescription", "Health", "Pharmacy"),
    (r"gym|planet fitness|equinox|crossfit|ymca|lifetime fitness", "Health", "Fitness"),
    (r"rent|lease|apartment|property management", "Housing", "Rent"),
    (r"electric|gas|water|sewer|utility|pg&e|con ed|dominion", "Bills & Utilities", "Utilities"),
    (r"at&t|verizon|t-mobile|sprint|comcast|xfinity|charter|spectrum", "Bills & Utilities", "Phone & Internet"),
    (r"transfer|zelle|venmo|paypal|cash app|wire", "Transfer", "Transfer"),
    (r"paycheck|direct deposit|salary|payroll", "Income", "Paycheck"),
    (r"interest|dividend|refund", "Income", "Interest & Dividends"),
];

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub pattern: Regex,
    pub category: String,
    pub subcategory: String,
}

impl CategoryRule {
    pub fn new(pattern: &str, category: &str, subcategory: &str) -> FinanceResult<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| FinanceError::InvalidInput(format!("bad category pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            pattern,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub id: String,
    pub category: String,
    pub subcategory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationReport {
    pub categorized: usize,
    pub assignments: Vec<CategoryAssignment>,
    pub by_category: BTreeMap<String, usize>,
    pub message: String,
}

pub struct KeywordCategorizer {
    rules: Vec<CategoryRule>,
    max_scan: usize,
}

impl KeywordCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules, max_scan: 1000 }
    }

    pub fn with_default_rules() -> FinanceResult<Self> {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(pattern, category, subcategory)| CategoryRule::new(pattern, category, subcategory))
            .collect::<FinanceResult<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Category and subcategory for one merchant/name pair.
    pub fn categorize(&self, merchant_name: Option<&str>, name: &str) -> (&str, &str) {
        let text = format!("{} {}", merchant_name.unwrap_or(""), name);
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&text))
            .map(|rule| (rule.category.as_str(), rule.subcategory.as_str()))
            .unwrap_or(UNCATEGORIZED)
    }

    /// Assign categories to transactions that have none, scanning at most 1000.
    pub fn run(&self, transactions: &[TransactionRecord]) -> CategorizationReport {
        let mut assignments = Vec::new();
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();

        for txn in transactions
            .iter()
            .filter(|t| t.category.is_none())
            .take(self.max_scan)
        {
            let (category, subcategory) = self.categorize(txn.merchant_name.as_deref(), &txn.name);
            *by_category.entry(category.to_string()).or_insert(0) += 1;
            assignments.push(CategoryAssignment {
                id: txn.id.clone(),
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            });
        }

        let message = if assignments.is_empty() {
            "No uncategorized transactions found.".to_string()
        } else {
            format!("Categorized {} transaction(s).", assignments.len())
        };
        tracing::info!("{}", message);

        CategorizationReport {
            categorized: assignments.len(),
            assignments,
            by_category,
            message,
        }
    }
}
