//! Tax-Loss Harvesting Engine
//!
//! Finds positions whose unrealized loss could be realized for tax purposes,
//! estimates the savings at the applicable capital-gains rate and flags
//! positions with a recent purchase that would trigger the wash sale rule.

use chrono::NaiveDate;
use finance_core::numeric::round_currency;
use finance_core::{EngineConfig, HoldingPosition, TransactionRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::wash_sale::WashSaleWindow;

const WASH_SALE_NOTE: &str = "Wash sale rule: buying a substantially identical security within 30 days \
before or after the sale disallows the loss. Opportunities at wash-sale risk are excluded from the actionable total.";

/// Priority level for harvesting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestPriority {
    /// Under $250 of savings
    Low,
    /// $250 to $1,000
    Medium,
    /// $1,000 or more
    High,
}

impl HarvestPriority {
    pub fn from_savings(savings: Decimal) -> Self {
        if savings >= dec!(1000) {
            Self::High
        } else if savings >= dec!(250) {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A tax-loss harvesting opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestOpportunity {
    /// Security symbol
    pub ticker: String,
    /// Security name, if the holding carries one
    pub security_name: Option<String>,
    /// Account holding the position
    pub account_name: Option<String>,
    /// Number of shares
    pub quantity: Decimal,
    /// Total cost basis
    pub cost_basis: Decimal,
    /// Current market value
    pub market_value: Decimal,
    /// Signed, so always negative here.
    pub unrealized_loss: Decimal,
    /// Date the position was acquired
    pub acquisition_date: Option<NaiveDate>,
    /// `None` when the acquisition date is unknown.
    pub holding_days: Option<i64>,
    /// Held longer than the long-term threshold
    pub is_long_term: bool,
    /// Rate applied to the loss (short- or long-term)
    pub tax_rate: Decimal,
    /// Loss magnitude times `tax_rate`
    pub estimated_tax_savings: Decimal,
    /// Priority tier from the savings estimate
    pub priority: HarvestPriority,
    /// A purchase inside the wash sale window exists
    pub wash_sale_risk: bool,
    /// Ids of the purchases that triggered the risk
    pub wash_sale_transactions: Vec<String>,
    /// First date a sale avoids every triggering purchase
    pub wash_sale_safe_date: Option<NaiveDate>,
}

/// Harvest scan results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Date holdings and windows were evaluated against
    pub reference_date: NaiveDate,
    /// Every qualifying loss, largest first
    pub opportunities: Vec<HarvestOpportunity>,
    /// Opportunities without wash sale risk
    pub actionable: Vec<HarvestOpportunity>,
    pub opportunity_count: usize,
    pub actionable_count: usize,
    /// Savings over the actionable subset only.
    pub total_potential_tax_savings: Decimal,
    /// Reminder of the wash sale rule
    pub note: String,
    /// Set when no opportunities were found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Harvesting engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestingConfig {
    /// Loss magnitude must strictly exceed this (in dollars)
    pub min_loss_threshold: Decimal,
    /// Rate for positions held one year or less
    pub short_term_rate: Decimal,
    /// Rate for long-term positions
    pub long_term_rate: Decimal,
    /// Held strictly longer than this many days is long-term
    pub long_term_threshold_days: i64,
    /// Days on either side of the sale checked for repurchases
    pub wash_sale_window_days: i64,
    /// Restrict the scan to one ticker
    pub ticker_filter: Option<String>,
}

impl Default for HarvestingConfig {
    fn default() -> Self {
        Self {
            min_loss_threshold: dec!(1000),
            short_term_rate: dec!(0.37),
            long_term_rate: dec!(0.20),
            long_term_threshold_days: 365,
            wash_sale_window_days: 30,
            ticker_filter: None,
        }
    }
}

impl HarvestingConfig {
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            min_loss_threshold: config.harvest_min_loss,
            short_term_rate: config.harvest_short_term_rate,
            long_term_rate: config.harvest_long_term_rate,
            ..Self::default()
        }
    }

    pub fn with_ticker(mut self, ticker: Option<String>) -> Self {
        self.ticker_filter = ticker.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.wash_sale_window_days = days;
        self
    }
}

/// Scans holdings for harvestable losses
pub struct TaxLossHarvestAnalyzer {
    config: HarvestingConfig,
}

impl TaxLossHarvestAnalyzer {
    pub fn new(config: HarvestingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarvestingConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        holdings: &[HoldingPosition],
        transactions: &[TransactionRecord],
        reference_date: NaiveDate,
    ) -> HarvestReport {
        let threshold = -self.config.min_loss_threshold;
        let mut candidates: Vec<(&HoldingPosition, Decimal)> = holdings
            .iter()
            .filter(|h| self.matches_filter(h))
            .filter(|h| h.unrealized_gain_loss < threshold)
            .map(|h| (h, self.estimate_savings(h, reference_date)))
            .collect();

        candidates.sort_by(|(a, _), (b, _)| {
            a.unrealized_gain_loss
                .cmp(&b.unrealized_gain_loss)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });

        let mut opportunities = Vec::with_capacity(candidates.len());
        let mut actionable_savings = Decimal::ZERO;

        for (holding, savings) in candidates {
            let window = WashSaleWindow::around(&holding.ticker, reference_date, self.config.wash_sale_window_days);
            let check = window.check(transactions);
            if !check.at_risk {
                actionable_savings += savings;
            }

            let holding_days = holding.acquisition_date.map(|d| (reference_date - d).num_days());
            let is_long_term = self.is_long_term(holding_days);

            opportunities.push(HarvestOpportunity {
                ticker: holding.ticker.clone(),
                security_name: holding.security_name.clone(),
                account_name: holding.account_name.clone(),
                quantity: holding.quantity,
                cost_basis: round_currency(holding.cost_basis_total),
                market_value: round_currency(holding.market_value),
                unrealized_loss: round_currency(holding.unrealized_gain_loss),
                acquisition_date: holding.acquisition_date,
                holding_days,
                is_long_term,
                tax_rate: self.rate_for(is_long_term),
                estimated_tax_savings: round_currency(savings),
                priority: HarvestPriority::from_savings(savings),
                wash_sale_risk: check.at_risk,
                wash_sale_transactions: check.matching_transaction_ids,
                wash_sale_safe_date: check.safe_date,
            });
        }

        let actionable: Vec<HarvestOpportunity> = opportunities
            .iter()
            .filter(|o| !o.wash_sale_risk)
            .cloned()
            .collect();

        tracing::info!(
            "Found {} harvest opportunities ({} actionable), potential savings {}",
            opportunities.len(),
            actionable.len(),
            round_currency(actionable_savings)
        );

        let message = opportunities.is_empty().then(|| {
            format!(
                "No positions with unrealized losses greater than ${}",
                round_currency(self.config.min_loss_threshold)
            )
        });

        HarvestReport {
            reference_date,
            opportunity_count: opportunities.len(),
            actionable_count: actionable.len(),
            opportunities,
            actionable,
            total_potential_tax_savings: round_currency(actionable_savings),
            note: WASH_SALE_NOTE.to_string(),
            message,
        }
    }

    fn matches_filter(&self, holding: &HoldingPosition) -> bool {
        match &self.config.ticker_filter {
            Some(ticker) => holding.ticker.eq_ignore_ascii_case(ticker.trim()),
            None => true,
        }
    }

    fn is_long_term(&self, holding_days: Option<i64>) -> bool {
        holding_days.is_some_and(|days| days > self.config.long_term_threshold_days)
    }

    fn rate_for(&self, is_long_term: bool) -> Decimal {
        if is_long_term {
            self.config.long_term_rate
        } else {
            self.config.short_term_rate
        }
    }

    /// Loss magnitude times the applicable rate, unrounded.
    fn estimate_savings(&self, holding: &HoldingPosition, reference_date: NaiveDate) -> Decimal {
        let holding_days = holding.acquisition_date.map(|d| (reference_date - d).num_days());
        holding.unrealized_gain_loss.abs() * self.rate_for(self.is_long_term(holding_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn holding(ticker: &str, loss: Decimal, held_days: Option<i64>) -> HoldingPosition {
        HoldingPosition {
            ticker: ticker.to_string(),
            security_name: Some(format!("{} Fund", ticker)),
            asset_class: Some("etf".to_string()),
            quantity: dec!(10),
            cost_basis_total: dec!(10000),
            market_value: dec!(10000) + loss,
            unrealized_gain_loss: loss,
            acquisition_date: held_days.map(|d| today() - Duration::days(d)),
            account_name: Some("Brokerage".to_string()),
        }
    }

    fn buy(id: &str, name: &str, days_from_today: i64) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            name: name.to_string(),
            merchant_name: None,
            amount: dec!(-500),
            date: today() + Duration::days(days_from_today),
            pending: false,
            category: None,
        }
    }

    #[test]
    fn test_long_term_loss_savings() {
        let analyzer = TaxLossHarvestAnalyzer::new(HarvestingConfig::default());
        let report = analyzer.analyze(&[holding("VXUS", dec!(-1500), Some(400))], &[], today());

        assert_eq!(report.opportunity_count, 1);
        let opp = &report.opportunities[0];
        assert!(opp.is_long_term);
        assert_eq!(opp.holding_days, Some(400));
        assert_eq!(opp.estimated_tax_savings, dec!(300.00));
        assert_eq!(opp.priority, HarvestPriority::Medium);
        assert_eq!(report.total_potential_tax_savings, dec!(300.00));
        assert_eq!(report.actionable_count, 1);
    }

    #[test]
    fn test_wash_sale_risk_excluded_from_actionable() {
        let analyzer = TaxLossHarvestAnalyzer::new(HarvestingConfig::default());
        let holdings = vec![holding("VXUS", dec!(-1500), Some(400)), holding("BND", dec!(-2000), Some(100))];
        let transactions = vec![buy("t1", "Purchase VXUS", -25)];
        let report = analyzer.analyze(&holdings, &transactions, today());

        assert_eq!(report.opportunity_count, 2);
        assert_eq!(report.actionable_count, 1);
        // BND short-term: 2000 * 0.37
        assert_eq!(report.total_potential_tax_savings, dec!(740.00));

        let vxus = report.opportunities.iter().find(|o| o.ticker == "VXUS").unwrap();
        assert!(vxus.wash_sale_risk);
        assert_eq!(vxus.wash_sale_transactions, vec!["t1".to_string()]);
        assert_eq!(vxus.wash_sale_safe_date, Some(today() + Duration::days(6)));
    }

    #[test]
    fn test_holding_period_boundary() {
        let analyzer = TaxLossHarvestAnalyzer::new(HarvestingConfig::default());
        let report = analyzer.analyze(
            &[
                holding("AAA", dec!(-2000), Some(365)),
                holding("BBB", dec!(-2000), Some(366)),
                holding("CCC", dec!(-2000), None),
            ],
            &[],
            today(),
        );
        let by_ticker = |t: &str| report.opportunities.iter().find(|o| o.ticker == t).unwrap();
        assert!(!by_ticker("AAA").is_long_term);
        assert!(by_ticker("BBB").is_long_term);
        assert!(!by_ticker("CCC").is_long_term);
        assert_eq!(by_ticker("CCC").holding_days, None);
        assert_eq!(by_ticker("CCC").estimated_tax_savings, dec!(740.00));
    }

    #[test]
    fn test_threshold_is_strict_and_order_is_by_loss() {
        let analyzer = TaxLossHarvestAnalyzer::new(HarvestingConfig::default());
        let report = analyzer.analyze(
            &[
                holding("EXACT", dec!(-1000), Some(10)),
                holding("SMALL", dec!(-1200), Some(10)),
                holding("BIG", dec!(-5000), Some(10)),
                holding("GAIN", dec!(800), Some(10)),
            ],
            &[],
            today(),
        );
        let tickers: Vec<&str> = report.opportunities.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["BIG", "SMALL"]);
        assert_eq!(report.opportunities[0].priority, HarvestPriority::High);
    }

    #[test]
    fn test_ticker_filter_and_empty_message() {
        let config = HarvestingConfig::default().with_ticker(Some("vti".to_string()));
        let analyzer = TaxLossHarvestAnalyzer::new(config);
        let report = analyzer.analyze(&[holding("BND", dec!(-3000), Some(10))], &[], today());
        assert!(report.opportunities.is_empty());
        assert_eq!(report.total_potential_tax_savings, Decimal::ZERO);
        assert!(report.message.is_some());
    }

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(HarvestPriority::from_savings(dec!(249.99)), HarvestPriority::Low);
        assert_eq!(HarvestPriority::from_savings(dec!(250)), HarvestPriority::Medium);
        assert_eq!(HarvestPriority::from_savings(dec!(1000)), HarvestPriority::High);
    }

    #[test]
    fn test_idempotent() {
        let analyzer = TaxLossHarvestAnalyzer::new(HarvestingConfig::default());
        let holdings = vec![holding("VXUS", dec!(-1500), Some(400))];
        let first = serde_json::to_string(&analyzer.analyze(&holdings, &[], today())).unwrap();
        let second = serde_json::to_string(&analyzer.analyze(&holdings, &[], today())).unwrap();
        assert_eq!(first, second);
    }
}
