use finance_core::{IncomeAggregate, TaxDocumentTotals};
use rust_decimal::Decimal;

fn normalize_form(form_type: &str) -> String {
    form_type
        .trim()
        .to_ascii_uppercase()
        .replace(' ', "")
        .replace("W2", "W-2")
}

/// Fold per-form document totals into one income aggregate.
///
/// Brokerage proceeds less basis count as capital gains, clamped at zero.
/// Withholding is summed across every form, including unrecognised ones.
pub fn aggregate_income(documents: &[TaxDocumentTotals]) -> IncomeAggregate {
    let mut income = IncomeAggregate::default();
    let mut proceeds = Decimal::ZERO;
    let mut basis = Decimal::ZERO;

    for doc in documents {
        match normalize_form(&doc.form_type).as_str() {
            "W-2" => income.wages += doc.wages,
            "1099-INT" => income.interest_income += doc.interest,
            "1099-DIV" => income.ordinary_dividends += doc.dividends,
            "1099-B" => {
                proceeds += doc.proceeds;
                basis += doc.cost_basis;
            }
            other => tracing::debug!("Form {} contributes withholding only", other),
        }
        income.tax_withheld += doc.withheld;
    }

    income.capital_gains_net = (proceeds - basis).max(Decimal::ZERO);
    income
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn doc(form: &str) -> TaxDocumentTotals {
        TaxDocumentTotals {
            form_type: form.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregate_by_form() {
        let docs = vec![
            TaxDocumentTotals { wages: dec!(95000), withheld: dec!(12000), ..doc("W-2") },
            TaxDocumentTotals { interest: dec!(420.50), ..doc("1099-INT") },
            TaxDocumentTotals { dividends: dec!(1800), withheld: dec!(50), ..doc("1099-DIV") },
            TaxDocumentTotals { proceeds: dec!(30000), cost_basis: dec!(22000), ..doc("1099-B") },
            TaxDocumentTotals { withheld: dec!(300), ..doc("1099-R") },
        ];
        let income = aggregate_income(&docs);
        assert_eq!(income.wages, dec!(95000));
        assert_eq!(income.interest_income, dec!(420.50));
        assert_eq!(income.ordinary_dividends, dec!(1800));
        assert_eq!(income.capital_gains_net, dec!(8000));
        assert_eq!(income.tax_withheld, dec!(12350));
    }

    #[test]
    fn test_net_brokerage_loss_clamped() {
        let docs = vec![TaxDocumentTotals { proceeds: dec!(5000), cost_basis: dec!(9000), ..doc("1099-B") }];
        assert_eq!(aggregate_income(&docs).capital_gains_net, Decimal::ZERO);
    }

    #[test]
    fn test_form_spelling_variants() {
        let docs = vec![TaxDocumentTotals { wages: dec!(100), ..doc(" w2 ") }];
        assert_eq!(aggregate_income(&docs).wages, dec!(100));
    }
}
