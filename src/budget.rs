use chrono::Month;
use log::trace;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::category::CategoryError;
use crate::entity::CategoryId;
use crate::registry::Cashbox;

/// One year's plan for one category: the amount expected in and out each
/// month.
///
/// Budget rows are plain plan data, not validity-tracked entities: they are
/// created on first use, keyed by (year, category), and dropped when their
/// category is deleted.
#[derive(Debug)]
pub struct Budget {
    pub(crate) year: i32,
    pub(crate) category: CategoryId,
    pub(crate) deposits: [Option<Decimal>; 12],
    pub(crate) withdrawals: [Option<Decimal>; 12],
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BudgetError {
    #[error("budget years before 2001 are unsupported")]
    YearOutOfRange(i32),
    #[error("budget amounts must not be negative")]
    NegativeAmount,
    #[error(transparent)]
    Category(#[from] CategoryError),
}

impl Budget {
    fn new(year: i32, category: CategoryId) -> Self {
        Budget {
            year,
            category,
            deposits: [None; 12],
            withdrawals: [None; 12],
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    /// The planned deposit for a month, if one has been entered.
    pub fn deposit(&self, month: Month) -> Option<Decimal> {
        self.deposits[month.number_from_month() as usize - 1]
    }

    /// The planned withdrawal for a month, if one has been entered.
    pub fn withdrawal(&self, month: Month) -> Option<Decimal> {
        self.withdrawals[month.number_from_month() as usize - 1]
    }
}

impl Cashbox {
    /// Enter the planned deposit for (year, category, month), creating the
    /// budget row on first use.
    pub fn set_budget_deposit(
        &mut self,
        year: i32,
        category: CategoryId,
        month: Month,
        amount: Decimal,
    ) -> Result<(), BudgetError> {
        let budget = self.budget_slot(year, category, amount)?;
        budget.deposits[month.number_from_month() as usize - 1] = Some(amount);
        trace!("budget {}/{} deposit updated", year, category);
        Ok(())
    }

    /// Enter the planned withdrawal for (year, category, month), creating the
    /// budget row on first use.
    pub fn set_budget_withdrawal(
        &mut self,
        year: i32,
        category: CategoryId,
        month: Month,
        amount: Decimal,
    ) -> Result<(), BudgetError> {
        let budget = self.budget_slot(year, category, amount)?;
        budget.withdrawals[month.number_from_month() as usize - 1] = Some(amount);
        trace!("budget {}/{} withdrawal updated", year, category);
        Ok(())
    }

    /// The budget row for (year, category), if any amount has been entered.
    pub fn budget(&self, year: i32, category: CategoryId) -> Option<&Budget> {
        self.budgets.get(&(year, category))
    }

    /// All budget rows, ordered by year and then category name.
    pub fn budgets(&self) -> Vec<&Budget> {
        let mut budgets: Vec<&Budget> = self.budgets.values().collect();
        budgets.sort_by(|a, b| {
            a.year.cmp(&b.year).then_with(|| {
                self.budget_category_name(a.category)
                    .cmp(self.budget_category_name(b.category))
            })
        });
        budgets
    }

    fn budget_category_name(&self, id: CategoryId) -> &str {
        self.categories
            .get(&id)
            .map(|category| category.name.as_str())
            .unwrap_or("")
    }

    fn budget_slot(
        &mut self,
        year: i32,
        category: CategoryId,
        amount: Decimal,
    ) -> Result<&mut Budget, BudgetError> {
        if year <= 2000 {
            return Err(BudgetError::YearOutOfRange(year));
        }
        if amount < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        // Only registered categories can be budgeted; the sentinels cannot.
        self.category_registered(category)?;
        Ok(self
            .budgets
            .entry((year, category))
            .or_insert_with(|| Budget::new(year, category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use rust_decimal_macros::dec;

    fn ledger() -> (Cashbox, CategoryId) {
        let mut cashbox = Cashbox::new();
        let category = cashbox.create_category("Rent", "").unwrap();
        (cashbox, category)
    }

    #[test]
    fn set_budget_deposit_creates_the_row() {
        let (mut cashbox, category) = ledger();
        cashbox
            .set_budget_deposit(2026, category, Month::January, dec!(1200.00))
            .unwrap();
        let budget = cashbox.budget(2026, category).unwrap();
        assert_eq!(budget.year(), 2026);
        assert_eq!(budget.category(), category);
        assert_eq!(budget.deposit(Month::January), Some(dec!(1200.00)));
        assert_eq!(budget.deposit(Month::February), None);
        assert_eq!(budget.withdrawal(Month::January), None);
    }

    #[test]
    fn amounts_overwrite_per_month() {
        let (mut cashbox, category) = ledger();
        cashbox
            .set_budget_withdrawal(2026, category, Month::March, dec!(100.00))
            .unwrap();
        cashbox
            .set_budget_withdrawal(2026, category, Month::March, dec!(150.00))
            .unwrap();
        let budget = cashbox.budget(2026, category).unwrap();
        assert_eq!(budget.withdrawal(Month::March), Some(dec!(150.00)));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let (mut cashbox, category) = ledger();
        let result = cashbox.set_budget_deposit(2026, category, Month::May, dec!(-1.00));
        assert_eq!(result.err(), Some(BudgetError::NegativeAmount));
        assert!(cashbox.budget(2026, category).is_none());
    }

    #[test]
    fn early_years_are_rejected() {
        let (mut cashbox, category) = ledger();
        let result = cashbox.set_budget_deposit(2000, category, Month::May, dec!(1.00));
        assert_eq!(result.err(), Some(BudgetError::YearOutOfRange(2000)));
        assert!(cashbox
            .set_budget_deposit(2001, category, Month::May, dec!(1.00))
            .is_ok());
    }

    #[test]
    fn unknown_categories_cannot_be_budgeted() {
        let (mut cashbox, category) = ledger();
        cashbox.delete_category(category).unwrap();
        let result = cashbox.set_budget_deposit(2026, category, Month::May, dec!(1.00));
        assert_eq!(
            result.err(),
            Some(BudgetError::Category(CategoryError::Deleted(category)))
        );
        // The roll-up sentinel is not a budgetable category either.
        let result =
            cashbox.set_budget_deposit(2026, Category::NO_CATEGORY, Month::May, dec!(1.00));
        assert_eq!(
            result.err(),
            Some(BudgetError::Category(CategoryError::Deleted(
                Category::NO_CATEGORY
            )))
        );
    }

    #[test]
    fn budgets_order_by_year_then_category_name() {
        let (mut cashbox, rent) = ledger();
        let food = cashbox.create_category("Food", "").unwrap();
        cashbox
            .set_budget_deposit(2026, rent, Month::January, dec!(1.00))
            .unwrap();
        cashbox
            .set_budget_deposit(2025, rent, Month::January, dec!(1.00))
            .unwrap();
        cashbox
            .set_budget_deposit(2026, food, Month::January, dec!(1.00))
            .unwrap();
        let order: Vec<(i32, CategoryId)> = cashbox
            .budgets()
            .iter()
            .map(|b| (b.year(), b.category()))
            .collect();
        assert_eq!(order, vec![(2025, rent), (2026, food), (2026, rent)]);
    }

    #[test]
    fn deleting_a_category_drops_its_budgets() {
        let (mut cashbox, category) = ledger();
        cashbox
            .set_budget_deposit(2026, category, Month::January, dec!(1.00))
            .unwrap();
        cashbox.delete_category(category).unwrap();
        assert!(cashbox.budget(2026, category).is_none());
        assert!(cashbox.budgets().is_empty());
    }
}
