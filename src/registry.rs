use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::account::Account;
use crate::budget::Budget;
use crate::category::Category;
use crate::entity::{AccountId, CategoryId, Counters, LineItemId, TransactionId};

/// Uniqueness violations detected at registration time, before the record is
/// linked to anything else. Rejection leaves the prior state untouched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("an account with id {0} already exists")]
    DuplicateAccountId(AccountId),
    #[error("an account named {0:?} already exists")]
    DuplicateAccountName(String),
    #[error("an account at {0:?} with number {1:?} already exists")]
    DuplicateAccountNumber(String, String),
    #[error("a category with id {0} already exists")]
    DuplicateCategoryId(CategoryId),
    #[error("a category named {0:?} already exists")]
    DuplicateCategoryName(String),
}

/// The application's data in one place: every live account and category, plus
/// the budget plans.
///
/// The cashbox issues the ids the rest of the API consumes, enforces the
/// uniqueness constraints, and owns the whole entity graph. Relationships are
/// stored as ids; resolving an id that has been deleted fails instead of
/// dereferencing a stale record. All mutation goes through `&mut self`, so a
/// create or delete cascade is one critical section and no reader can observe
/// a half-updated graph.
///
/// A fresh value is an empty ledger; tests get isolation by constructing
/// their own.
#[derive(Debug)]
pub struct Cashbox {
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) categories: BTreeMap<CategoryId, Category>,
    pub(crate) budgets: BTreeMap<(i32, CategoryId), Budget>,
    // Owner indexes. Transactions live inside their account and line items
    // inside their transaction; these maps locate the owner from a bare id.
    pub(crate) transaction_owner: HashMap<TransactionId, AccountId>,
    pub(crate) item_owner: HashMap<LineItemId, TransactionId>,
    pub(crate) ids: Counters,
    pub(crate) no_category: Category,
    pub(crate) none_selected: Category,
}

impl Cashbox {
    pub fn new() -> Self {
        Cashbox {
            accounts: BTreeMap::new(),
            categories: BTreeMap::new(),
            budgets: BTreeMap::new(),
            transaction_owner: HashMap::new(),
            item_owner: HashMap::new(),
            ids: Counters::default(),
            no_category: Category::new(Category::NO_CATEGORY, "...", "..."),
            none_selected: Category::new(Category::NONE, "None", ""),
        }
    }

    /// Drop every account, category and budget and reset the id counters.
    ///
    /// Test support only; equivalent to starting over with a fresh value.
    pub fn clear(&mut self) {
        *self = Cashbox::new();
    }

    /// Every registered account, ordered by name.
    pub fn accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    /// Every registered category, ordered by name. The sentinel categories
    /// are not registered and never appear here.
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.values().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub(crate) fn ensure_account_id_free(&self, id: AccountId) -> Result<(), RegistryError> {
        if self.accounts.contains_key(&id) {
            return Err(RegistryError::DuplicateAccountId(id));
        }
        Ok(())
    }

    pub(crate) fn ensure_account_name_free(
        &self,
        name: &str,
        exclude: Option<AccountId>,
    ) -> Result<(), RegistryError> {
        let clash = self
            .accounts
            .values()
            .any(|account| Some(account.id) != exclude && account.name == name);
        if clash {
            return Err(RegistryError::DuplicateAccountName(name.to_owned()));
        }
        Ok(())
    }

    /// Accounts without an institution and number may coexist; the pair
    /// constraint applies once either field is set.
    pub(crate) fn ensure_account_number_free(
        &self,
        institution: &str,
        number: &str,
        exclude: Option<AccountId>,
    ) -> Result<(), RegistryError> {
        if institution.is_empty() && number.is_empty() {
            return Ok(());
        }
        let clash = self.accounts.values().any(|account| {
            Some(account.id) != exclude
                && account.institution == institution
                && account.number == number
        });
        if clash {
            return Err(RegistryError::DuplicateAccountNumber(
                institution.to_owned(),
                number.to_owned(),
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_category_id_free(&self, id: CategoryId) -> Result<(), RegistryError> {
        if self.categories.contains_key(&id) {
            return Err(RegistryError::DuplicateCategoryId(id));
        }
        Ok(())
    }

    pub(crate) fn ensure_category_name_free(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<(), RegistryError> {
        let clash = self
            .categories
            .values()
            .any(|category| Some(category.id) != exclude && category.name == name);
        if clash {
            return Err(RegistryError::DuplicateCategoryName(name.to_owned()));
        }
        Ok(())
    }
}

impl Default for Cashbox {
    fn default() -> Self {
        Cashbox::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountKind, MULTIPLE_ITEMS};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grocery_store_receipt_rolls_up() {
        let mut cashbox = Cashbox::new();
        let groceries = cashbox.create_category("Groceries", "Food at home").unwrap();
        let dining = cashbox.create_category("Dining", "Food out").unwrap();
        let account = cashbox
            .create_account(
                "WF Checking",
                "Wells Fargo",
                "123456789",
                AccountKind::Checking,
                "",
            )
            .unwrap();
        let transaction = cashbox
            .create_transaction(account, date(2009, 6, 2), "Albertsons", "101")
            .unwrap();
        cashbox
            .create_line_item(transaction, dec!(10.00), groceries, "Groceries")
            .unwrap();
        cashbox
            .create_line_item(transaction, dec!(5.00), dining, "Tip")
            .unwrap();

        let transaction = cashbox.transaction(transaction).unwrap();
        assert_eq!(transaction.amount(), dec!(15.00));
        assert_eq!(
            cashbox.transaction_description(transaction.id()).unwrap(),
            MULTIPLE_ITEMS
        );
    }

    #[test]
    fn new_cashbox_is_empty() {
        let cashbox = Cashbox::new();
        assert!(cashbox.accounts().is_empty());
        assert!(cashbox.categories().is_empty());
        assert!(cashbox.budgets().is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut cashbox = Cashbox::new();
        let first = cashbox
            .create_account("Checking", "", "", AccountKind::Checking, "")
            .unwrap();
        cashbox.delete_account(first);
        let second = cashbox
            .create_account("Checking", "", "", AccountKind::Checking, "")
            .unwrap();
        assert_eq!(first.value(), 0);
        assert_eq!(second.value(), 1);
    }

    #[test]
    fn clear_resets_counters() {
        let mut cashbox = Cashbox::new();
        cashbox
            .create_account("Checking", "", "", AccountKind::Checking, "")
            .unwrap();
        cashbox.create_category("Groceries", "").unwrap();
        cashbox.clear();
        assert!(cashbox.accounts().is_empty());
        assert!(cashbox.categories().is_empty());
        let account = cashbox
            .create_account("Savings", "", "", AccountKind::Savings, "")
            .unwrap();
        assert_eq!(account.value(), 0);
    }
}
