use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, trace};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountError;
use crate::category::{Category, CategoryError};
use crate::entity::{AccountId, CategoryId, Invalidated, LineItemId, TransactionId};
use crate::line_item::LineItem;
use crate::registry::Cashbox;
use crate::transfer::TransferLink;

/// Description reported when a transaction's line items disagree.
pub const MULTIPLE_ITEMS: &str = "...";

/// One receipt: a dated record holding one or more line items, so a purchase
/// can be split across categories.
///
/// Amount, description and category are roll-ups over the current items, not
/// stored fields. With exactly one item they report that item's values; with
/// any other count the description falls back to [`MULTIPLE_ITEMS`] and the
/// category to [`Category::NO_CATEGORY`], while the amount is always the sum.
#[derive(Debug)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    pub(crate) date: NaiveDate,
    pub(crate) payee: String,
    pub(crate) check_nr: String,
    pub(crate) items: BTreeMap<LineItemId, LineItem>,
    pub(crate) transfer: Option<TransferLink>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction {0} has been deleted")]
    Deleted(TransactionId),
    #[error("a transaction with id {0} already exists in this account")]
    DuplicateId(TransactionId),
    #[error("the transaction does not have exactly one line item")]
    NotSingleItem,
    #[error("a transfer's description is derived from its destination account")]
    TransferDescription,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Category(#[from] CategoryError),
}

impl Transaction {
    pub(crate) fn new(
        id: TransactionId,
        date: NaiveDate,
        payee: &str,
        check_nr: &str,
        transfer: Option<TransferLink>,
    ) -> Self {
        Transaction {
            id,
            date,
            payee: payee.trim().to_owned(),
            check_nr: check_nr.trim().to_owned(),
            items: BTreeMap::new(),
            transfer,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn payee(&self) -> &str {
        &self.payee
    }

    pub fn check_nr(&self) -> &str {
        &self.check_nr
    }

    /// Line items, ordered by ascending id.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.values()
    }

    /// The pairing data if this transaction is one leg of a transfer.
    pub fn transfer(&self) -> Option<&TransferLink> {
        self.transfer.as_ref()
    }

    /// Sum of the line item amounts.
    pub fn amount(&self) -> Decimal {
        self.items
            .values()
            .fold(Decimal::ZERO, |total, item| total + item.amount())
    }

    /// The sole item's category, or [`Category::NO_CATEGORY`] when the item
    /// count is not exactly one.
    pub fn category(&self) -> CategoryId {
        match self.sole_item() {
            Some(item) => item.category(),
            None => Category::NO_CATEGORY,
        }
    }

    fn sole_item(&self) -> Option<&LineItem> {
        if self.items.len() == 1 {
            self.items.values().next()
        } else {
            None
        }
    }

    fn sole_item_mut(&mut self) -> Option<&mut LineItem> {
        if self.items.len() == 1 {
            self.items.values_mut().next()
        } else {
            None
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transaction {}

impl Cashbox {
    /// Create a transaction on an account.
    ///
    /// Payee and check number are trimmed. Fails if the account is no longer
    /// live; the account's insert rejects a duplicate id within the account.
    pub fn create_transaction(
        &mut self,
        account: AccountId,
        date: NaiveDate,
        payee: &str,
        check_nr: &str,
    ) -> Result<TransactionId, TransactionError> {
        self.account(account)?;
        let id = TransactionId(self.ids.transaction.next());
        let transaction = Transaction::new(id, date, payee, check_nr, None);
        self.account_mut(account)?.insert_transaction(transaction)?;
        self.transaction_owner.insert(id, account);
        trace!("transaction {} added to account {}", id, account);
        Ok(id)
    }

    /// Resolve a transaction id against the current graph.
    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction, TransactionError> {
        self.transaction_owner
            .get(&id)
            .and_then(|owner| self.accounts.get(owner))
            .and_then(|account| account.transactions.get(&id))
            .ok_or(TransactionError::Deleted(id))
    }

    pub(crate) fn transaction_mut(
        &mut self,
        id: TransactionId,
    ) -> Result<&mut Transaction, TransactionError> {
        let owner = match self.transaction_owner.get(&id) {
            Some(owner) => *owner,
            None => return Err(TransactionError::Deleted(id)),
        };
        self.accounts
            .get_mut(&owner)
            .and_then(|account| account.transactions.get_mut(&id))
            .ok_or(TransactionError::Deleted(id))
    }

    /// Delete a transaction, cascading to its line items and, for a transfer
    /// leg, to the paired leg in the other account.
    ///
    /// Idempotent: deleting an id that is no longer live is a no-op. The
    /// owning account drops the transaction in the same step.
    pub fn delete_transaction(&mut self, id: TransactionId) -> Vec<Invalidated> {
        let mut events = Vec::new();
        self.remove_transaction(id, &mut events);
        events
    }

    // Reaction half of the invalidation protocol: pull the transaction out of
    // its owning account, then discard it.
    pub(crate) fn remove_transaction(&mut self, id: TransactionId, events: &mut Vec<Invalidated>) {
        let owner = match self.transaction_owner.get(&id) {
            Some(owner) => *owner,
            None => return,
        };
        let transaction = match self
            .accounts
            .get_mut(&owner)
            .and_then(|account| account.transactions.remove(&id))
        {
            Some(transaction) => transaction,
            None => return,
        };
        self.discard_transaction(id, transaction, events);
    }

    // Invalidate a transaction that has already left its owning collection,
    // cascading to its line items and any paired transfer leg. The paired leg
    // no-ops when it has already been discarded, which terminates the mutual
    // recursion between the two legs.
    pub(crate) fn discard_transaction(
        &mut self,
        id: TransactionId,
        transaction: Transaction,
        events: &mut Vec<Invalidated>,
    ) {
        self.transaction_owner.remove(&id);
        debug!("transaction {} invalidated", id);
        events.push(Invalidated::transaction(id));
        for (item_id, _) in transaction.items {
            self.item_owner.remove(&item_id);
            debug!("line item {} invalidated", item_id);
            events.push(Invalidated::line_item(item_id));
        }
        if let Some(link) = transaction.transfer {
            self.remove_transaction(link.dest_leg, events);
        }
    }

    pub fn set_transaction_date(
        &mut self,
        id: TransactionId,
        date: NaiveDate,
    ) -> Result<(), TransactionError> {
        self.transaction_mut(id)?.date = date;
        trace!("transaction {} redated", id);
        Ok(())
    }

    pub fn set_transaction_payee(
        &mut self,
        id: TransactionId,
        payee: &str,
    ) -> Result<(), TransactionError> {
        self.transaction_mut(id)?.payee = payee.trim().to_owned();
        trace!("transaction {} payee updated", id);
        Ok(())
    }

    pub fn set_transaction_check_nr(
        &mut self,
        id: TransactionId,
        check_nr: &str,
    ) -> Result<(), TransactionError> {
        self.transaction_mut(id)?.check_nr = check_nr.trim().to_owned();
        trace!("transaction {} check number updated", id);
        Ok(())
    }

    /// Roll-up description: the sole item's description, a synthesized
    /// "Transfer with {account}" for transfer legs, or [`MULTIPLE_ITEMS`]
    /// when the items disagree.
    pub fn transaction_description(&self, id: TransactionId) -> Result<String, TransactionError> {
        let transaction = self.transaction(id)?;
        if let Some(link) = transaction.transfer() {
            let dest = self.account(link.dest_account)?;
            return Ok(format!("Transfer with {}", dest.name()));
        }
        Ok(match transaction.sole_item() {
            Some(item) => item.description().to_owned(),
            None => MULTIPLE_ITEMS.to_owned(),
        })
    }

    /// Set the description of the sole line item.
    ///
    /// Fails on a transfer leg (its description is synthesized) and on any
    /// transaction whose item count is not exactly one.
    pub fn set_transaction_description(
        &mut self,
        id: TransactionId,
        description: &str,
    ) -> Result<(), TransactionError> {
        let transaction = self.transaction_mut(id)?;
        if transaction.transfer.is_some() {
            return Err(TransactionError::TransferDescription);
        }
        match transaction.sole_item_mut() {
            Some(item) => item.description = description.trim().to_owned(),
            None => return Err(TransactionError::NotSingleItem),
        }
        trace!("transaction {} description updated", id);
        Ok(())
    }

    /// Set the category of the sole line item.
    pub fn set_transaction_category(
        &mut self,
        id: TransactionId,
        category: CategoryId,
    ) -> Result<(), TransactionError> {
        self.transaction(id)?;
        self.category(category)?;
        match self.transaction_mut(id)?.sole_item_mut() {
            Some(item) => item.category = category,
            None => return Err(TransactionError::NotSingleItem),
        }
        trace!("transaction {} recategorized", id);
        Ok(())
    }

    /// Set the amount of the sole line item.
    pub fn set_transaction_amount(
        &mut self,
        id: TransactionId,
        amount: Decimal,
    ) -> Result<(), TransactionError> {
        match self.transaction_mut(id)?.sole_item_mut() {
            Some(item) => item.amount = amount,
            None => return Err(TransactionError::NotSingleItem),
        }
        trace!("transaction {} amount updated", id);
        Ok(())
    }
}
