use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use thiserror::Error;

use crate::entity::{AccountId, Invalidated, TransactionId};
use crate::registry::{Cashbox, RegistryError};
use crate::transaction::{Transaction, TransactionError};

/// The kinds of bank account the ledger recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Checking,
    Savings,
}

/// A bank account and the transactions posted against it.
///
/// Accounts are owned by the [`Cashbox`] and reached by resolving an
/// [`AccountId`]; a resolved reference is live for as long as it is held.
/// Names are unique among registered accounts, as is the (institution,
/// number) pair when either field is set.
#[derive(Debug)]
pub struct Account {
    pub(crate) id: AccountId,
    pub(crate) name: String,
    pub(crate) institution: String,
    pub(crate) number: String,
    pub(crate) kind: AccountKind,
    pub(crate) notes: String,
    pub(crate) transactions: BTreeMap<TransactionId, Transaction>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountError {
    #[error("account name must not be empty")]
    EmptyName,
    #[error("account {0} has been deleted")]
    Deleted(AccountId),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Account {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn institution(&self) -> &str {
        &self.institution
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Transactions posted to this account, ordered by date and then id.
    pub fn transactions(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self.transactions.values().collect();
        transactions.sort_by_key(|t| (t.date(), t.id()));
        transactions
    }

    // Owner-only: the transaction was just constructed and is live.
    pub(crate) fn insert_transaction(
        &mut self,
        transaction: Transaction,
    ) -> Result<(), TransactionError> {
        let id = transaction.id();
        if self.transactions.contains_key(&id) {
            return Err(TransactionError::DuplicateId(id));
        }
        self.transactions.insert(id, transaction);
        Ok(())
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Account {}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Cashbox {
    /// Create an account and register it.
    ///
    /// The name must be non-empty after trimming; institution, number and
    /// notes are trimmed. Uniqueness is checked before anything is linked, so
    /// a rejected account is never registered.
    pub fn create_account(
        &mut self,
        name: &str,
        institution: &str,
        number: &str,
        kind: AccountKind,
        notes: &str,
    ) -> Result<AccountId, AccountError> {
        let name = trimmed_name(name)?;
        let institution = institution.trim().to_owned();
        let number = number.trim().to_owned();
        let notes = notes.trim().to_owned();
        self.ensure_account_name_free(&name, None)?;
        self.ensure_account_number_free(&institution, &number, None)?;
        let id = AccountId(self.ids.account.next());
        self.ensure_account_id_free(id)?;
        self.accounts.insert(
            id,
            Account {
                id,
                name,
                institution,
                number,
                kind,
                notes,
                transactions: BTreeMap::new(),
            },
        );
        trace!("account {} registered", id);
        Ok(id)
    }

    /// Resolve an account id against the current graph.
    pub fn account(&self, id: AccountId) -> Result<&Account, AccountError> {
        self.accounts.get(&id).ok_or(AccountError::Deleted(id))
    }

    pub(crate) fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, AccountError> {
        self.accounts.get_mut(&id).ok_or(AccountError::Deleted(id))
    }

    /// Delete an account, cascading to every transaction it owns, their line
    /// items, and the paired legs of any transfers.
    ///
    /// Idempotent: deleting an id that is no longer live is a no-op. The
    /// registry stops enumerating the account and the returned events record
    /// the completed cascade in depth-first order.
    pub fn delete_account(&mut self, id: AccountId) -> Vec<Invalidated> {
        let mut events = Vec::new();
        let account = match self.accounts.remove(&id) {
            Some(account) => account,
            None => return events,
        };
        debug!("account {} invalidated", id);
        events.push(Invalidated::account(id));
        for (transaction_id, transaction) in account.transactions {
            self.discard_transaction(transaction_id, transaction, &mut events);
        }
        events
    }

    pub fn set_account_name(&mut self, id: AccountId, name: &str) -> Result<(), AccountError> {
        self.account(id)?;
        let name = trimmed_name(name)?;
        self.ensure_account_name_free(&name, Some(id))?;
        self.account_mut(id)?.name = name;
        trace!("account {} renamed", id);
        Ok(())
    }

    pub fn set_account_institution(
        &mut self,
        id: AccountId,
        institution: &str,
    ) -> Result<(), AccountError> {
        let number = self.account(id)?.number.clone();
        let institution = institution.trim().to_owned();
        self.ensure_account_number_free(&institution, &number, Some(id))?;
        self.account_mut(id)?.institution = institution;
        trace!("account {} institution updated", id);
        Ok(())
    }

    pub fn set_account_number(&mut self, id: AccountId, number: &str) -> Result<(), AccountError> {
        let institution = self.account(id)?.institution.clone();
        let number = number.trim().to_owned();
        self.ensure_account_number_free(&institution, &number, Some(id))?;
        self.account_mut(id)?.number = number;
        trace!("account {} number updated", id);
        Ok(())
    }

    pub fn set_account_kind(&mut self, id: AccountId, kind: AccountKind) -> Result<(), AccountError> {
        self.account_mut(id)?.kind = kind;
        trace!("account {} kind updated", id);
        Ok(())
    }

    pub fn set_account_notes(&mut self, id: AccountId, notes: &str) -> Result<(), AccountError> {
        self.account_mut(id)?.notes = notes.trim().to_owned();
        trace!("account {} notes updated", id);
        Ok(())
    }
}

fn trimmed_name(name: &str) -> Result<String, AccountError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AccountError::EmptyName);
    }
    Ok(name.to_owned())
}
