use chrono::NaiveDate;
use log::trace;

use crate::entity::{AccountId, TransactionId};
use crate::registry::Cashbox;
use crate::transaction::{Transaction, TransactionError};

/// Pairing data carried by each leg of a transfer.
///
/// A transfer is two transactions, one per account, each pointing at the
/// other. From a leg's point of view the destination is the account at the
/// far end, so the source leg names the receiving account and the receiving
/// leg names the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLink {
    pub(crate) dest_account: AccountId,
    pub(crate) dest_leg: TransactionId,
}

impl TransferLink {
    /// The account at the far end of the transfer.
    pub fn dest_account(&self) -> AccountId {
        self.dest_account
    }

    /// The counterpart leg held by that account.
    pub fn dest_leg(&self) -> TransactionId {
        self.dest_leg
    }
}

impl Cashbox {
    /// Create a transfer between two accounts as a linked pair of
    /// transactions.
    ///
    /// Both legs are linked to each other before either is registered, so an
    /// unpaired leg is never observable. Returns the (source, destination)
    /// leg ids. Deleting either leg later deletes the pair in one cascade.
    pub fn create_transfer(
        &mut self,
        source: AccountId,
        dest: AccountId,
        date: NaiveDate,
        payee: &str,
        check_nr: &str,
    ) -> Result<(TransactionId, TransactionId), TransactionError> {
        self.account(source)?;
        self.account(dest)?;
        let source_leg = TransactionId(self.ids.transaction.next());
        let dest_leg = TransactionId(self.ids.transaction.next());
        let source_transaction = Transaction::new(
            source_leg,
            date,
            payee,
            check_nr,
            Some(TransferLink {
                dest_account: dest,
                dest_leg,
            }),
        );
        let dest_transaction = Transaction::new(
            dest_leg,
            date,
            payee,
            check_nr,
            Some(TransferLink {
                dest_account: source,
                dest_leg: source_leg,
            }),
        );
        self.account_mut(source)?
            .insert_transaction(source_transaction)?;
        self.transaction_owner.insert(source_leg, source);
        self.account_mut(dest)?.insert_transaction(dest_transaction)?;
        self.transaction_owner.insert(dest_leg, dest);
        trace!(
            "transfer {}/{} added between accounts {} and {}",
            source_leg,
            dest_leg,
            source,
            dest
        );
        Ok((source_leg, dest_leg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountError;
    use crate::{AccountKind, Cashbox};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_accounts() -> (Cashbox, AccountId, AccountId) {
        let mut cashbox = Cashbox::new();
        let checking = cashbox
            .create_account("Checking", "", "", AccountKind::Checking, "")
            .unwrap();
        let savings = cashbox
            .create_account("Savings", "", "", AccountKind::Savings, "")
            .unwrap();
        (cashbox, checking, savings)
    }

    #[test]
    fn create_transfer_links_both_legs() {
        let (mut cashbox, checking, savings) = two_accounts();
        let (source_leg, dest_leg) = cashbox
            .create_transfer(checking, savings, date(2009, 6, 2), "Monthly savings", "")
            .unwrap();
        assert_ne!(source_leg, dest_leg);

        let source = cashbox.transaction(source_leg).unwrap();
        let link = source.transfer().unwrap();
        assert_eq!(link.dest_account(), savings);
        assert_eq!(link.dest_leg(), dest_leg);

        let dest = cashbox.transaction(dest_leg).unwrap();
        let link = dest.transfer().unwrap();
        assert_eq!(link.dest_account(), checking);
        assert_eq!(link.dest_leg(), source_leg);

        assert_eq!(cashbox.account(checking).unwrap().transactions().len(), 1);
        assert_eq!(cashbox.account(savings).unwrap().transactions().len(), 1);
    }

    #[test]
    fn transfer_description_is_synthesized() {
        let (mut cashbox, checking, savings) = two_accounts();
        let (source_leg, dest_leg) = cashbox
            .create_transfer(checking, savings, date(2009, 6, 2), "", "")
            .unwrap();
        assert_eq!(
            cashbox.transaction_description(source_leg).unwrap(),
            "Transfer with Savings"
        );
        assert_eq!(
            cashbox.transaction_description(dest_leg).unwrap(),
            "Transfer with Checking"
        );

        // Follows the account when it is renamed, because nothing is stored.
        cashbox.set_account_name(savings, "Emergency Fund").unwrap();
        assert_eq!(
            cashbox.transaction_description(source_leg).unwrap(),
            "Transfer with Emergency Fund"
        );
    }

    #[test]
    fn transfer_description_cannot_be_set() {
        let (mut cashbox, checking, savings) = two_accounts();
        let category = cashbox.create_category("Transfers", "").unwrap();
        let (source_leg, _) = cashbox
            .create_transfer(checking, savings, date(2009, 6, 2), "", "")
            .unwrap();
        assert_eq!(
            cashbox.set_transaction_description(source_leg, "x").err(),
            Some(TransactionError::TransferDescription)
        );
        // Still the distinct error with exactly one item attached.
        cashbox
            .create_line_item(source_leg, dec!(-100.00), category, "")
            .unwrap();
        assert_eq!(
            cashbox.set_transaction_description(source_leg, "x").err(),
            Some(TransactionError::TransferDescription)
        );
    }

    #[test]
    fn deleting_one_leg_deletes_the_pair() {
        let (mut cashbox, checking, savings) = two_accounts();
        let (source_leg, dest_leg) = cashbox
            .create_transfer(checking, savings, date(2009, 6, 2), "", "")
            .unwrap();
        let events = cashbox.delete_transaction(source_leg);
        assert_eq!(events.len(), 2);
        assert!(cashbox.transaction(source_leg).is_err());
        assert!(cashbox.transaction(dest_leg).is_err());
        assert!(cashbox.account(checking).unwrap().transactions().is_empty());
        assert!(cashbox.account(savings).unwrap().transactions().is_empty());
    }

    #[test]
    fn deleting_an_account_deletes_remote_legs() {
        let (mut cashbox, checking, savings) = two_accounts();
        let (_, dest_leg) = cashbox
            .create_transfer(checking, savings, date(2009, 6, 2), "", "")
            .unwrap();
        cashbox.delete_account(checking);
        assert!(cashbox.transaction(dest_leg).is_err());
        assert!(cashbox.account(savings).unwrap().transactions().is_empty());
    }

    #[test]
    fn create_transfer_with_deleted_account_fails() {
        let (mut cashbox, checking, savings) = two_accounts();
        cashbox.delete_account(savings);
        let result = cashbox.create_transfer(checking, savings, date(2009, 6, 2), "", "");
        assert_eq!(
            result.err(),
            Some(TransactionError::Account(AccountError::Deleted(savings)))
        );
        assert!(cashbox.account(checking).unwrap().transactions().is_empty());
    }
}
