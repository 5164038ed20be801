use log::{debug, trace};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::category::CategoryError;
use crate::entity::{CategoryId, Invalidated, LineItemId, TransactionId};
use crate::registry::Cashbox;
use crate::transaction::TransactionError;

/// One split of a transaction: an amount put toward a single category.
///
/// Amounts carry no sign constraint; negative items express refunds and
/// transfer debit legs.
#[derive(Debug)]
pub struct LineItem {
    pub(crate) id: LineItemId,
    pub(crate) amount: Decimal,
    pub(crate) category: CategoryId,
    pub(crate) description: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineItemError {
    #[error("line item {0} has been deleted")]
    Deleted(LineItemId),
    #[error("a line item with id {0} already exists in this transaction")]
    DuplicateId(LineItemId),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Category(#[from] CategoryError),
}

impl LineItem {
    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for LineItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LineItem {}

impl Cashbox {
    /// Create a line item on a transaction.
    ///
    /// Fails if the transaction or the category is no longer live; the
    /// transaction rejects a duplicate item id. The description is trimmed.
    pub fn create_line_item(
        &mut self,
        transaction: TransactionId,
        amount: Decimal,
        category: CategoryId,
        description: &str,
    ) -> Result<LineItemId, LineItemError> {
        self.transaction(transaction)?;
        self.category(category)?;
        let id = LineItemId(self.ids.item.next());
        let item = LineItem {
            id,
            amount,
            category,
            description: description.trim().to_owned(),
        };
        let owner = self.transaction_mut(transaction)?;
        if owner.items.contains_key(&id) {
            return Err(LineItemError::DuplicateId(id));
        }
        owner.items.insert(id, item);
        self.item_owner.insert(id, transaction);
        trace!("line item {} added to transaction {}", id, transaction);
        Ok(id)
    }

    /// Resolve a line item id against the current graph.
    pub fn line_item(&self, id: LineItemId) -> Result<&LineItem, LineItemError> {
        self.item_owner
            .get(&id)
            .and_then(|owner| self.transaction(*owner).ok())
            .and_then(|transaction| transaction.items.get(&id))
            .ok_or(LineItemError::Deleted(id))
    }

    fn line_item_mut(&mut self, id: LineItemId) -> Result<&mut LineItem, LineItemError> {
        let owner = match self.item_owner.get(&id) {
            Some(owner) => *owner,
            None => return Err(LineItemError::Deleted(id)),
        };
        self.transaction_mut(owner)
            .ok()
            .and_then(|transaction| transaction.items.get_mut(&id))
            .ok_or(LineItemError::Deleted(id))
    }

    /// Delete a line item. The owning transaction drops it in the same step.
    ///
    /// Idempotent: deleting an id that is no longer live is a no-op.
    pub fn delete_line_item(&mut self, id: LineItemId) -> Vec<Invalidated> {
        let mut events = Vec::new();
        let owner = match self.item_owner.remove(&id) {
            Some(owner) => owner,
            None => return events,
        };
        if let Ok(transaction) = self.transaction_mut(owner) {
            if transaction.items.remove(&id).is_some() {
                debug!("line item {} invalidated", id);
                events.push(Invalidated::line_item(id));
            }
        }
        events
    }

    pub fn set_line_item_amount(
        &mut self,
        id: LineItemId,
        amount: Decimal,
    ) -> Result<(), LineItemError> {
        self.line_item_mut(id)?.amount = amount;
        trace!("line item {} amount updated", id);
        Ok(())
    }

    pub fn set_line_item_category(
        &mut self,
        id: LineItemId,
        category: CategoryId,
    ) -> Result<(), LineItemError> {
        self.line_item(id)?;
        self.category(category)?;
        self.line_item_mut(id)?.category = category;
        trace!("line item {} recategorized", id);
        Ok(())
    }

    pub fn set_line_item_description(
        &mut self,
        id: LineItemId,
        description: &str,
    ) -> Result<(), LineItemError> {
        self.line_item_mut(id)?.description = description.trim().to_owned();
        trace!("line item {} description updated", id);
        Ok(())
    }
}
