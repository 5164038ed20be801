use std::fmt;

/// Record identifier for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub(crate) u32);

/// Record identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub(crate) u32);

/// Record identifier for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineItemId(pub(crate) u32);

/// Record identifier for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryId(pub(crate) u32);

impl AccountId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl TransactionId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl LineItemId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl CategoryId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of record tracked by the invalidation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Transaction,
    LineItem,
    Category,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EntityKind::Account => "account",
            EntityKind::Transaction => "transaction",
            EntityKind::LineItem => "line item",
            EntityKind::Category => "category",
        };
        f.write_str(name)
    }
}

/// One step of a deletion cascade.
///
/// Deletion operations report the completed cascade as a list of these, in
/// depth-first order. An invalidated id never becomes live again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidated {
    pub kind: EntityKind,
    pub id: u32,
}

impl Invalidated {
    pub(crate) fn account(id: AccountId) -> Self {
        Invalidated {
            kind: EntityKind::Account,
            id: id.0,
        }
    }

    pub(crate) fn transaction(id: TransactionId) -> Self {
        Invalidated {
            kind: EntityKind::Transaction,
            id: id.0,
        }
    }

    pub(crate) fn line_item(id: LineItemId) -> Self {
        Invalidated {
            kind: EntityKind::LineItem,
            id: id.0,
        }
    }

    pub(crate) fn category(id: CategoryId) -> Self {
        Invalidated {
            kind: EntityKind::Category,
            id: id.0,
        }
    }
}

// Ids issued by one counter only ever grow; a deleted record's id is never
// handed out again.
#[derive(Debug, Default)]
pub(crate) struct IdCounter(u32);

impl IdCounter {
    pub(crate) fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// One id counter per record kind.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) account: IdCounter,
    pub(crate) transaction: IdCounter,
    pub(crate) item: IdCounter,
    pub(crate) category: IdCounter,
}
