use std::fmt;

use log::{debug, trace};
use thiserror::Error;

use crate::entity::{CategoryId, Invalidated};
use crate::registry::{Cashbox, RegistryError};

/// A classification tag for line items.
///
/// Two sentinel categories live outside the registry: [`Category::NO_CATEGORY`]
/// stands in when a transaction's items span several categories, and
/// [`Category::NONE`] is the picker default before the user has chosen
/// anything. Both resolve through [`Cashbox::category`] but are never
/// enumerated, renamed or deleted.
#[derive(Debug)]
pub struct Category {
    pub(crate) id: CategoryId,
    pub(crate) name: String,
    pub(crate) description: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category name must not be empty")]
    EmptyName,
    #[error("category {0} has been deleted")]
    Deleted(CategoryId),
    #[error("category {0} is still referenced by line items")]
    InUse(CategoryId),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Category {
    /// Stands in when a roll-up spans several categories.
    pub const NO_CATEGORY: CategoryId = CategoryId(u32::MAX);
    /// Default picker selection before the user has chosen anything.
    pub const NONE: CategoryId = CategoryId(u32::MAX - 1);

    pub(crate) fn new(id: CategoryId, name: &str, description: &str) -> Self {
        Category {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
        }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Category {}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Cashbox {
    /// Create a category and register it.
    ///
    /// The name must be non-empty after trimming and unique among registered
    /// categories; a rejected category is never registered.
    pub fn create_category(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<CategoryId, CategoryError> {
        let name = trimmed_name(name)?;
        let description = description.trim().to_owned();
        self.ensure_category_name_free(&name, None)?;
        let id = CategoryId(self.ids.category.next());
        self.ensure_category_id_free(id)?;
        self.categories.insert(
            id,
            Category {
                id,
                name,
                description,
            },
        );
        trace!("category {} registered", id);
        Ok(id)
    }

    /// Resolve a category id against the current graph. The sentinels resolve
    /// as permanently-live records.
    pub fn category(&self, id: CategoryId) -> Result<&Category, CategoryError> {
        if id == Category::NO_CATEGORY {
            return Ok(&self.no_category);
        }
        if id == Category::NONE {
            return Ok(&self.none_selected);
        }
        self.categories.get(&id).ok_or(CategoryError::Deleted(id))
    }

    /// Delete a category and deregister it.
    ///
    /// Fails while any live line item still references the category, so a
    /// dangling reference can never be created; budget rows for the category
    /// are dropped with it. Deleting an id that is no longer live is a no-op.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Vec<Invalidated>, CategoryError> {
        if !self.categories.contains_key(&id) {
            return Ok(Vec::new());
        }
        if self.category_in_use(id) {
            return Err(CategoryError::InUse(id));
        }
        self.categories.remove(&id);
        self.budgets.retain(|(_, category), _| *category != id);
        debug!("category {} invalidated", id);
        Ok(vec![Invalidated::category(id)])
    }

    pub fn set_category_name(&mut self, id: CategoryId, name: &str) -> Result<(), CategoryError> {
        self.category_registered(id)?;
        let name = trimmed_name(name)?;
        self.ensure_category_name_free(&name, Some(id))?;
        if let Some(category) = self.categories.get_mut(&id) {
            category.name = name;
        }
        trace!("category {} renamed", id);
        Ok(())
    }

    pub fn set_category_description(
        &mut self,
        id: CategoryId,
        description: &str,
    ) -> Result<(), CategoryError> {
        let category = self
            .categories
            .get_mut(&id)
            .ok_or(CategoryError::Deleted(id))?;
        category.description = description.trim().to_owned();
        trace!("category {} description updated", id);
        Ok(())
    }

    pub(crate) fn category_registered(&self, id: CategoryId) -> Result<(), CategoryError> {
        if !self.categories.contains_key(&id) {
            return Err(CategoryError::Deleted(id));
        }
        Ok(())
    }

    fn category_in_use(&self, id: CategoryId) -> bool {
        self.accounts.values().any(|account| {
            account.transactions.values().any(|transaction| {
                transaction
                    .items
                    .values()
                    .any(|item| item.category == id)
            })
        })
    }
}

fn trimmed_name(name: &str) -> Result<String, CategoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    Ok(name.to_owned())
}
