use crate::model::Id;
use serde::{Deserialize, Serialize};

/// An inventory ingredient the coffee maker draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub amount: i32, // Units currently in stock
}

/// Input model for creating or replacing an ingredient.
///
/// Any `id` sent by the client is ignored; the store assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub amount: i32,
}

impl NewIngredient {
    pub fn new(name: impl Into<String>, amount: i32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }

    /// Convert to a full Ingredient once the store has assigned an id
    pub fn into_ingredient(self, id: Id) -> Ingredient {
        Ingredient {
            id,
            name: self.name,
            amount: self.amount,
        }
    }
}

impl Ingredient {
    /// Overwrite every mutable field, keeping the id.
    pub fn apply(&mut self, update: NewIngredient) {
        self.name = update.name;
        self.amount = update.amount;
    }
}
