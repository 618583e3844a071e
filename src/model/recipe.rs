use crate::model::Id;
use serde::{Deserialize, Serialize};

/// An ingredient line owned by a recipe.
///
/// Structurally the same as an inventory `Ingredient`, but stored in its own
/// table and not linked to the inventory by key. Purchases match the two by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: Id,
    pub name: String,
    pub amount: i32, // Units consumed per recipe served
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipeIngredient {
    pub name: String,
    pub amount: i32,
}

impl NewRecipeIngredient {
    pub fn new(name: impl Into<String>, amount: i32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }

    pub fn into_recipe_ingredient(self, id: Id) -> RecipeIngredient {
        RecipeIngredient {
            id,
            name: self.name,
            amount: self.amount,
        }
    }
}

impl RecipeIngredient {
    pub fn apply(&mut self, update: NewRecipeIngredient) {
        self.name = update.name;
        self.amount = update.amount;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Id,
    pub name: String,
    pub price: i32,
    pub recipe_ingredients: Vec<RecipeIngredient>,
}

/// Input model for creating or replacing a recipe together with its ingredients.
///
/// Nested ingredient ids are ignored: every write stores a fresh collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub name: String,
    pub price: i32,
    #[serde(default)]
    pub recipe_ingredients: Vec<NewRecipeIngredient>,
}

impl NewRecipe {
    pub fn new(name: impl Into<String>, price: i32, recipe_ingredients: Vec<NewRecipeIngredient>) -> Self {
        Self {
            name: name.into(),
            price,
            recipe_ingredients,
        }
    }
}
