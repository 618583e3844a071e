use anyhow::Result;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    Id, Ingredient, InventoryDeduction, NewIngredient, NewRecipe, NewRecipeIngredient, Recipe,
    RecipeIngredient,
};
use crate::store::traits::{
    DeductionOutcome, IngredientStore, InventoryStore, RecipeIngredientStore, RecipeStore, Store,
};

#[derive(Debug, Clone)]
struct RecipeRow {
    name: String,
    price: i32,
    ingredient_ids: Vec<Id>, // Linked recipe_ingredient rows, in submitted order
}

/// Monotonic key generator, one per table
#[derive(Debug)]
struct Sequence(Id);

impl Default for Sequence {
    fn default() -> Self {
        Self(1)
    }
}

impl Sequence {
    fn next(&mut self) -> Id {
        let id = self.0;
        self.0 += 1;
        id
    }
}

#[derive(Debug, Default)]
struct Tables {
    ingredients: BTreeMap<Id, Ingredient>,
    recipes: BTreeMap<Id, RecipeRow>,
    recipe_ingredients: BTreeMap<Id, RecipeIngredient>,
    ingredient_seq: Sequence,
    recipe_seq: Sequence,
    recipe_ingredient_seq: Sequence,
}

impl Tables {
    fn materialize(&self, id: Id, row: &RecipeRow) -> Recipe {
        Recipe {
            id,
            name: row.name.clone(),
            price: row.price,
            recipe_ingredients: row
                .ingredient_ids
                .iter()
                .filter_map(|ingredient_id| self.recipe_ingredients.get(ingredient_id).cloned())
                .collect(),
        }
    }

    fn insert_recipe_ingredients(&mut self, new_rows: Vec<NewRecipeIngredient>) -> Vec<Id> {
        new_rows
            .into_iter()
            .map(|new_row| {
                let id = self.recipe_ingredient_seq.next();
                self.recipe_ingredients
                    .insert(id, new_row.into_recipe_ingredient(id));
                id
            })
            .collect()
    }

    fn remove_recipe_ingredients(&mut self, ids: &[Id]) {
        for id in ids {
            self.recipe_ingredients.remove(id);
        }
    }
}

/// Process-local store with the same semantics as `PostgresStore`.
///
/// Every operation runs under a single lock, so multi-row writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IngredientStore for MemoryStore {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        Ok(self.tables.read().ingredients.values().cloned().collect())
    }

    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>> {
        Ok(self.tables.read().ingredients.get(&id).cloned())
    }

    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Option<Ingredient>> {
        let mut tables = self.tables.write();
        if tables
            .ingredients
            .values()
            .any(|existing| existing.name == ingredient.name)
        {
            return Ok(None);
        }

        let id = tables.ingredient_seq.next();
        let ingredient = ingredient.into_ingredient(id);
        tables.ingredients.insert(id, ingredient.clone());
        Ok(Some(ingredient))
    }

    async fn update_ingredient(&self, id: Id, ingredient: NewIngredient) -> Result<Option<Ingredient>> {
        let mut tables = self.tables.write();
        Ok(tables.ingredients.get_mut(&id).map(|existing| {
            existing.apply(ingredient);
            existing.clone()
        }))
    }

    async fn delete_ingredient(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().ingredients.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl RecipeIngredientStore for MemoryStore {
    async fn list_recipe_ingredients(&self) -> Result<Vec<RecipeIngredient>> {
        Ok(self.tables.read().recipe_ingredients.values().cloned().collect())
    }

    async fn get_recipe_ingredient(&self, id: Id) -> Result<Option<RecipeIngredient>> {
        Ok(self.tables.read().recipe_ingredients.get(&id).cloned())
    }

    async fn create_recipe_ingredient(&self, recipe_ingredient: NewRecipeIngredient) -> Result<RecipeIngredient> {
        let mut tables = self.tables.write();
        let id = tables.recipe_ingredient_seq.next();
        let recipe_ingredient = recipe_ingredient.into_recipe_ingredient(id);
        tables.recipe_ingredients.insert(id, recipe_ingredient.clone());
        Ok(recipe_ingredient)
    }

    async fn update_recipe_ingredient(
        &self,
        id: Id,
        recipe_ingredient: NewRecipeIngredient,
    ) -> Result<Option<RecipeIngredient>> {
        let mut tables = self.tables.write();
        Ok(tables.recipe_ingredients.get_mut(&id).map(|existing| {
            existing.apply(recipe_ingredient);
            existing.clone()
        }))
    }

    async fn delete_recipe_ingredient(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.recipe_ingredients.remove(&id).is_none() {
            return Ok(false);
        }
        for row in tables.recipes.values_mut() {
            row.ingredient_ids.retain(|linked| *linked != id);
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl RecipeStore for MemoryStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let tables = self.tables.read();
        Ok(tables
            .recipes
            .iter()
            .map(|(id, row)| tables.materialize(*id, row))
            .collect())
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>> {
        let tables = self.tables.read();
        Ok(tables.recipes.get(&id).map(|row| tables.materialize(id, row)))
    }

    async fn create_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
        let mut tables = self.tables.write();
        let ingredient_ids = tables.insert_recipe_ingredients(recipe.recipe_ingredients);
        let id = tables.recipe_seq.next();
        let row = RecipeRow {
            name: recipe.name,
            price: recipe.price,
            ingredient_ids,
        };
        let created = tables.materialize(id, &row);
        tables.recipes.insert(id, row);
        Ok(created)
    }

    async fn update_recipe(&self, id: Id, recipe: NewRecipe) -> Result<Option<Recipe>> {
        let mut tables = self.tables.write();
        let Some(previous) = tables.recipes.get(&id).map(|row| row.ingredient_ids.clone()) else {
            return Ok(None);
        };

        tables.remove_recipe_ingredients(&previous);
        let ingredient_ids = tables.insert_recipe_ingredients(recipe.recipe_ingredients);
        let row = RecipeRow {
            name: recipe.name,
            price: recipe.price,
            ingredient_ids,
        };
        let updated = tables.materialize(id, &row);
        tables.recipes.insert(id, row);
        Ok(Some(updated))
    }

    async fn delete_recipe(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write();
        let Some(row) = tables.recipes.remove(&id) else {
            return Ok(false);
        };
        tables.remove_recipe_ingredients(&row.ingredient_ids);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl InventoryStore for MemoryStore {
    async fn deduct_inventory(&self, deductions: &[InventoryDeduction]) -> Result<DeductionOutcome> {
        let mut tables = self.tables.write();

        // Validate everything before touching stock
        let mut remaining: HashMap<Id, i32> = HashMap::new();
        for deduction in deductions {
            let available = match remaining.get(&deduction.ingredient_id) {
                Some(amount) => Some(*amount),
                None => tables
                    .ingredients
                    .get(&deduction.ingredient_id)
                    .map(|ingredient| ingredient.amount),
            };
            match available {
                Some(amount) if amount >= deduction.amount => {
                    remaining.insert(deduction.ingredient_id, amount - deduction.amount);
                }
                _ => return Ok(Err(deduction.clone())),
            }
        }

        let mut updated = Vec::with_capacity(remaining.len());
        for (id, amount) in remaining {
            if let Some(ingredient) = tables.ingredients.get_mut(&id) {
                ingredient.amount = amount;
                updated.push(ingredient.clone());
            }
        }
        updated.sort_by_key(|ingredient| ingredient.id);
        Ok(Ok(updated))
    }
}

impl Store for MemoryStore {}
