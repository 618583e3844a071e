use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgConnection, PgPool, Row};
use std::collections::HashMap;

use crate::model::{
    Id, Ingredient, InventoryDeduction, NewIngredient, NewRecipe, NewRecipeIngredient, Recipe,
    RecipeIngredient,
};
use crate::store::traits::{
    DeductionOutcome, IngredientStore, InventoryStore, RecipeIngredientStore, RecipeStore, Store,
};

/// Advisory lock key serializing ingredient creates so the name check and insert are atomic
const INGREDIENT_NAME_LOCK: i64 = 0x636f_6666_6565;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn ingredient_from_row(row: &PgRow) -> Ingredient {
    Ingredient {
        id: row.get("id"),
        name: row.get("name"),
        amount: row.get("amount"),
    }
}

fn recipe_ingredient_from_row(row: &PgRow) -> RecipeIngredient {
    RecipeIngredient {
        id: row.get("id"),
        name: row.get("name"),
        amount: row.get("amount"),
    }
}

async fn load_recipe(conn: &mut PgConnection, id: Id) -> Result<Option<Recipe>> {
    let row = sqlx::query("SELECT id, name, price FROM recipe WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch recipe")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let ingredient_rows = sqlx::query(
        r#"
        SELECT ri.id, ri.name, ri.amount
        FROM recipe_recipe_ingredients link
        JOIN recipe_ingredient ri ON ri.id = link.recipe_ingredients_id
        WHERE link.recipe_id = $1
        ORDER BY link.position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch recipe ingredients for recipe")?;

    Ok(Some(Recipe {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        recipe_ingredients: ingredient_rows.iter().map(recipe_ingredient_from_row).collect(),
    }))
}

/// Insert a recipe's ingredient rows and link them in submitted order
async fn insert_owned_ingredients(
    conn: &mut PgConnection,
    recipe_id: Id,
    recipe_ingredients: Vec<NewRecipeIngredient>,
) -> Result<()> {
    for (position, recipe_ingredient) in recipe_ingredients.into_iter().enumerate() {
        let ingredient_id: Id = sqlx::query_scalar(
            "INSERT INTO recipe_ingredient (name, amount) VALUES ($1, $2) RETURNING id",
        )
        .bind(&recipe_ingredient.name)
        .bind(recipe_ingredient.amount)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert recipe ingredient")?;

        sqlx::query(
            "INSERT INTO recipe_recipe_ingredients (recipe_id, recipe_ingredients_id, position) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .context("Failed to link recipe ingredient")?;
    }

    Ok(())
}

async fn owned_ingredient_ids(conn: &mut PgConnection, recipe_id: Id) -> Result<Vec<Id>> {
    sqlx::query_scalar("SELECT recipe_ingredients_id FROM recipe_recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list owned recipe ingredients")
}

async fn delete_recipe_ingredients(conn: &mut PgConnection, ids: &[Id]) -> Result<()> {
    sqlx::query("DELETE FROM recipe_ingredient WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *conn)
        .await
        .context("Failed to delete owned recipe ingredients")?;
    Ok(())
}

#[async_trait::async_trait]
impl IngredientStore for PostgresStore {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let rows = sqlx::query("SELECT id, name, amount FROM ingredient ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list ingredients")?;

        Ok(rows.iter().map(ingredient_from_row).collect())
    }

    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>> {
        let row = sqlx::query("SELECT id, name, amount FROM ingredient WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ingredient")?;

        Ok(row.as_ref().map(ingredient_from_row))
    }

    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Option<Ingredient>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(INGREDIENT_NAME_LOCK)
            .execute(&mut *tx)
            .await
            .context("Failed to acquire ingredient name lock")?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ingredient WHERE name = $1)")
            .bind(&ingredient.name)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check ingredient name")?;

        if exists {
            tx.rollback().await.context("Failed to roll back transaction")?;
            return Ok(None);
        }

        let row = sqlx::query("INSERT INTO ingredient (name, amount) VALUES ($1, $2) RETURNING id, name, amount")
            .bind(&ingredient.name)
            .bind(ingredient.amount)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert ingredient")?;

        tx.commit().await.context("Failed to commit ingredient")?;
        Ok(Some(ingredient_from_row(&row)))
    }

    async fn update_ingredient(&self, id: Id, ingredient: NewIngredient) -> Result<Option<Ingredient>> {
        let row = sqlx::query("UPDATE ingredient SET name = $2, amount = $3 WHERE id = $1 RETURNING id, name, amount")
            .bind(id)
            .bind(&ingredient.name)
            .bind(ingredient.amount)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update ingredient")?;

        Ok(row.as_ref().map(ingredient_from_row))
    }

    async fn delete_ingredient(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredient WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete ingredient")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RecipeIngredientStore for PostgresStore {
    async fn list_recipe_ingredients(&self) -> Result<Vec<RecipeIngredient>> {
        let rows = sqlx::query("SELECT id, name, amount FROM recipe_ingredient ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list recipe ingredients")?;

        Ok(rows.iter().map(recipe_ingredient_from_row).collect())
    }

    async fn get_recipe_ingredient(&self, id: Id) -> Result<Option<RecipeIngredient>> {
        let row = sqlx::query("SELECT id, name, amount FROM recipe_ingredient WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch recipe ingredient")?;

        Ok(row.as_ref().map(recipe_ingredient_from_row))
    }

    async fn create_recipe_ingredient(&self, recipe_ingredient: NewRecipeIngredient) -> Result<RecipeIngredient> {
        let row = sqlx::query(
            "INSERT INTO recipe_ingredient (name, amount) VALUES ($1, $2) RETURNING id, name, amount",
        )
        .bind(&recipe_ingredient.name)
        .bind(recipe_ingredient.amount)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert recipe ingredient")?;

        Ok(recipe_ingredient_from_row(&row))
    }

    async fn update_recipe_ingredient(
        &self,
        id: Id,
        recipe_ingredient: NewRecipeIngredient,
    ) -> Result<Option<RecipeIngredient>> {
        let row = sqlx::query(
            "UPDATE recipe_ingredient SET name = $2, amount = $3 WHERE id = $1 RETURNING id, name, amount",
        )
        .bind(id)
        .bind(&recipe_ingredient.name)
        .bind(recipe_ingredient.amount)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update recipe ingredient")?;

        Ok(row.as_ref().map(recipe_ingredient_from_row))
    }

    async fn delete_recipe_ingredient(&self, id: Id) -> Result<bool> {
        // Link rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM recipe_ingredient WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete recipe ingredient")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RecipeStore for PostgresStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let recipe_rows = sqlx::query("SELECT id, name, price FROM recipe ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list recipes")?;

        let link_rows = sqlx::query(
            r#"
            SELECT link.recipe_id, ri.id, ri.name, ri.amount
            FROM recipe_recipe_ingredients link
            JOIN recipe_ingredient ri ON ri.id = link.recipe_ingredients_id
            ORDER BY link.recipe_id, link.position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recipe ingredient links")?;

        let mut by_recipe: HashMap<Id, Vec<RecipeIngredient>> = HashMap::new();
        for row in &link_rows {
            let recipe_id: Id = row.get("recipe_id");
            by_recipe
                .entry(recipe_id)
                .or_default()
                .push(recipe_ingredient_from_row(row));
        }

        let recipes = recipe_rows
            .into_iter()
            .map(|row| {
                let id: Id = row.get("id");
                Recipe {
                    id,
                    name: row.get("name"),
                    price: row.get("price"),
                    recipe_ingredients: by_recipe.remove(&id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(recipes)
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        load_recipe(&mut conn, id).await
    }

    async fn create_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let recipe_id: Id = sqlx::query_scalar("INSERT INTO recipe (name, price) VALUES ($1, $2) RETURNING id")
            .bind(&recipe.name)
            .bind(recipe.price)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert recipe")?;

        insert_owned_ingredients(&mut tx, recipe_id, recipe.recipe_ingredients).await?;

        let created = load_recipe(&mut tx, recipe_id)
            .await?
            .context("Recipe vanished inside its own transaction")?;

        tx.commit().await.context("Failed to commit recipe")?;
        Ok(created)
    }

    async fn update_recipe(&self, id: Id, recipe: NewRecipe) -> Result<Option<Recipe>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query("UPDATE recipe SET name = $2, price = $3 WHERE id = $1")
            .bind(id)
            .bind(&recipe.name)
            .bind(recipe.price)
            .execute(&mut *tx)
            .await
            .context("Failed to update recipe")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.context("Failed to roll back transaction")?;
            return Ok(None);
        }

        let previous = owned_ingredient_ids(&mut tx, id).await?;
        delete_recipe_ingredients(&mut tx, &previous).await?;
        insert_owned_ingredients(&mut tx, id, recipe.recipe_ingredients).await?;

        let updated = load_recipe(&mut tx, id).await?;
        tx.commit().await.context("Failed to commit recipe update")?;
        Ok(updated)
    }

    async fn delete_recipe(&self, id: Id) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let owned = owned_ingredient_ids(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM recipe WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete recipe")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.context("Failed to roll back transaction")?;
            return Ok(false);
        }

        delete_recipe_ingredients(&mut tx, &owned).await?;
        tx.commit().await.context("Failed to commit recipe delete")?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl InventoryStore for PostgresStore {
    async fn deduct_inventory(&self, deductions: &[InventoryDeduction]) -> Result<DeductionOutcome> {
        // Lock rows in id order so concurrent purchases cannot deadlock
        let mut ordered: Vec<&InventoryDeduction> = deductions.iter().collect();
        ordered.sort_by_key(|deduction| deduction.ingredient_id);

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut updated = Vec::with_capacity(ordered.len());

        for deduction in ordered {
            let row = sqlx::query(
                r#"
                UPDATE ingredient SET amount = amount - $2
                WHERE id = $1 AND amount >= $2
                RETURNING id, name, amount
                "#,
            )
            .bind(deduction.ingredient_id)
            .bind(deduction.amount)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to deduct inventory")?;

            match row {
                Some(row) => updated.push(ingredient_from_row(&row)),
                None => {
                    tx.rollback().await.context("Failed to roll back transaction")?;
                    return Ok(Err(deduction.clone()));
                }
            }
        }

        tx.commit().await.context("Failed to commit inventory deduction")?;
        Ok(Ok(updated))
    }
}

impl Store for PostgresStore {}
