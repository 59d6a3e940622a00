//! Recipe service: formulas with validated ingredient percentages.
//!
//! DESIGN
//! ======
//! A recipe row lives in `recipes`; its ordered ingredient lines live in
//! `recipe_ingredients`. Saving validates the lines first: every
//! percentage is in (0, 100], no inventory item appears twice, and the
//! percentages sum to 100 within [`PERCENT_TOLERANCE`].
//!
//! ERROR HANDLING
//! ==============
//! The header and the lines are written in separate remote calls with no
//! transaction. If the line write fails after the header succeeded, the
//! error is returned and the header stays; the caller re-fetches.

use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::entity::{self, EntityError};
use crate::model::{Recipe, RecipeIngredient, RecipeWithIngredients};
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const INGREDIENTS_TABLE: &str = "recipe_ingredients";

/// Allowed distance of the percentage sum from 100.
pub const PERCENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe name is empty")]
    EmptyName,
    #[error("recipe has no ingredients")]
    NoIngredients,
    #[error("ingredient {item} has invalid percentage {percentage}")]
    InvalidPercentage { item: Uuid, percentage: Decimal },
    #[error("ingredient {0} appears more than once")]
    DuplicateIngredient(Uuid),
    #[error("ingredient percentages sum to {total}, expected 100")]
    PercentSum { total: Decimal },
    #[error("recipe not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for RecipeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyName => "E_RECIPE_NAME",
            Self::NoIngredients => "E_RECIPE_EMPTY",
            Self::InvalidPercentage { .. } => "E_RECIPE_PERCENTAGE",
            Self::DuplicateIngredient(_) => "E_RECIPE_DUPLICATE",
            Self::PercentSum { .. } => "E_RECIPE_PERCENT_SUM",
            Self::NotFound(_) => "E_RECIPE_NOT_FOUND",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Remote(e) if e.retryable())
    }
}

impl From<EntityError> for RecipeError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::NotFound { id, .. } => Self::NotFound(id),
            EntityError::Remote(e) => Self::Remote(e),
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Check ingredient lines and return their percentage sum.
///
/// # Errors
///
/// Returns the first rule the lines break.
pub fn validate_ingredients(lines: &[RecipeIngredient]) -> Result<Decimal, RecipeError> {
    if lines.is_empty() {
        return Err(RecipeError::NoIngredients);
    }
    let mut seen = HashSet::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    for line in lines {
        if line.percentage <= Decimal::ZERO || line.percentage > Decimal::ONE_HUNDRED {
            return Err(RecipeError::InvalidPercentage { item: line.inventory_item_id, percentage: line.percentage });
        }
        if !seen.insert(line.inventory_item_id) {
            return Err(RecipeError::DuplicateIngredient(line.inventory_item_id));
        }
        total += line.percentage;
    }
    if (total - Decimal::ONE_HUNDRED).abs() > PERCENT_TOLERANCE {
        return Err(RecipeError::PercentSum { total });
    }
    Ok(total)
}

fn validate(draft: &RecipeWithIngredients) -> Result<(), RecipeError> {
    if draft.recipe.name.trim().is_empty() {
        return Err(RecipeError::EmptyName);
    }
    validate_ingredients(&draft.ingredients)?;
    Ok(())
}

/// Lines stamped with their recipe and list position.
fn numbered(recipe_id: Uuid, lines: &[RecipeIngredient]) -> Vec<RecipeIngredient> {
    lines
        .iter()
        .zip(0..)
        .map(|(line, position)| RecipeIngredient {
            id: None,
            recipe_id: Some(recipe_id),
            inventory_item_id: line.inventory_item_id,
            percentage: line.percentage,
            position,
        })
        .collect()
}

// =============================================================================
// CRUD
// =============================================================================

/// Ingredient lines of a recipe in position order.
///
/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn ingredients(store: &dyn RemoteStore, token: &str, recipe_id: Uuid) -> Result<Vec<RecipeIngredient>, RecipeError> {
    let query = Query::new().eq("recipe_id", recipe_id).order("position", true);
    Ok(remote::fetch(store, token, INGREDIENTS_TABLE, &query).await?)
}

/// # Errors
///
/// Returns `NotFound` or the remote error.
pub async fn get_recipe(store: &dyn RemoteStore, token: &str, id: Uuid) -> Result<RecipeWithIngredients, RecipeError> {
    let recipe: Recipe = entity::get(store, token, id).await?;
    let ingredients = ingredients(store, token, id).await?;
    Ok(RecipeWithIngredients { recipe, ingredients })
}

/// Validate, then insert the header and its lines.
///
/// # Errors
///
/// Returns a validation error before anything is written, or the remote error.
pub async fn create_recipe(
    store: &dyn RemoteStore,
    token: &str,
    draft: &RecipeWithIngredients,
) -> Result<RecipeWithIngredients, RecipeError> {
    validate(draft)?;
    let mut header = draft.recipe.clone();
    header.id = None;
    let recipe = entity::create(store, token, &header).await?;
    let Some(recipe_id) = recipe.id else {
        return Err(RemoteError::Decode("recipes: stored row has no id".into()).into());
    };
    let ingredients = remote::insert_many(store, token, INGREDIENTS_TABLE, &numbered(recipe_id, &draft.ingredients))
        .await
        .inspect_err(|e| tracing::warn!(%recipe_id, error = %e, "recipe saved without ingredients"))?;
    tracing::info!(%recipe_id, lines = draft.ingredients.len(), "recipe created");
    Ok(RecipeWithIngredients { recipe, ingredients })
}

/// Validate, overwrite the header, and replace all lines.
///
/// # Errors
///
/// Returns a validation error before anything is written, `NotFound`, or the remote error.
pub async fn update_recipe(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    draft: &RecipeWithIngredients,
) -> Result<RecipeWithIngredients, RecipeError> {
    validate(draft)?;
    let mut header = draft.recipe.clone();
    header.id = None;
    let recipe = entity::update(store, token, id, &header).await?;
    store
        .delete(token, INGREDIENTS_TABLE, &Query::new().eq("recipe_id", id))
        .await?;
    let ingredients = remote::insert_many(store, token, INGREDIENTS_TABLE, &numbered(id, &draft.ingredients))
        .await
        .inspect_err(|e| tracing::warn!(recipe_id = %id, error = %e, "recipe lines cleared but not rewritten"))?;
    Ok(RecipeWithIngredients { recipe, ingredients })
}

/// Delete the lines, then the header.
///
/// # Errors
///
/// Returns `NotFound` or the remote error.
pub async fn delete_recipe(store: &dyn RemoteStore, token: &str, id: Uuid) -> Result<(), RecipeError> {
    store
        .delete(token, INGREDIENTS_TABLE, &Query::new().eq("recipe_id", id))
        .await?;
    entity::delete::<Recipe>(store, token, id).await?;
    Ok(())
}

#[cfg(test)]
#[path = "recipe_test.rs"]
mod tests;
