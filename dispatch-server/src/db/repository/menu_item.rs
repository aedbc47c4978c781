//! Menu Item Repository (read side of the catalogue)

use super::RepoResult;
use shared::models::{MenuItem, MenuItemVariant};
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>(
        "SELECT id, name, price, is_available FROM menu_item WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn find_variants(pool: &SqlitePool, menu_item_id: i64) -> RepoResult<Vec<MenuItemVariant>> {
    let variants = sqlx::query_as::<_, MenuItemVariant>(
        "SELECT id, menu_item_id, name, price_delta FROM menu_item_variant WHERE menu_item_id = ? ORDER BY id",
    )
    .bind(menu_item_id)
    .fetch_all(pool)
    .await?;
    Ok(variants)
}

pub async fn upsert(pool: &SqlitePool, item: &MenuItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO menu_item (id, name, price, is_available) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, price = excluded.price, is_available = excluded.is_available",
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(item.price)
    .bind(item.is_available)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_variant(pool: &SqlitePool, variant: &MenuItemVariant) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO menu_item_variant (id, menu_item_id, name, price_delta) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, price_delta = excluded.price_delta",
    )
    .bind(variant.id)
    .bind(variant.menu_item_id)
    .bind(&variant.name)
    .bind(variant.price_delta)
    .execute(pool)
    .await?;
    Ok(())
}
