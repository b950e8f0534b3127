use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::dto::{NewProduct, ProductPatch};

/// Product record. Wire form is camelCase with RFC 3339 timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub sku: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_by_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, price, category, sku, description, \
                       created_by, created_by_name, created_at, updated_at";

impl Product {
    /// Page of products, newest first, optionally filtered by a
    /// case-insensitive substring match on the name.
    pub async fn search(
        db: &PgPool,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(q)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool, q: Option<&str>) -> anyhow::Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(q)
        .fetch_one(db)
        .await?;
        Ok(total)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Insert with owner stamped from the caller's token claims; both
    /// timestamps default to now() in the schema.
    pub async fn insert(
        db: &PgPool,
        new: &NewProduct,
        created_by: &str,
        created_by_name: &str,
    ) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, price, category, sku, description,
                                  created_by, created_by_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.price)
        .bind(&new.category)
        .bind(&new.sku)
        .bind(&new.description)
        .bind(created_by)
        .bind(created_by_name)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Partial update: absent fields keep their stored value, `updated_at`
    /// always refreshes. Owner columns are not touchable here.
    pub async fn apply_patch(
        db: &PgPool,
        id: Uuid,
        patch: &ProductPatch,
    ) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2::text, name),
                price = COALESCE($3::double precision, price),
                category = COALESCE($4::text, category),
                sku = COALESCE($5::text, sku),
                description = COALESCE($6::text, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(patch.price)
        .bind(&patch.category)
        .bind(&patch.sku)
        .bind(&patch.description)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// True when a row was actually removed.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn wire_format_is_camel_case_rfc3339() {
        let product = Product {
            id: Uuid::nil(),
            name: "Widget".into(),
            price: 9.99,
            category: "Home".into(),
            sku: "W-1".into(),
            description: None,
            created_by: "a@x.com".into(),
            created_by_name: "A".into(),
            created_at: datetime!(2026-01-02 03:04:05 UTC),
            updated_at: datetime!(2026-01-02 03:04:05 UTC),
        };
        let value = serde_json::to_value(&product).expect("serialize");
        assert_eq!(value["createdBy"], "a@x.com");
        assert_eq!(value["createdByName"], "A");
        assert_eq!(value["createdAt"], "2026-01-02T03:04:05Z");
        assert_eq!(value["updatedAt"], "2026-01-02T03:04:05Z");
        assert_eq!(value["price"], 9.99);
        assert!(value.get("created_by").is_none());
    }
}
