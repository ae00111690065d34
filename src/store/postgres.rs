use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::model::{ObjectKind, ObjectNode, ObjectPatch};
use crate::query::Pagination;
use crate::store::{ObjectStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "object" (
        "id" uuid PRIMARY KEY,
        "name" text NOT NULL,
        "description" text,
        "type" text NOT NULL CHECK ("type" IN ('Organization', 'Unit', 'Room', 'Bed')),
        "parent_id" uuid REFERENCES "object" ("id") ON DELETE CASCADE,
        "level" integer NOT NULL,
        "config" text,
        "created_at" timestamptz NOT NULL DEFAULT now(),
        "updated_at" timestamptz NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_object_parent" ON "object" ("parent_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_object_type_level" ON "object" ("type", "level")"#,
];

const COLUMNS: &str =
    r#""id", "name", "description", "type", "parent_id", "level", "config", "created_at", "updated_at""#;

// Breadth-first ids under $1; the visited path stops the walk at a parent loop
const SUBTREE_IDS: &str = r#"WITH RECURSIVE subtree ("id", depth, path) AS (
        SELECT "id", 0, ARRAY["id"] FROM "object" WHERE "id" = $1
        UNION ALL
        SELECT o."id", s.depth + 1, s.path || o."id"
        FROM "object" o JOIN subtree s ON o."parent_id" = s."id"
        WHERE NOT o."id" = ANY(s.path)
    )
    SELECT "id" FROM subtree ORDER BY depth"#;

// Postgres foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, FromRow)]
struct ObjectRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    #[sqlx(rename = "type")]
    kind: String,
    parent_id: Option<Uuid>,
    level: i32,
    config: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ObjectRow> for ObjectNode {
    type Error = StoreError;

    fn try_from(row: ObjectRow) -> Result<Self, Self::Error> {
        let kind: ObjectKind = row
            .kind
            .parse()
            .map_err(|e: crate::model::UnknownObjectKind| StoreError::Corrupt(format!("{}: {}", row.id, e)))?;
        Ok(ObjectNode {
            id: row.id,
            name: row.name,
            description: row.description,
            kind,
            parent_id: row.parent_id,
            level: row.level,
            config: row.config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_nodes(rows: Vec<ObjectRow>) -> Result<Vec<ObjectNode>, StoreError> {
    rows.into_iter().map(ObjectNode::try_from).collect()
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Postgres-backed store; the foreign key performs the cascade
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Connected object store to {}{}",
            parsed.host_str().unwrap_or("localhost"),
            parsed.path()
        );
        Ok(Self { pool })
    }

    /// Create the object table and its indexes if missing
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Object schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ObjectStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, node: ObjectNode) -> Result<ObjectNode, StoreError> {
        let sql = format!(
            r#"INSERT INTO "object" ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"#
        );
        let result = sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(node.id)
            .bind(&node.name)
            .bind(&node.description)
            .bind(node.kind.as_str())
            .bind(node.parent_id)
            .bind(node.level)
            .bind(&node.config)
            .bind(node.created_at)
            .bind(node.updated_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row.try_into(),
            Err(err) => match db_error_code(&err).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => Err(StoreError::ParentNotFound(node.parent_id.unwrap_or(node.id))),
                Some(UNIQUE_VIOLATION) => Err(StoreError::Duplicate(node.id)),
                _ => Err(err.into()),
            },
        }
    }

    async fn update(&self, id: Uuid, patch: ObjectPatch) -> Result<ObjectNode, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(r#"SELECT {COLUMNS} FROM "object" WHERE "id" = $1 FOR UPDATE"#);
        let row = sqlx::query_as::<_, ObjectRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        let mut node = ObjectNode::try_from(row)?;
        patch.apply(&mut node, Utc::now());

        let update = format!(
            r#"UPDATE "object"
               SET "name" = $2, "description" = $3, "type" = $4, "parent_id" = $5,
                   "level" = $6, "config" = $7, "updated_at" = $8
               WHERE "id" = $1
               RETURNING {COLUMNS}"#
        );
        let result = sqlx::query_as::<_, ObjectRow>(&update)
            .bind(node.id)
            .bind(&node.name)
            .bind(&node.description)
            .bind(node.kind.as_str())
            .bind(node.parent_id)
            .bind(node.level)
            .bind(&node.config)
            .bind(node.updated_at)
            .fetch_one(&mut *tx)
            .await;

        let row = match result {
            Ok(row) => row,
            Err(err) if db_error_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                return Err(StoreError::ParentNotFound(node.parent_id.unwrap_or(id)));
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed: Vec<Uuid> = sqlx::query_scalar(SUBTREE_IDS)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        if removed.is_empty() {
            return Err(StoreError::NotFound(id));
        }

        sqlx::query(r#"DELETE FROM "object" WHERE "id" = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ObjectNode>, StoreError> {
        let sql = format!(r#"SELECT {COLUMNS} FROM "object" WHERE "id" = $1"#);
        sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ObjectNode::try_from)
            .transpose()
    }

    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<ObjectNode>, u64), StoreError> {
        let sql = format!(
            r#"SELECT {COLUMNS} FROM "object" ORDER BY "created_at", "id" LIMIT $1 OFFSET $2"#
        );
        let rows = sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(i64::try_from(pagination.limit()).unwrap_or(i64::MAX))
            .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "object""#)
            .fetch_one(&self.pool)
            .await?;

        Ok((into_nodes(rows)?, u64::try_from(total).unwrap_or_default()))
    }

    async fn list_all(&self) -> Result<Vec<ObjectNode>, StoreError> {
        let sql = format!(r#"SELECT {COLUMNS} FROM "object" ORDER BY "created_at", "id""#);
        let rows = sqlx::query_as::<_, ObjectRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_nodes(rows)
    }

    async fn list_by_kind(&self, kind: ObjectKind) -> Result<Vec<ObjectNode>, StoreError> {
        let sql = format!(
            r#"SELECT {COLUMNS} FROM "object" WHERE "type" = $1 ORDER BY "created_at", "id""#
        );
        let rows = sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;
        into_nodes(rows)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str) -> ObjectRow {
        let now = Utc::now();
        ObjectRow {
            id: Uuid::new_v4(),
            name: "Ward".to_string(),
            description: None,
            kind: kind.to_string(),
            parent_id: None,
            level: 1,
            config: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn converts_known_type_rows() {
        let node = ObjectNode::try_from(row("Unit")).unwrap();
        assert_eq!(node.kind, ObjectKind::Unit);
    }

    #[test]
    fn rejects_device_type_rows() {
        assert!(matches!(ObjectNode::try_from(row("Gateway")), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn schema_cascades_parent_deletes() {
        assert!(SCHEMA[0].contains("ON DELETE CASCADE"));
    }

    #[test]
    fn subtree_walk_tracks_visited_ids() {
        assert!(SUBTREE_IDS.contains("NOT o.\"id\" = ANY(s.path)"));
    }

    // Runs only when TEST_DATABASE_URL points at a scratch Postgres database
    #[tokio::test]
    async fn delete_terminates_on_parent_loop() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let store = PgStore::connect(&url, &crate::config::AppConfig::development().database)
            .await
            .unwrap();
        store.migrate().await.unwrap();

        let now = Utc::now();
        let a = store
            .create(ObjectNode::from_input(
                crate::model::CreateObjectInput::new("Loop A", ObjectKind::Organization, 0),
                now,
            ))
            .await
            .unwrap();
        let b = store
            .create(ObjectNode::from_input(
                crate::model::CreateObjectInput::new("Loop B", ObjectKind::Unit, 1).with_parent(a.id),
                now,
            ))
            .await
            .unwrap();
        store.update(a.id, ObjectPatch::reparent(b.id)).await.unwrap();

        let removed = tokio::time::timeout(Duration::from_secs(10), store.delete(a.id))
            .await
            .expect("delete did not finish")
            .unwrap();

        assert_eq!(removed, vec![a.id, b.id]);
        assert!(store.get_by_id(b.id).await.unwrap().is_none());
        store.close().await;
    }
}
