// SQLite-backed share event store.
//
// Aggregation happens in SQL: strftime buckets rows by day, month, or year
// and unique users come from COUNT(DISTINCT user_id).

use crate::core::analytics::{
    ShareAnalyticsQuery, ShareAnalyticsRow, ShareDeviceInfo, ShareError, ShareEvent, ShareLocation,
    ShareMethod, SharePlatform, ShareStore,
};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

#[derive(Clone)]
pub struct SqliteShareStore {
    pool: Pool<Sqlite>,
}

impl SqliteShareStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let path_str = database_url
            .trim_start_matches("sqlite://")
            .split('?')
            .next()
            .unwrap_or_default();
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shares (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                user_name TEXT,
                user_email TEXT,
                platform TEXT NOT NULL,
                share_method TEXT NOT NULL DEFAULT 'just-once',
                shared_url TEXT NOT NULL,
                device_type TEXT,
                os TEXT,
                browser TEXT,
                screen_size TEXT,
                user_agent TEXT,
                ip_address TEXT,
                country TEXT,
                city TEXT,
                region TEXT,
                session_id TEXT,
                referrer TEXT,
                campaign TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                success BOOLEAN NOT NULL DEFAULT 1,
                error TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_shares_created ON shares(created_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_shares_platform ON shares(platform)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn storage_err(e: sqlx::Error) -> ShareError {
    ShareError::StorageError(e.to_string())
}

/// WHERE fragment shared by the aggregate queries. Returns the SQL and the
/// string binds, in order.
fn filter_sql(query: &ShareAnalyticsQuery) -> (String, Vec<String>) {
    let mut sql = String::from("1 = 1");
    let mut binds = Vec::new();
    if let Some(start) = query.start {
        sql.push_str(" AND created_at >= ?");
        binds.push(start.to_rfc3339());
    }
    if let Some(end) = query.end {
        sql.push_str(" AND created_at <= ?");
        binds.push(end.to_rfc3339());
    }
    if let Some(platform) = query.platform {
        sql.push_str(" AND platform = ?");
        binds.push(platform.as_str().to_string());
    }
    (sql, binds)
}

#[async_trait]
impl ShareStore for SqliteShareStore {
    async fn record_share(&self, event: &ShareEvent) -> Result<(), ShareError> {
        let tags = serde_json::to_string(&event.tags)
            .map_err(|e| ShareError::StorageError(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO shares (
                id, user_id, user_name, user_email, platform, share_method,
                shared_url, device_type, os, browser, screen_size, user_agent,
                ip_address, country, city, region, session_id, referrer,
                campaign, tags, success, error, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.user_id)
        .bind(&event.user_name)
        .bind(&event.user_email)
        .bind(event.platform.as_str())
        .bind(event.share_method.as_str())
        .bind(&event.shared_url)
        .bind(&event.device_info.device_type)
        .bind(&event.device_info.os)
        .bind(&event.device_info.browser)
        .bind(&event.device_info.screen_size)
        .bind(&event.device_info.user_agent)
        .bind(&event.location.ip_address)
        .bind(&event.location.country)
        .bind(&event.location.city)
        .bind(&event.location.region)
        .bind(&event.session_id)
        .bind(&event.referrer)
        .bind(&event.campaign)
        .bind(tags)
        .bind(event.success)
        .bind(&event.error)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn total_shares(&self) -> Result<i64, ShareError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM shares")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(row.get("n"))
    }

    async fn grouped_analytics(
        &self,
        query: &ShareAnalyticsQuery,
    ) -> Result<Vec<ShareAnalyticsRow>, ShareError> {
        let (filter, binds) = filter_sql(query);
        let sql = format!(
            r#"
            SELECT
                strftime('{fmt}', created_at) AS period,
                platform,
                COUNT(*) AS n,
                COUNT(DISTINCT user_id) AS unique_users
            FROM shares
            WHERE {filter}
            GROUP BY period, platform
            ORDER BY period DESC, n DESC
            "#,
            fmt = query.group_by.time_format(),
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row.get("platform");
                let platform = SharePlatform::parse(&raw)
                    .ok_or_else(|| ShareError::StorageError(format!("bad platform {raw:?}")))?;
                Ok(ShareAnalyticsRow {
                    period: row.get("period"),
                    platform,
                    count: row.get("n"),
                    unique_users: row.get("unique_users"),
                })
            })
            .collect()
    }

    async fn unique_users(&self, query: &ShareAnalyticsQuery) -> Result<i64, ShareError> {
        let (filter, binds) = filter_sql(query);
        let sql = format!("SELECT COUNT(DISTINCT user_id) AS n FROM shares WHERE {filter}");
        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let row = q.fetch_one(&self.pool).await.map_err(storage_err)?;
        Ok(row.get("n"))
    }
}

#[allow(dead_code)]
impl SqliteShareStore {
    /// Raw event readback, used in tests.
    async fn load(&self, id: uuid::Uuid) -> Result<Option<ShareEvent>, ShareError> {
        let row = sqlx::query("SELECT * FROM shares WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        let Some(row) = row else { return Ok(None) };

        let platform_raw: String = row.get("platform");
        let platform = SharePlatform::parse(&platform_raw)
            .ok_or_else(|| ShareError::StorageError(format!("bad platform {platform_raw:?}")))?;
        let method_raw: String = row.get("share_method");
        let share_method = ShareMethod::parse(&method_raw).unwrap_or_default();
        let tags: Vec<String> = serde_json::from_str(row.get::<String, _>("tags").as_str())
            .map_err(|e| ShareError::StorageError(e.to_string()))?;
        let created_raw: String = row.get("created_at");
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .map_err(|e| ShareError::StorageError(e.to_string()))?;

        Ok(Some(ShareEvent {
            id: uuid::Uuid::parse_str(row.get::<String, _>("id").as_str())
                .map_err(|e| ShareError::StorageError(e.to_string()))?,
            user_id: row.get("user_id"),
            user_name: row.get("user_name"),
            user_email: row.get("user_email"),
            platform,
            share_method,
            shared_url: row.get("shared_url"),
            device_info: ShareDeviceInfo {
                device_type: row.get("device_type"),
                os: row.get("os"),
                browser: row.get("browser"),
                screen_size: row.get("screen_size"),
                user_agent: row.get("user_agent"),
            },
            location: ShareLocation {
                ip_address: row.get("ip_address"),
                country: row.get("country"),
                city: row.get("city"),
                region: row.get("region"),
            },
            session_id: row.get("session_id"),
            referrer: row.get("referrer"),
            campaign: row.get("campaign"),
            tags,
            success: row.get("success"),
            error: row.get("error"),
            created_at,
        }))
    }
}
