// SQLite-backed review store.
//
// Timestamps are stored as RFC 3339 text. Flags live in their own table and
// are loaded per review; list sizes are page-bounded so the extra queries
// stay cheap.

use crate::core::reviews::{
    empty_distribution, AdminResponse, AppStoreChannel, DecisionUpdate, DeviceInfo, Page,
    PlatformCount, PublicReviewQuery, RatingSummary, Review, ReviewFlag, ReviewMetadata,
    ReviewStatistics, ReviewStatus, ReviewStore, SortField, SortOrder, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteReviewStore {
    pool: Pool<Sqlite>,
}

impl SqliteReviewStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
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
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                user_email TEXT NOT NULL,
                rating INTEGER NOT NULL,
                review TEXT NOT NULL DEFAULT '',
                app_store TEXT NOT NULL DEFAULT 'web',
                status TEXT NOT NULL DEFAULT 'pending',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                helpful_votes INTEGER NOT NULL DEFAULT 0,
                unhelpful_votes INTEGER NOT NULL DEFAULT 0,
                report_count INTEGER NOT NULL DEFAULT 0,
                admin_response_text TEXT,
                admin_response_by TEXT,
                admin_response_at TEXT,
                device_type TEXT,
                os TEXT,
                browser TEXT,
                user_agent TEXT,
                ip_address TEXT,
                session_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS review_flags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                review_id TEXT NOT NULL REFERENCES reviews(id),
                user_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id, created_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_flags_review ON review_flags(review_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load_flags(&self, review_id: Uuid) -> Result<Vec<ReviewFlag>, StoreError> {
        let rows = sqlx::query(
            "SELECT user_id, reason, created_at FROM review_flags WHERE review_id = ? ORDER BY id",
        )
        .bind(review_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(ReviewFlag {
                    user_id: row.get("user_id"),
                    reason: row.get("reason"),
                    created_at: parse_ts(row.get("created_at"))?,
                })
            })
            .collect()
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Review, StoreError> {
        let id = parse_id(row.get("id"))?;
        let mut review = review_from_row(row)?;
        review.flags = self.load_flags(id).await?;
        Ok(review)
    }

    async fn hydrate_all(
        &self,
        rows: Vec<sqlx::sqlite::SqliteRow>,
    ) -> Result<Vec<Review>, StoreError> {
        let mut reviews = Vec::with_capacity(rows.len());
        for row in &rows {
            reviews.push(self.hydrate(row).await?);
        }
        Ok(reviews)
    }
}

fn storage_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn parse_ts(raw: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("bad timestamp {raw:?}: {e}")))
}

fn parse_id(raw: String) -> Result<Uuid, StoreError> {
    Uuid::parse_str(&raw).map_err(|e| StoreError::Unavailable(format!("bad review id {raw:?}: {e}")))
}

fn review_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Review, StoreError> {
    let status_raw: String = row.get("status");
    let status = ReviewStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Unavailable(format!("bad status {status_raw:?}")))?;
    let store_raw: String = row.get("app_store");
    let app_store = AppStoreChannel::parse(&store_raw)
        .ok_or_else(|| StoreError::Unavailable(format!("bad app store {store_raw:?}")))?;

    let admin_response = match row.get::<Option<String>, _>("admin_response_text") {
        Some(text) => Some(AdminResponse {
            text,
            responded_by: row.get::<Option<String>, _>("admin_response_by").unwrap_or_default(),
            responded_at: parse_ts(
                row.get::<Option<String>, _>("admin_response_at").unwrap_or_default(),
            )?,
        }),
        None => None,
    };

    Ok(Review {
        id: parse_id(row.get("id"))?,
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        rating: row.get::<i64, _>("rating") as u8,
        review: row.get("review"),
        app_store,
        status,
        is_featured: row.get("is_featured"),
        helpful_votes: row.get("helpful_votes"),
        unhelpful_votes: row.get("unhelpful_votes"),
        report_count: row.get("report_count"),
        admin_response,
        flags: Vec::new(),
        device_info: DeviceInfo {
            device_type: row.get("device_type"),
            os: row.get("os"),
            browser: row.get("browser"),
            user_agent: row.get("user_agent"),
        },
        metadata: ReviewMetadata {
            ip_address: row.get("ip_address"),
            session_id: row.get("session_id"),
        },
        created_at: parse_ts(row.get("created_at"))?,
        updated_at: parse_ts(row.get("updated_at"))?,
    })
}

fn sort_clause(field: SortField, order: SortOrder) -> String {
    let column = match field {
        SortField::CreatedAt => "created_at",
        SortField::Rating => "rating",
        SortField::HelpfulVotes => "helpful_votes",
    };
    let direction = match order {
        SortOrder::Desc => "DESC",
        SortOrder::Asc => "ASC",
    };
    format!("{column} {direction}")
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn create_review(&self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, user_id, user_name, user_email, rating, review, app_store,
                status, is_featured, helpful_votes, unhelpful_votes, report_count,
                device_type, os, browser, user_agent, ip_address, session_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.id.to_string())
        .bind(&review.user_id)
        .bind(&review.user_name)
        .bind(&review.user_email)
        .bind(i64::from(review.rating))
        .bind(&review.review)
        .bind(review.app_store.as_str())
        .bind(review.status.as_str())
        .bind(review.is_featured)
        .bind(review.helpful_votes)
        .bind(review.unhelpful_votes)
        .bind(review.report_count)
        .bind(&review.device_info.device_type)
        .bind(&review.device_info.os)
        .bind(&review.device_info.browser)
        .bind(&review.device_info.user_agent)
        .bind(&review.metadata.ip_address)
        .bind(&review.metadata.session_id)
        .bind(review.created_at.to_rfc3339())
        .bind(review.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query("SELECT * FROM reviews WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn has_pending_review(&self, user_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 FROM reviews WHERE user_id = ? AND status = 'pending' LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.is_some())
    }

    async fn count_reviews_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM reviews WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn apply_decision(
        &self,
        id: Uuid,
        update: DecisionUpdate,
    ) -> Result<Option<Review>, StoreError> {
        let (text, by, at) = match &update.admin_response {
            Some(r) => (
                Some(r.text.clone()),
                Some(r.responded_by.clone()),
                Some(r.responded_at.to_rfc3339()),
            ),
            None => (None, None, None),
        };

        // COALESCE keeps a prior response when no new text was supplied.
        let result = sqlx::query(
            r#"
            UPDATE reviews SET
                status = ?,
                is_featured = CASE WHEN ? THEN 0 ELSE is_featured END,
                admin_response_text = COALESCE(?, admin_response_text),
                admin_response_by = COALESCE(?, admin_response_by),
                admin_response_at = COALESCE(?, admin_response_at),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.reset_featured)
        .bind(text)
        .bind(by)
        .bind(at)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_review(id).await
    }

    async fn increment_helpful_votes(&self, id: Uuid) -> Result<Option<i64>, StoreError> {
        let result = sqlx::query(
            "UPDATE reviews SET helpful_votes = helpful_votes + 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query("SELECT helpful_votes FROM reviews WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(Some(row.get("helpful_votes")))
    }

    async fn append_flag(&self, id: Uuid, flag: ReviewFlag) -> Result<Option<i64>, StoreError> {
        let result = sqlx::query(
            "UPDATE reviews SET report_count = report_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO review_flags (review_id, user_id, reason, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&flag.user_id)
        .bind(&flag.reason)
        .bind(flag.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        let row = sqlx::query("SELECT report_count FROM reviews WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(Some(row.get("report_count")))
    }

    async fn list_public(&self, query: &PublicReviewQuery) -> Result<Page<Review>, StoreError> {
        let mut where_sql = String::from("status = 'approved'");
        if query.rating.is_some() {
            where_sql.push_str(" AND rating = ?");
        }
        if query.app_store.is_some() {
            where_sql.push_str(" AND app_store = ?");
        }

        let count_sql = format!("SELECT COUNT(*) AS n FROM reviews WHERE {where_sql}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(rating) = query.rating {
            count_query = count_query.bind(i64::from(rating));
        }
        if let Some(store) = query.app_store {
            count_query = count_query.bind(store.as_str());
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?
            .get("n");

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let list_sql = format!(
            "SELECT * FROM reviews WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
            sort_clause(query.sort_by, query.sort_order)
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(rating) = query.rating {
            list_query = list_query.bind(i64::from(rating));
        }
        if let Some(store) = query.app_store {
            list_query = list_query.bind(store.as_str());
        }
        let rows = list_query
            .bind(i64::from(limit))
            .bind(i64::from(page - 1) * i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(Page::new(self.hydrate_all(rows).await?, page, limit, total))
    }

    async fn rating_summary(&self) -> Result<RatingSummary, StoreError> {
        let rows = sqlx::query(
            "SELECT rating, COUNT(*) AS n FROM reviews WHERE status = 'approved' GROUP BY rating",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut distribution = empty_distribution();
        let mut total = 0i64;
        let mut weighted = 0i64;
        for row in rows {
            let rating = row.get::<i64, _>("rating");
            let count = row.get::<i64, _>("n");
            if let Ok(star) = u8::try_from(rating) {
                if (1..=5).contains(&star) {
                    distribution.insert(star, count);
                }
            }
            total += count;
            weighted += rating * count;
        }

        Ok(RatingSummary {
            average_rating: if total == 0 {
                0.0
            } else {
                weighted as f64 / total as f64
            },
            total_reviews: total,
            rating_distribution: distribution,
        })
    }

    async fn list_pending(&self, page: u32, limit: u32) -> Result<Page<Review>, StoreError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM reviews WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?
            .get("n");

        let page = page.max(1);
        let limit = limit.max(1);
        let rows = sqlx::query(
            "SELECT * FROM reviews WHERE status = 'pending' ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(i64::from(limit))
        .bind(i64::from(page - 1) * i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(Page::new(self.hydrate_all(rows).await?, page, limit, total))
    }

    async fn statistics(&self) -> Result<ReviewStatistics, StoreError> {
        let counts = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END) AS pending,
                SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END) AS approved,
                SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END) AS rejected
            FROM reviews
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let summary = self.rating_summary().await?;

        let recent_rows = sqlx::query(
            "SELECT * FROM reviews WHERE status = 'approved' ORDER BY helpful_votes DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let platform_rows = sqlx::query(
            "SELECT app_store, COUNT(*) AS n FROM reviews GROUP BY app_store ORDER BY n DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut top_platforms = Vec::with_capacity(platform_rows.len());
        for row in platform_rows {
            let raw: String = row.get("app_store");
            let app_store = AppStoreChannel::parse(&raw)
                .ok_or_else(|| StoreError::Unavailable(format!("bad app store {raw:?}")))?;
            top_platforms.push(PlatformCount {
                app_store,
                count: row.get("n"),
            });
        }

        Ok(ReviewStatistics {
            total_reviews: counts.get("total"),
            pending_reviews: counts.get::<Option<i64>, _>("pending").unwrap_or(0),
            approved_reviews: counts.get::<Option<i64>, _>("approved").unwrap_or(0),
            rejected_reviews: counts.get::<Option<i64>, _>("rejected").unwrap_or(0),
            average_rating: summary.average_rating,
            rating_distribution: summary.rating_distribution,
            recent_reviews: self.hydrate_all(recent_rows).await?,
            top_platforms,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn temp_store() -> (tempfile::TempDir, SqliteReviewStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");
        let store = SqliteReviewStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    fn sample(user_id: &str, rating: u8, status: ReviewStatus) -> Review {
        let now = Utc::now();
        Review {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
            rating,
            review: "Nice".to_string(),
            app_store: AppStoreChannel::GooglePlay,
            status,
            is_featured: true,
            helpful_votes: 0,
            unhelpful_votes: 0,
            report_count: 0,
            admin_response: None,
            flags: Vec::new(),
            device_info: DeviceInfo::default(),
            metadata: ReviewMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn round_trips_a_review_with_flags() {
        let (_dir, store) = temp_store().await;
        let review = sample("user-1", 5, ReviewStatus::Pending);
        store.create_review(&review).await.unwrap();

        let flag = ReviewFlag {
            user_id: "user-2".to_string(),
            reason: "spam".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(store.append_flag(review.id, flag).await.unwrap(), Some(1));

        let loaded = store.get_review(review.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.rating, 5);
        assert_eq!(loaded.report_count, 1);
        assert_eq!(loaded.flags.len(), 1);
        assert_eq!(loaded.flags[0].reason, "spam");
    }

    #[tokio::test]
    async fn pending_and_window_counts_see_only_the_right_rows() {
        let (_dir, store) = temp_store().await;
        store
            .create_review(&sample("user-1", 4, ReviewStatus::Approved))
            .await
            .unwrap();
        assert!(!store.has_pending_review("user-1").await.unwrap());

        store
            .create_review(&sample("user-1", 4, ReviewStatus::Pending))
            .await
            .unwrap();
        assert!(store.has_pending_review("user-1").await.unwrap());
        assert!(!store.has_pending_review("user-2").await.unwrap());

        let day_ago = Utc::now() - Duration::hours(24);
        assert_eq!(store.count_reviews_since("user-1", day_ago).await.unwrap(), 2);
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(store.count_reviews_since("user-1", future).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn decision_resets_featured_and_preserves_prior_response() {
        let (_dir, store) = temp_store().await;
        let review = sample("user-1", 3, ReviewStatus::Pending);
        store.create_review(&review).await.unwrap();

        let approved = store
            .apply_decision(
                review.id,
                DecisionUpdate {
                    status: ReviewStatus::Approved,
                    reset_featured: true,
                    admin_response: Some(AdminResponse {
                        text: "Thanks!".to_string(),
                        responded_by: "admin-1".to_string(),
                        responded_at: Utc::now(),
                    }),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert!(!approved.is_featured);

        let rejected = store
            .apply_decision(
                review.id,
                DecisionUpdate {
                    status: ReviewStatus::Rejected,
                    reset_featured: false,
                    admin_response: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.status, ReviewStatus::Rejected);
        assert_eq!(rejected.admin_response.unwrap().text, "Thanks!");

        assert!(store
            .apply_decision(
                Uuid::new_v4(),
                DecisionUpdate {
                    status: ReviewStatus::Approved,
                    reset_featured: true,
                    admin_response: None,
                },
            )
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn public_listing_filters_sorts_and_pages() {
        let (_dir, store) = temp_store().await;
        for rating in [5, 3, 4] {
            let mut review = sample("user-1", rating, ReviewStatus::Approved);
            review.helpful_votes = i64::from(rating);
            store.create_review(&review).await.unwrap();
        }
        store
            .create_review(&sample("user-2", 5, ReviewStatus::Pending))
            .await
            .unwrap();

        let query = PublicReviewQuery {
            sort_by: SortField::Rating,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 2,
            ..PublicReviewQuery::default()
        };
        let page = store.list_public(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].rating, 5);
        assert_eq!(page.items[1].rating, 4);

        let filtered = PublicReviewQuery {
            rating: Some(3),
            page: 1,
            limit: 10,
            ..PublicReviewQuery::default()
        };
        let page = store.list_public(&filtered).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].rating, 3);

        // An offset far beyond u32 must not wrap; the page is just empty.
        let distant = PublicReviewQuery {
            page: u32::MAX,
            limit: 100,
            ..PublicReviewQuery::default()
        };
        let page = store.list_public(&distant).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);

        let page = store.list_pending(u32::MAX, 100).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn summary_and_statistics_aggregate_approved_rows() {
        let (_dir, store) = temp_store().await;
        for rating in [5, 5, 4] {
            store
                .create_review(&sample("user-1", rating, ReviewStatus::Approved))
                .await
                .unwrap();
        }
        store
            .create_review(&sample("user-2", 1, ReviewStatus::Rejected))
            .await
            .unwrap();
        store
            .create_review(&sample("user-3", 2, ReviewStatus::Pending))
            .await
            .unwrap();

        let summary = store.rating_summary().await.unwrap();
        assert_eq!(summary.total_reviews, 3);
        assert!((summary.average_rating - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.rating_distribution[&5], 2);
        assert_eq!(summary.rating_distribution[&4], 1);
        assert_eq!(summary.rating_distribution[&1], 0);

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total_reviews, 5);
        assert_eq!(stats.pending_reviews, 1);
        assert_eq!(stats.approved_reviews, 3);
        assert_eq!(stats.rejected_reviews, 1);
        assert_eq!(stats.recent_reviews.len(), 3);
        assert_eq!(stats.top_platforms[0].count, 5);

        assert!(store.ping().await.is_ok());
    }
}
