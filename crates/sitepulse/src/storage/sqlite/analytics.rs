//! SQLite analytics repository.

use async_trait::async_trait;
use chrono::Utc;
use sitepulse_core::analytics::{
    AnalyticsRepository, BrowserCount, DeviceCount, HeatmapPoint, MetadataCount, NewEvent,
    NewHeatmapPoint, NewPageview, NewVisitorSession, PathViews, Summary, VisitorSession,
};
use sitepulse_core::storage::{format_timestamp, Result, TimeRange};
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
    Sqlite, SqlitePool,
};

use super::conversions::{column, parse_timestamp};
use super::error::map_sqlx_error;
use super::schema::{
    INSERT_EVENT, INSERT_HEATMAP, INSERT_PAGEVIEW, INSERT_SESSION, RANGE_FILTER, SELECT_HEATMAP,
    SELECT_RECENT_SESSIONS, TOUCH_SESSION,
};
use crate::storage::Database;

const SESSION: &str = "AnalyticsSession";
const PAGEVIEW: &str = "AnalyticsPageview";
const EVENT: &str = "AnalyticsEvent";
const HEATMAP: &str = "AnalyticsHeatmap";

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds the four placeholders of [`RANGE_FILTER`].
fn bind_range<'q>(query: SqliteQuery<'q>, range: &TimeRange) -> SqliteQuery<'q> {
    let (start, end) = (range.start_key(), range.end_key());
    query.bind(start.clone()).bind(start).bind(end.clone()).bind(end)
}

/// SQLite-backed [`AnalyticsRepository`].
#[derive(Clone)]
pub struct AnalyticsStore {
    db: Database,
}

impl AnalyticsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.db.pool().await
    }

    async fn count(&self, table: &str, range: &TimeRange, entity: &'static str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS count FROM {table} WHERE {RANGE_FILTER}");
        let row = bind_range(sqlx::query(&sql), range)
            .fetch_one(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, entity))?;
        column(&row, "count", entity)
    }

    async fn grouped_by(
        &self,
        group_column: &str,
        range: &TimeRange,
    ) -> Result<Vec<(Option<String>, i64)>> {
        let sql = format!(
            "SELECT {group_column} AS label, COUNT(*) AS count FROM analytics_sessions \
             WHERE {RANGE_FILTER} GROUP BY {group_column} ORDER BY count DESC"
        );
        let rows = bind_range(sqlx::query(&sql), range)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, SESSION))?;

        rows.iter()
            .map(|row| Ok((column(row, "label", SESSION)?, column(row, "count", SESSION)?)))
            .collect()
    }

    async fn touch_session(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        session_id: &str,
        now: &str,
    ) -> Result<()> {
        sqlx::query(TOUCH_SESSION)
            .bind(now)
            .bind(session_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(e, SESSION))?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsRepository for AnalyticsStore {
    async fn create_session(
        &self,
        session: &NewVisitorSession,
        user_id: Option<i64>,
    ) -> Result<()> {
        session.validate()?;
        let now = format_timestamp(&Utc::now());

        sqlx::query(INSERT_SESSION)
            .bind(&session.session_id)
            .bind(user_id)
            .bind(&session.user_agent)
            .bind(&session.ip_address)
            .bind(&session.country)
            .bind(&session.city)
            .bind(&session.device)
            .bind(&session.browser)
            .bind(&session.os)
            .bind(&session.referrer)
            .bind(&session.landing_page)
            .bind(&now)
            .bind(&now)
            .execute(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, SESSION))?;

        Ok(())
    }

    async fn track_pageview(&self, pageview: &NewPageview) -> Result<()> {
        pageview.validate()?;
        let now = format_timestamp(&Utc::now());
        let mut tx = self
            .pool()
            .await?
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, PAGEVIEW))?;

        sqlx::query(INSERT_PAGEVIEW)
            .bind(&pageview.session_id)
            .bind(&pageview.path)
            .bind(&pageview.title)
            .bind(&pageview.referrer)
            .bind(pageview.duration)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, PAGEVIEW))?;

        Self::touch_session(&mut tx, &pageview.session_id, &now).await?;
        tx.commit().await.map_err(|e| map_sqlx_error(e, PAGEVIEW))
    }

    async fn track_event(&self, event: &NewEvent) -> Result<()> {
        event.validate()?;
        let now = format_timestamp(&Utc::now());
        let mut tx = self
            .pool()
            .await?
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, EVENT))?;

        sqlx::query(INSERT_EVENT)
            .bind(&event.session_id)
            .bind(&event.event_type)
            .bind(&event.event_name)
            .bind(&event.element_id)
            .bind(&event.element_class)
            .bind(&event.element_text)
            .bind(&event.path)
            .bind(&event.metadata)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, EVENT))?;

        Self::touch_session(&mut tx, &event.session_id, &now).await?;
        tx.commit().await.map_err(|e| map_sqlx_error(e, EVENT))
    }

    async fn track_heatmap(&self, point: &NewHeatmapPoint) -> Result<()> {
        point.validate()?;

        sqlx::query(INSERT_HEATMAP)
            .bind(&point.session_id)
            .bind(&point.path)
            .bind(&point.event_type)
            .bind(point.x)
            .bind(point.y)
            .bind(point.scroll_depth)
            .bind(point.viewport_width)
            .bind(point.viewport_height)
            .bind(format_timestamp(&Utc::now()))
            .execute(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, HEATMAP))?;

        Ok(())
    }

    async fn summary(&self, range: TimeRange) -> Result<Summary> {
        let (total_sessions, total_pageviews, total_events) = tokio::try_join!(
            self.count("analytics_sessions", &range, SESSION),
            self.count("analytics_pageviews", &range, PAGEVIEW),
            self.count("analytics_events", &range, EVENT),
        )?;

        Ok(Summary {
            total_sessions,
            total_pageviews,
            total_events,
        })
    }

    async fn top_pages(&self, limit: i64, range: TimeRange) -> Result<Vec<PathViews>> {
        let sql = format!(
            "SELECT path, COUNT(*) AS views FROM analytics_pageviews \
             WHERE {RANGE_FILTER} GROUP BY path ORDER BY views DESC, path ASC LIMIT ?"
        );
        let rows = bind_range(sqlx::query(&sql), &range)
            .bind(limit)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, PAGEVIEW))?;

        rows.iter()
            .map(|row| {
                Ok(PathViews {
                    path: column(row, "path", PAGEVIEW)?,
                    views: column(row, "views", PAGEVIEW)?,
                })
            })
            .collect()
    }

    async fn heatmap(&self, path: &str, event_type: &str) -> Result<Vec<HeatmapPoint>> {
        let rows = sqlx::query(SELECT_HEATMAP)
            .bind(path)
            .bind(event_type)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, HEATMAP))?;

        rows.iter().map(row_to_heatmap_point).collect()
    }

    async fn recent_sessions(&self, limit: i64) -> Result<Vec<VisitorSession>> {
        let rows = sqlx::query(SELECT_RECENT_SESSIONS)
            .bind(limit)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, SESSION))?;

        rows.iter().map(row_to_session).collect()
    }

    async fn device_counts(&self, range: TimeRange) -> Result<Vec<DeviceCount>> {
        Ok(self
            .grouped_by("device", &range)
            .await?
            .into_iter()
            .map(|(device, count)| DeviceCount { device, count })
            .collect())
    }

    async fn browser_counts(&self, range: TimeRange) -> Result<Vec<BrowserCount>> {
        Ok(self
            .grouped_by("browser", &range)
            .await?
            .into_iter()
            .map(|(browser, count)| BrowserCount { browser, count })
            .collect())
    }

    async fn count_sessions(&self, range: TimeRange) -> Result<i64> {
        self.count("analytics_sessions", &range, SESSION).await
    }

    async fn count_events(&self, event_type: &str, range: TimeRange) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM analytics_events WHERE event_type = ? AND {RANGE_FILTER}"
        );
        let row = bind_range(sqlx::query(&sql).bind(event_type), &range)
            .fetch_one(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, EVENT))?;
        column(&row, "count", EVENT)
    }

    async fn event_metadata_counts(
        &self,
        event_type: &str,
        range: TimeRange,
    ) -> Result<Vec<MetadataCount>> {
        let sql = format!(
            "SELECT metadata, COUNT(*) AS count FROM analytics_events \
             WHERE event_type = ? AND {RANGE_FILTER} GROUP BY metadata"
        );
        let rows = bind_range(sqlx::query(&sql).bind(event_type), &range)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, EVENT))?;

        rows.iter()
            .map(|row| {
                Ok(MetadataCount {
                    metadata: column(row, "metadata", EVENT)?,
                    count: column(row, "count", EVENT)?,
                })
            })
            .collect()
    }

    async fn pageview_durations(&self, range: TimeRange) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT duration FROM analytics_pageviews WHERE duration IS NOT NULL AND {RANGE_FILTER}"
        );
        let rows = bind_range(sqlx::query(&sql), &range)
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error(e, PAGEVIEW))?;

        rows.iter()
            .map(|row| column(row, "duration", PAGEVIEW))
            .collect()
    }
}

fn row_to_session(row: &SqliteRow) -> Result<VisitorSession> {
    Ok(VisitorSession {
        id: column(row, "id", SESSION)?,
        session_id: column(row, "session_id", SESSION)?,
        user_id: column(row, "user_id", SESSION)?,
        user_agent: column(row, "user_agent", SESSION)?,
        ip_address: column(row, "ip_address", SESSION)?,
        country: column(row, "country", SESSION)?,
        city: column(row, "city", SESSION)?,
        device: column(row, "device", SESSION)?,
        browser: column(row, "browser", SESSION)?,
        os: column(row, "os", SESSION)?,
        referrer: column(row, "referrer", SESSION)?,
        landing_page: column(row, "landing_page", SESSION)?,
        created_at: parse_timestamp(row, "created_at", SESSION)?,
        last_activity: parse_timestamp(row, "last_activity", SESSION)?,
    })
}

fn row_to_heatmap_point(row: &SqliteRow) -> Result<HeatmapPoint> {
    Ok(HeatmapPoint {
        id: column(row, "id", HEATMAP)?,
        session_id: column(row, "session_id", HEATMAP)?,
        path: column(row, "path", HEATMAP)?,
        event_type: column(row, "event_type", HEATMAP)?,
        x: column(row, "x", HEATMAP)?,
        y: column(row, "y", HEATMAP)?,
        scroll_depth: column(row, "scroll_depth", HEATMAP)?,
        viewport_width: column(row, "viewport_width", HEATMAP)?,
        viewport_height: column(row, "viewport_height", HEATMAP)?,
        created_at: parse_timestamp(row, "created_at", HEATMAP)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::memory_database;
    use chrono::Duration;
    use sitepulse_core::storage::RepositoryError;

    async fn store() -> AnalyticsStore {
        AnalyticsStore::new(memory_database().await)
    }

    fn session(id: &str, device: &str, browser: &str) -> NewVisitorSession {
        NewVisitorSession {
            session_id: id.to_string(),
            device: Some(device.to_string()),
            browser: Some(browser.to_string()),
            ..Default::default()
        }
    }

    fn pageview(session_id: &str, path: &str, duration: Option<i64>) -> NewPageview {
        NewPageview {
            session_id: session_id.to_string(),
            path: path.to_string(),
            duration,
            ..Default::default()
        }
    }

    fn event(session_id: &str, event_type: &str, metadata: Option<&str>) -> NewEvent {
        NewEvent {
            session_id: session_id.to_string(),
            event_type: event_type.to_string(),
            path: "/".to_string(),
            metadata: metadata.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn summary_counts_all_tables() {
        let store = store().await;
        store.create_session(&session("s1", "desktop", "Chrome"), None).await.unwrap();
        store.create_session(&session("s2", "mobile", "Safari"), None).await.unwrap();
        store.track_pageview(&pageview("s1", "/", None)).await.unwrap();
        store.track_event(&event("s1", "click", None)).await.unwrap();

        let summary = store.summary(TimeRange::unbounded()).await.unwrap();

        assert_eq!(
            summary,
            Summary {
                total_sessions: 2,
                total_pageviews: 1,
                total_events: 1
            }
        );
    }

    #[tokio::test]
    async fn range_bounds_apply_independently() {
        let store = store().await;
        store.create_session(&session("s1", "desktop", "Chrome"), None).await.unwrap();

        let past = Utc::now() - Duration::days(1);
        let future = Utc::now() + Duration::days(1);

        let only_start = TimeRange::new(Some(past), None).unwrap();
        let only_end_in_past = TimeRange::new(None, Some(past)).unwrap();
        let both = TimeRange::new(Some(past), Some(future)).unwrap();

        assert_eq!(store.count_sessions(only_start).await.unwrap(), 1);
        assert_eq!(store.count_sessions(only_end_in_past).await.unwrap(), 0);
        assert_eq!(store.count_sessions(both).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_session_is_invalid_data() {
        let store = store().await;
        store.create_session(&session("s1", "desktop", "Chrome"), None).await.unwrap();

        let result = store.create_session(&session("s1", "desktop", "Chrome"), None).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn pageview_bumps_session_activity() {
        let store = store().await;
        store.create_session(&session("s1", "desktop", "Chrome"), None).await.unwrap();
        let before = store.recent_sessions(1).await.unwrap().remove(0);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.track_pageview(&pageview("s1", "/", None)).await.unwrap();

        let after = store.recent_sessions(1).await.unwrap().remove(0);
        assert!(after.last_activity > before.last_activity);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn top_pages_orders_by_views() {
        let store = store().await;
        for path in ["/a", "/b", "/b", "/c", "/c", "/c"] {
            store.track_pageview(&pageview("s1", path, None)).await.unwrap();
        }

        let top = store.top_pages(2, TimeRange::unbounded()).await.unwrap();

        assert_eq!(
            top,
            vec![
                PathViews { path: "/c".to_string(), views: 3 },
                PathViews { path: "/b".to_string(), views: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn recent_sessions_newest_first() {
        let store = store().await;
        for id in ["s1", "s2", "s3"] {
            store.create_session(&session(id, "desktop", "Chrome"), Some(7)).await.unwrap();
        }

        let recent = store.recent_sessions(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|s| s.session_id.as_str()).collect();

        assert_eq!(ids, vec!["s3", "s2"]);
        assert_eq!(recent[0].user_id, Some(7));
    }

    #[tokio::test]
    async fn device_and_browser_counts_group_sessions() {
        let store = store().await;
        store.create_session(&session("s1", "desktop", "Chrome"), None).await.unwrap();
        store.create_session(&session("s2", "desktop", "Firefox"), None).await.unwrap();
        store.create_session(&session("s3", "mobile", "Chrome"), None).await.unwrap();

        let devices = store.device_counts(TimeRange::unbounded()).await.unwrap();
        let browsers = store.browser_counts(TimeRange::unbounded()).await.unwrap();

        assert_eq!(
            devices[0],
            DeviceCount { device: Some("desktop".to_string()), count: 2 }
        );
        assert_eq!(devices.len(), 2);
        assert_eq!(
            browsers[0],
            BrowserCount { browser: Some("Chrome".to_string()), count: 2 }
        );
    }

    #[tokio::test]
    async fn heatmap_filters_by_path_and_type() {
        let store = store().await;
        for (path, kind) in [("/", "click"), ("/", "move"), ("/about", "click")] {
            store
                .track_heatmap(&NewHeatmapPoint {
                    session_id: "s1".to_string(),
                    path: path.to_string(),
                    event_type: kind.to_string(),
                    x: Some(10),
                    y: Some(20),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let points = store.heatmap("/", "click").await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].x, Some(10));
        assert_eq!(points[0].scroll_depth, None);
    }

    #[tokio::test]
    async fn event_metadata_is_grouped() {
        let store = store().await;
        let meta = r#"{"seconds":30}"#;
        store.track_event(&event("s1", "time_milestone", Some(meta))).await.unwrap();
        store.track_event(&event("s2", "time_milestone", Some(meta))).await.unwrap();
        store.track_event(&event("s1", "click", None)).await.unwrap();

        let rows = store
            .event_metadata_counts("time_milestone", TimeRange::unbounded())
            .await
            .unwrap();

        assert_eq!(
            rows,
            vec![MetadataCount { metadata: Some(meta.to_string()), count: 2 }]
        );
        assert_eq!(
            store.count_events("click", TimeRange::unbounded()).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn durations_skip_missing_values() {
        let store = store().await;
        store.track_pageview(&pageview("s1", "/", Some(5))).await.unwrap();
        store.track_pageview(&pageview("s1", "/", None)).await.unwrap();
        store.track_pageview(&pageview("s1", "/", Some(400))).await.unwrap();

        let mut durations = store.pageview_durations(TimeRange::unbounded()).await.unwrap();
        durations.sort();

        assert_eq!(durations, vec![5, 400]);
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_writing() {
        let store = store().await;

        let result = store.create_session(&session("", "desktop", "Chrome"), None).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
        assert_eq!(store.count_sessions(TimeRange::unbounded()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unconfigured_database_is_unavailable() {
        let store = AnalyticsStore::new(Database::new(None));

        assert!(matches!(
            store.summary(TimeRange::unbounded()).await,
            Err(RepositoryError::Unavailable)
        ));
        assert!(matches!(
            store.create_session(&session("s1", "desktop", "Chrome"), None).await,
            Err(RepositoryError::Unavailable)
        ));
    }
}
