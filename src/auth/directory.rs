use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// The identity handed out by the mock login.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = "Mohammad Farhadi")]
    pub name: String,
    #[schema(example = "K000001", nullable = true)]
    pub manager_id: Option<String>,
    #[schema(example = false)]
    pub is_manager: bool,
}

/// Employee directory backing the login stub. Lookups go through an
/// in-memory cache with a DB fallback; the directory is injected as app data
/// rather than living in a global.
#[derive(Clone)]
pub struct EmployeeDirectory {
    pool: MySqlPool,
    cache: Cache<String, DirectoryUser>,
}

const DIRECTORY_USER_SQL: &str =
    "SELECT employee_id, name, manager_id, is_manager FROM employees WHERE employee_id = ?";

impl EmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(3600))
            .build();
        Self { pool, cache }
    }

    /// Looks an employee up by id, cache first.
    pub async fn lookup(&self, employee_id: &str) -> Result<Option<DirectoryUser>> {
        if let Some(user) = self.cache.get(employee_id).await {
            return Ok(Some(user));
        }

        let user = sqlx::query_as::<_, DirectoryUser>(DIRECTORY_USER_SQL)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(user) = &user {
            self.cache
                .insert(user.employee_id.clone(), user.clone())
                .await;
        }

        Ok(user)
    }

    /// Streams the whole employee table into the cache at startup.
    pub async fn warmup(&self, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, DirectoryUser>(
            "SELECT employee_id, name, manager_id, is_manager FROM employees",
        )
        .fetch(&self.pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            let user: DirectoryUser = row?;
            batch.push(user);
            total_count += 1;

            if batch.len() >= batch_size {
                self.insert_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch).await;
        }

        log::info!("Employee directory warmup complete: {} users", total_count);

        Ok(())
    }

    async fn insert_batch(&self, users: &[DirectoryUser]) {
        let futures: Vec<_> = users
            .iter()
            .map(|u| self.cache.insert(u.employee_id.clone(), u.clone()))
            .collect();

        futures::future::join_all(futures).await;
    }
}
