use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::utils::email_filter::{CoachEmailFilter, normalize};

pub static COACH_EMAIL_CACHE: Lazy<CoachEmailCache> = Lazy::new(CoachEmailCache::new);

/// Normalized email => id of the coach row that carries it.
pub struct CoachEmailCache {
    owners: Cache<String, u64>,
}

/// What the in-memory index knows about an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOwner {
    /// No coach row carries the email.
    Free,
    Coach(u64),
    /// Only the database can tell.
    Unknown,
}

impl CoachEmailCache {
    pub fn new() -> Self {
        Self {
            owners: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(Duration::from_secs(3600))
                .build(),
        }
    }

    pub async fn remember(&self, email: &str, coach_id: u64) {
        let email = normalize(email);
        if !email.is_empty() {
            self.owners.insert(email, coach_id).await;
        }
    }

    pub async fn forget(&self, email: &str) {
        self.owners.invalidate(&normalize(email)).await;
    }

    pub async fn owner(&self, email: &str) -> Option<u64> {
        self.owners.get(&normalize(email)).await
    }

    async fn remember_batch(&self, rows: &[(u64, String)]) {
        let inserts: Vec<_> = rows
            .iter()
            .map(|(id, email)| self.remember(email, *id))
            .collect();

        futures::future::join_all(inserts).await;
    }
}

impl Default for CoachEmailCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter miss first, then cache hit; anything else needs the database.
pub async fn lookup(filter: &CoachEmailFilter, cache: &CoachEmailCache, email: &str) -> EmailOwner {
    if !filter.might_contain(email) {
        return EmailOwner::Free;
    }
    match cache.owner(email).await {
        Some(id) => EmailOwner::Coach(id),
        None => EmailOwner::Unknown,
    }
}

/// Reloads both indexes from `coaches.email`, streaming in batches.
pub async fn refresh_coach_email_index(
    pool: &MySqlPool,
    filter: &CoachEmailFilter,
    cache: &CoachEmailCache,
    batch_size: usize,
) -> Result<usize> {
    let mut stream = sqlx::query_as::<_, (u64, String)>(
        r#"
        SELECT id, email
        FROM coaches
        WHERE email IS NOT NULL AND TRIM(email) <> ''
        ORDER BY id
        "#,
    )
    .fetch(pool);

    let mut emails = Vec::new();
    let mut batch = Vec::with_capacity(batch_size);

    cache.owners.invalidate_all();

    while let Some(row) = stream.next().await {
        let (id, email) = row?;
        emails.push(email.clone());
        batch.push((id, email));

        if batch.len() >= batch_size {
            cache.remember_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        cache.remember_batch(&batch).await;
    }

    let total = filter.rebuild(emails)?;
    log::info!("Coach email index refreshed: {} emails", total);

    Ok(total)
}
