//! Read side: gym seed records for a scrape run.

use sqlx::PgPool;

use matfinder_core::types::GymSeed;

use crate::DbError;

/// A row from the `gyms` table, restricted to the seed fields the pipeline
/// reads.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GymSeedRow {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub borough: Option<String>,
}

impl From<GymSeedRow> for GymSeed {
    fn from(row: GymSeedRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            website: row.website,
            borough: row.borough,
        }
    }
}

/// Loads gym seeds in id order, optionally capped by `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_gym_seeds(pool: &PgPool, limit: Option<i64>) -> Result<Vec<GymSeed>, DbError> {
    let rows = match limit {
        Some(n) => {
            sqlx::query_as::<_, GymSeedRow>(
                "SELECT id, name, website, borough FROM gyms ORDER BY id LIMIT $1",
            )
            .bind(n)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, GymSeedRow>(
                "SELECT id, name, website, borough FROM gyms ORDER BY id",
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(GymSeed::from).collect())
}
