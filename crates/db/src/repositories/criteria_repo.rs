//! Repository for the `eligibility_criteria` table.

use sqlx::PgPool;

use crewgate_core::types::DbId;

use crate::models::criteria::{
    CreateCriteria, CriteriaSummary, EligibilityCriteria, UpdateCriteria,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, is_active, root_group, created_at, updated_at";

/// Result of an update attempt against a specific row.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(EligibilityCriteria),
    /// No row with the given id.
    NotFound,
    /// The row exists but `expected_updated_at` no longer matches: another
    /// writer got there first.
    Conflict,
}

/// Provides CRUD operations for eligibility criteria documents.
pub struct CriteriaRepo;

impl CriteriaRepo {
    /// List all criteria as summaries, ordered by name.
    ///
    /// `rule_count` is computed from each stored tree so the count always
    /// reflects the document actually persisted.
    pub async fn list(pool: &PgPool) -> Result<Vec<CriteriaSummary>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM eligibility_criteria ORDER BY name");
        let rows = sqlx::query_as::<_, EligibilityCriteria>(&query)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                row.to_summary().map_err(|err| {
                    tracing::error!(id = row.id, error = %err, "Stored rule tree failed to decode");
                    sqlx::Error::Decode(Box::new(err))
                })
            })
            .collect()
    }

    /// Fetch a single criteria document.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<EligibilityCriteria>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM eligibility_criteria WHERE id = $1");
        sqlx::query_as::<_, EligibilityCriteria>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new criteria document. The server assigns id and
    /// timestamps. Callers validate the tree before persisting.
    pub async fn create(
        pool: &PgPool,
        body: &CreateCriteria,
    ) -> Result<EligibilityCriteria, sqlx::Error> {
        let root_group = serde_json::to_value(&body.root_group)
            .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;

        let query = format!(
            "INSERT INTO eligibility_criteria (name, description, root_group)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EligibilityCriteria>(&query)
            .bind(&body.name)
            .bind(&body.description)
            .bind(root_group)
            .fetch_one(pool)
            .await
    }

    /// Patch an existing criteria document; omitted fields keep their
    /// stored values.
    ///
    /// Updates are last-writer-wins unless the caller supplies
    /// `expected_updated_at`, in which case a stale timestamp yields
    /// [`UpdateOutcome::Conflict`] and the row is left untouched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        body: &UpdateCriteria,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let root_group = body
            .root_group
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;

        let query = format!(
            "UPDATE eligibility_criteria SET
                name        = COALESCE($1, name),
                description = COALESCE($2, description),
                is_active   = COALESCE($3, is_active),
                root_group  = COALESCE($4, root_group),
                updated_at  = NOW()
             WHERE id = $5
               AND ($6::timestamptz IS NULL OR updated_at = $6)
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, EligibilityCriteria>(&query)
            .bind(&body.name)
            .bind(&body.description)
            .bind(body.is_active)
            .bind(root_group)
            .bind(id)
            .bind(body.expected_updated_at)
            .fetch_optional(pool)
            .await?;

        if let Some(row) = updated {
            return Ok(UpdateOutcome::Updated(row));
        }

        // Distinguish a missing row from a guarded write that lost the race.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM eligibility_criteria WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        if exists {
            Ok(UpdateOutcome::Conflict)
        } else {
            Ok(UpdateOutcome::NotFound)
        }
    }

    /// Delete a criteria document. Returns `false` when no row matched.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM eligibility_criteria WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
