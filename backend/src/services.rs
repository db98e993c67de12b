use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shoe_ledger::stat::{LedgerError, RunLogEntry, Shoe, ShoeDraft, ShoePatch};
use sqlx::{FromRow, PgPool, types::Json as DbJson};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

const SHOE_COLUMNS: &str =
    "id, brand, model, color, first_run_date, expected_lifecycle, miles, logs, created_at";

pub async fn list_shoes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ShoeDto>>, AppError> {
    let rows = list_shoes_db(&state.pool, user.user_id).await?;
    Ok(Json(rows.into_iter().map(ShoeDto::from).collect()))
}

pub async fn create_shoe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(shoe): Json<Shoe>,
) -> Result<(StatusCode, Json<ShoeDto>), AppError> {
    let shoe = new_shoe_record(shoe)?;
    let row = insert_shoe_db(&state.pool, user.user_id, &shoe).await?;
    info!(user_id = %user.user_id, shoe_id = %row.id, "created shoe");
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn patch_shoe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ShoePatch>,
) -> Result<Json<ShoeDto>, AppError> {
    let row = get_shoe_db(&state.pool, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("shoe"))?;

    let patched = apply_patch(row.into_shoe(), &patch).inspect_err(|e| {
        warn!(shoe_id = %id, error = %e, "rejected patch");
    })?;
    let row = update_shoe_db(&state.pool, user.user_id, id, &patched)
        .await?
        .ok_or(AppError::NotFound("shoe"))?;
    info!(shoe_id = %id, miles = row.miles, "patched shoe");
    Ok(Json(row.into()))
}

pub async fn delete_shoe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM shoes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("shoe"));
    }
    info!(shoe_id = %id, "deleted shoe");
    Ok(StatusCode::NO_CONTENT)
}

/// Rebuilds an incoming shoe through the ledger's own creation rule: named,
/// a positive lifecycle, and no miles or runs yet.
pub fn new_shoe_record(shoe: Shoe) -> Result<Shoe, AppError> {
    let expected_lifecycle = shoe
        .expected_lifecycle
        .ok_or_else(|| LedgerError::InvalidInput("expected lifecycle is required".into()))?;
    if !shoe.logs.is_empty() || shoe.miles != 0.0 {
        return Err(LedgerError::InvalidInput("a new shoe starts with no runs and 0 miles".into()).into());
    }
    Ok(Shoe::new(ShoeDraft {
        brand: shoe.brand,
        model: shoe.model,
        color: shoe.color,
        first_run_date: shoe.first_run_date,
        expected_lifecycle,
    })?)
}

/// Applies `patch` to a stored shoe and validates the resulting document.
pub fn apply_patch(mut shoe: Shoe, patch: &ShoePatch) -> Result<Shoe, AppError> {
    if let Some(miles) = patch.miles {
        shoe.miles = miles;
    }
    if let Some(logs) = &patch.logs {
        shoe.logs = logs.clone();
    }
    shoe.check_record()?;
    Ok(shoe)
}

pub async fn list_shoes_db(pool: &PgPool, user_id: Uuid) -> Result<Vec<ShoeRow>, sqlx::Error> {
    let sql = format!("SELECT {SHOE_COLUMNS} FROM shoes WHERE user_id = $1 ORDER BY created_at, id");
    let rows = sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_shoe_db(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ShoeRow>, sqlx::Error> {
    let sql = format!("SELECT {SHOE_COLUMNS} FROM shoes WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn insert_shoe_db(pool: &PgPool, user_id: Uuid, shoe: &Shoe) -> Result<ShoeRow, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO shoes (id, user_id, brand, model, color, first_run_date, expected_lifecycle, miles, logs)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {SHOE_COLUMNS}
        "#
    );
    let row = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(shoe.brand.trim())
        .bind(shoe.model.trim())
        .bind(shoe.color.trim())
        .bind(shoe.first_run_date)
        .bind(shoe.expected_lifecycle)
        .bind(shoe.miles)
        .bind(DbJson(&shoe.logs))
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn update_shoe_db(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    shoe: &Shoe,
) -> Result<Option<ShoeRow>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE shoes SET miles = $3, logs = $4
        WHERE id = $1 AND user_id = $2
        RETURNING {SHOE_COLUMNS}
        "#
    );
    let row = sqlx::query_as(&sql)
        .bind(id)
        .bind(user_id)
        .bind(shoe.miles)
        .bind(DbJson(&shoe.logs))
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

#[derive(Debug, FromRow)]
pub struct ShoeRow {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub first_run_date: NaiveDate,
    pub expected_lifecycle: Option<f64>,
    pub miles: f64,
    pub logs: DbJson<Vec<RunLogEntry>>,
    pub created_at: DateTime<Utc>,
}

impl ShoeRow {
    pub fn into_shoe(self) -> Shoe {
        Shoe {
            id: Some(self.id),
            brand: self.brand,
            model: self.model,
            color: self.color,
            first_run_date: self.first_run_date,
            expected_lifecycle: self.expected_lifecycle,
            miles: self.miles,
            logs: self.logs.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShoeDto {
    #[serde(flatten)]
    pub shoe: Shoe,
    pub created_at: DateTime<Utc>,
}

impl From<ShoeRow> for ShoeDto {
    fn from(row: ShoeRow) -> Self {
        let created_at = row.created_at;
        Self {
            shoe: row.into_shoe(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn stored() -> Shoe {
        Shoe {
            id: Some(Uuid::new_v4()),
            brand: "Brooks".into(),
            model: "Ghost 15".into(),
            color: "black".into(),
            first_run_date: day(1),
            expected_lifecycle: Some(450.0),
            miles: 5.0,
            logs: vec![RunLogEntry::new(5.0, day(2))],
        }
    }

    #[test]
    fn consistent_patch_is_applied() {
        let logs = vec![RunLogEntry::new(5.0, day(2)), RunLogEntry::new(7.5, day(3)).in_zone(2.0)];
        let patch = ShoePatch {
            miles: Some(12.5),
            logs: Some(logs.clone()),
        };
        let shoe = apply_patch(stored(), &patch).unwrap();
        assert_eq!(shoe.miles, 12.5);
        assert_eq!(shoe.logs, logs);
        assert_eq!(shoe.brand, "Brooks");
    }

    #[test]
    fn drifting_patch_is_a_bad_request() {
        let patch = ShoePatch {
            miles: Some(40.0),
            logs: None,
        };
        let err = apply_patch(stored(), &patch).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let patch = ShoePatch {
            miles: Some(0.0),
            logs: Some(vec![RunLogEntry::new(-1.0, day(2))]),
        };
        assert!(apply_patch(stored(), &patch).is_err());
    }

    fn fresh() -> Shoe {
        Shoe {
            id: None,
            miles: 0.0,
            logs: Vec::new(),
            ..stored()
        }
    }

    #[test]
    fn new_shoes_need_names() {
        let created = new_shoe_record(Shoe {
            brand: " Brooks ".into(),
            ..fresh()
        })
        .unwrap();
        assert_eq!(created.brand, "Brooks");
        assert_eq!(created.expected_lifecycle, Some(450.0));

        let blank = Shoe {
            model: "  ".into(),
            ..fresh()
        };
        assert_eq!(new_shoe_record(blank).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn new_shoes_need_a_positive_lifecycle() {
        for lifecycle in [None, Some(0.0), Some(-50.0), Some(f64::NAN)] {
            let shoe = Shoe {
                expected_lifecycle: lifecycle,
                ..fresh()
            };
            let err = new_shoe_record(shoe).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{lifecycle:?}");
        }
    }

    #[test]
    fn new_shoes_start_without_mileage() {
        // consistent with its log, but not a new shoe
        let worn = Shoe {
            expected_lifecycle: Some(400.0),
            miles: 900.0,
            logs: vec![RunLogEntry::new(900.0, day(2))],
            ..fresh()
        };
        assert!(worn.check_record().is_ok());
        assert_eq!(new_shoe_record(worn).unwrap_err().status(), StatusCode::BAD_REQUEST);

        let drifted = Shoe {
            miles: 3.0,
            ..fresh()
        };
        assert!(new_shoe_record(drifted).is_err());
    }

    #[test]
    fn dto_flattens_the_shoe() {
        let shoe = stored();
        let dto = ShoeDto {
            shoe: shoe.clone(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["brand"], "Brooks");
        assert_eq!(json["miles"], 5.0);
        assert!(json["created_at"].is_string());
        assert_eq!(json["id"], shoe.id.unwrap().to_string());
    }
}
