//! Soft-delete capability. Every entity implements this explicitly rather
//! than inheriting default-query behavior; read paths exclude marked rows
//! unless the caller opts in.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Select,
};
use uuid::Uuid;

pub trait SoftDeletable: EntityTrait {
    fn id_column() -> Self::Column;
    fn deleted_at_column() -> Self::Column;

    /// Select excluding soft-deleted rows. The default for every read path.
    fn find_active() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_null())
    }

    fn find_scoped(include_deleted: bool) -> Select<Self> {
        if include_deleted {
            Self::find()
        } else {
            Self::find_active()
        }
    }

    fn find_by_id_scoped(id: Uuid, include_deleted: bool) -> Select<Self> {
        Self::find_scoped(include_deleted).filter(Self::id_column().eq(id))
    }
}

/// Marks a row deleted. Returns false when the row is missing or already
/// marked. Never removes the row.
pub async fn soft_delete_by_id<E, C>(db: &C, id: Uuid) -> Result<bool, DbErr>
where
    E: SoftDeletable,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(
            E::deleted_at_column(),
            Expr::value(Some(Utc::now())),
        )
        .filter(E::id_column().eq(id))
        .filter(E::deleted_at_column().is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Clears the deletion marker. A no-op on an active row; returns false
/// only when no row with the id exists at all.
pub async fn restore_by_id<E, C>(db: &C, id: Uuid) -> Result<bool, DbErr>
where
    E: SoftDeletable,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(
            E::deleted_at_column(),
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .filter(E::id_column().eq(id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

pub async fn exists_active<E, C>(db: &C, id: Uuid) -> Result<bool, DbErr>
where
    E: SoftDeletable,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let count = E::find_by_id_scoped(id, false).count(db).await?;
    Ok(count > 0)
}
