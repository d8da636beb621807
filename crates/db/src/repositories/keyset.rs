//! Keyset range filters shared by cursor-paginated queries.

use folio_common::Cursor;
use sea_orm::{ColumnTrait, Condition};

/// Rows strictly after `cursor` in `(ts_col DESC, id_col DESC)` order.
///
/// Expands to `ts_col < ts OR (ts_col = ts AND id_col < id)`, so rows that
/// share a timestamp with the cursor row are split by id and never repeated
/// or skipped across pages.
pub fn keyset_before<C: ColumnTrait>(ts_col: C, id_col: C, cursor: &Cursor) -> Condition {
    Condition::any().add(ts_col.lt(cursor.timestamp)).add(
        Condition::all()
            .add(ts_col.eq(cursor.timestamp))
            .add(id_col.lt(cursor.id.as_str())),
    )
}
