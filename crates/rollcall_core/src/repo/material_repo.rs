//! Classroom material storage.
//!
//! The stored `kind` is the classification made at ingestion; reads never
//! re-classify.

use super::{RepoError, RepoResult};
use crate::model::material::{Material, MaterialKind};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

/// Material store contract.
pub trait MaterialRepository {
    fn add_material(&self, classroom_id: &str, material: &Material) -> RepoResult<()>;
    fn list_materials(
        &self,
        classroom_id: &str,
        kind: Option<MaterialKind>,
    ) -> RepoResult<Vec<Material>>;
}

/// SQLite-backed material store.
pub struct SqliteMaterialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMaterialRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MaterialRepository for SqliteMaterialRepository<'_> {
    fn add_material(&self, classroom_id: &str, material: &Material) -> RepoResult<()> {
        if material.title.trim().is_empty() {
            return Err(RepoError::Validation("material title must not be empty".to_string()));
        }
        let inserted = self.conn.execute(
            "INSERT INTO materials (id, classroom_id, title, url, file_name, kind)
             SELECT ?1, id, ?3, ?4, ?5, ?6 FROM classrooms WHERE id = ?2;",
            params![
                material.id.to_string(),
                classroom_id,
                material.title.as_str(),
                material.url.as_deref(),
                material.file_name.as_deref(),
                material.kind.as_str(),
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::not_found("classroom", classroom_id));
        }
        Ok(())
    }

    fn list_materials(
        &self,
        classroom_id: &str,
        kind: Option<MaterialKind>,
    ) -> RepoResult<Vec<Material>> {
        let mut sql = "SELECT id, title, url, file_name, kind
             FROM materials
             WHERE classroom_id = ?"
            .to_string();
        let mut bind_values = vec![Value::Text(classroom_id.to_string())];
        if let Some(kind) = kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut materials = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            let id = Uuid::parse_str(&id_text).map_err(|_| {
                RepoError::InvalidData(format!("invalid uuid `{id_text}` in materials.id"))
            })?;
            let kind_text: String = row.get(4)?;
            let kind = parse_kind(&kind_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid kind `{kind_text}` in materials.kind"))
            })?;
            materials.push(Material {
                id,
                title: row.get(1)?,
                url: row.get(2)?,
                file_name: row.get(3)?,
                kind,
            });
        }
        Ok(materials)
    }
}

fn parse_kind(value: &str) -> Option<MaterialKind> {
    match value {
        "file" => Some(MaterialKind::File),
        "link" => Some(MaterialKind::Link),
        "video" => Some(MaterialKind::Video),
        _ => None,
    }
}
