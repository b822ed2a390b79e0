//! Catalog bulk-update document
//!
//! The repository ships its catalog as a JSON array with one element per
//! table. Row values arrive pre-rendered as SQL tuple literals, e.g.
//! `(1,'mesh','alice'),(2,'solver','bob')`.

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};

/// Full catalog update, one entry per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BulkUpdate(pub Vec<TableUpdate>);

/// Rows for a single table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableUpdate {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: String,
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl BulkUpdate {
    /// Parse the JSON document returned by the repository
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn tables(&self) -> &[TableUpdate] {
        &self.0
    }
}

impl TableUpdate {
    /// Whether there is anything to write
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.values.trim().is_empty()
    }

    /// Name of the `ID` column, matched case-insensitively
    fn id_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .find(|c| c.eq_ignore_ascii_case("id"))
    }

    /// SQL that brings the table in line with this update.
    ///
    /// Tables keyed by `ID` are upserted so rows missing from the update
    /// survive; other tables (join tables) are emptied and refilled.
    pub fn to_sql(&self) -> Result<String> {
        if self.name.trim().is_empty() {
            return Err(CacheError::InvalidUpdate {
                table: self.name.clone(),
                reason: "table name is empty".to_string(),
            });
        }

        let table = quote_ident(&self.name);
        let columns = self
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            columns,
            self.values.trim()
        );

        let sql = match self.id_column() {
            Some(id) => {
                let updates = self
                    .columns
                    .iter()
                    .filter(|c| c.as_str() != id)
                    .map(|c| format!("{0} = excluded.{0}", quote_ident(c)))
                    .collect::<Vec<_>>();
                if updates.is_empty() {
                    format!("{} ON CONFLICT({}) DO NOTHING;", insert, quote_ident(id))
                } else {
                    format!(
                        "{} ON CONFLICT({}) DO UPDATE SET {};",
                        insert,
                        quote_ident(id),
                        updates.join(", ")
                    )
                }
            }
            None => format!("DELETE FROM {};\n{};", table, insert),
        };

        Ok(sql)
    }
}
