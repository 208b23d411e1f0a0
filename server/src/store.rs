use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use frontlines_shared::{CampaignTables, MatchResult, TableKind};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to access {table} table at {}: {source}", path.display())]
    Io {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{table} table is not a valid JSON row array: {source}")]
    Parse {
        table: TableKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize {table} table: {source}")]
    Serialize {
        table: TableKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Modification time and length of every table file, `None` for a missing file. Any edit,
/// creation or deletion of a table changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRevision(Vec<(TableKind, Option<(SystemTime, u64)>)>);

impl TableRevision {
    /// True when no table file exists.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, state)| state.is_none())
    }
}

/// Campaign tables kept as JSON row arrays, one file per table, in a single directory.
///
/// A missing file reads as an empty table. Appends go through a temp file and a rename so a
/// reader never sees half a results log.
#[derive(Debug)]
pub struct TableStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, table: TableKind) -> PathBuf {
        self.dir.join(table.file_name())
    }

    /// One bulk read of every table.
    pub async fn load(&self) -> Result<CampaignTables, TableError> {
        Ok(CampaignTables {
            roster: self.read_rows(TableKind::Roster).await?,
            pois: self.read_rows(TableKind::Pois).await?,
            starting_territories: self.read_rows(TableKind::StartingTerritories).await?,
            results: self.read_rows(TableKind::Results).await?,
        })
    }

    async fn read_rows<T: DeserializeOwned>(&self, table: TableKind) -> Result<Vec<T>, TableError> {
        let path = self.path_of(table);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(TableError::Io { table, path, source }),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| TableError::Parse { table, source })
    }

    async fn write_rows<T: serde::Serialize>(
        &self,
        table: TableKind,
        rows: &[T],
    ) -> Result<(), TableError> {
        let path = self.path_of(table);
        let json = serde_json::to_vec_pretty(rows)
            .map_err(|source| TableError::Serialize { table, source })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| TableError::Io {
                table,
                path: self.dir.clone(),
                source,
            })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| TableError::Io {
                table,
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| TableError::Io { table, path, source })
    }

    /// Append one result to the end of the log. Returns the new log length.
    pub async fn append_result(&self, result: &MatchResult) -> Result<usize, TableError> {
        let _guard = self.write_lock.lock().await;
        let mut results: Vec<MatchResult> = self.read_rows(TableKind::Results).await?;
        results.push(result.clone());
        self.write_rows(TableKind::Results, &results).await?;
        Ok(results.len())
    }

    pub async fn revision(&self) -> TableRevision {
        let mut files = Vec::with_capacity(TableKind::ALL.len());
        for table in TableKind::ALL {
            let state = match tokio::fs::metadata(self.path_of(table)).await {
                Ok(meta) => meta.modified().ok().map(|modified| (modified, meta.len())),
                Err(_) => None,
            };
            files.push((table, state));
        }
        TableRevision(files)
    }
}

#[cfg(test)]
mod tests {
    use frontlines_shared::{MapAffiliation, MatchResult, Outcome, TableKind};

    use super::{TableError, TableStore};

    #[tokio::test]
    async fn missing_and_blank_files_are_empty_tables() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("pois.json"), "  \n").expect("write blank pois");
        let store = TableStore::new(dir.path());

        let tables = store.load().await.expect("load empty tables");
        assert!(tables.roster.is_empty());
        assert!(tables.pois.is_empty());
        assert!(tables.results.is_empty());
        assert!(!store.revision().await.is_empty());
    }

    #[tokio::test]
    async fn deleting_an_older_table_changes_the_revision() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("roster.json"), "[]").expect("write roster");
        std::fs::write(dir.path().join("results.json"), "[]").expect("write results");
        let store = TableStore::new(dir.path());

        let before = store.revision().await;
        assert_eq!(store.revision().await, before);

        std::fs::remove_file(dir.path().join("roster.json")).expect("delete roster");
        let after = store.revision().await;
        assert_ne!(after, before);
        assert!(!after.is_empty());
    }

    #[tokio::test]
    async fn rows_with_missing_fields_still_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("roster.json"),
            r##"[{"name":"Alice","color":"#FF0000","maps":"Both"},{"color":"#00FF00"}]"##,
        )
        .expect("write roster");
        let store = TableStore::new(dir.path());

        let tables = store.load().await.expect("load roster");
        assert_eq!(tables.roster.len(), 2);
        assert_eq!(tables.roster[0].maps, MapAffiliation::Both);
        assert_eq!(tables.roster[1].name, "");
        assert_eq!(tables.player_directory().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("results.json"), "{not json").expect("write results");
        let store = TableStore::new(dir.path());

        match store.load().await {
            Err(TableError::Parse { table, .. }) => assert_eq!(table, TableKind::Results),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_preserves_order_and_extra_columns() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = TableStore::new(dir.path().join("nested"));
        assert!(store.revision().await.is_empty());

        let mut first = MatchResult {
            date: "2025-03-01".into(),
            player1: "Alice".into(),
            player2: "Bob".into(),
            outcome: Outcome::Player1Win,
            map: "TGA".into(),
            claimed_territory: Some("B2".into()),
            ..MatchResult::default()
        };
        first
            .extra
            .insert("mission".into(), serde_json::json!("Hold the line"));
        let second = MatchResult {
            outcome: Outcome::Draw,
            ..first.clone()
        };

        assert_eq!(store.append_result(&first).await.expect("append first"), 1);
        assert_eq!(store.append_result(&second).await.expect("append second"), 2);

        let tables = store.load().await.expect("reload");
        assert_eq!(tables.results, vec![first, second]);
        assert_eq!(tables.results[0].extra["mission"], "Hold the line");
        assert!(!store.revision().await.is_empty());
    }
}
