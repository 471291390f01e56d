//! SQLite-backed implementation of the `PairSource` trait.
//!
//! Stores experiments, cells, pairs and dynamics in four tables with
//! indexes on the join columns. Supports both in-memory and file-backed
//! databases.

#![cfg(feature = "sqlite")]

use crate::dataset::DatasetFile;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use synmap_core::error::{Result, StoreError, SynmapError};
use synmap_core::source::{PairQuery, PairSource, StoreSummary};
use synmap_core::types::*;
use tracing::{debug, info};

const PAIR_SELECT: &str = r#"
    SELECT p.id, p.experiment_id, e.project_name, p.has_synapse,
           pre.id, pre.experiment_id, pre.cell_class, pre.cre_type, pre.target_layer,
           post.id, post.experiment_id, post.cell_class, post.cre_type, post.target_layer,
           d.pair_id, d.stp_initial_50hz, d.stp_induction_50hz,
           d.stp_recovery_250ms, d.paired_pulse_ratio_50hz
    FROM pairs p
    JOIN experiments e ON e.id = p.experiment_id
    JOIN cells pre ON pre.id = p.pre_cell_id
    JOIN cells post ON post.id = p.post_cell_id
    LEFT JOIN dynamics d ON d.pair_id = p.id
"#;

/// Counts written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub experiments: usize,
    pub cells: usize,
    pub pairs: usize,
    pub dynamics: usize,
}

/// SQLite-backed pair store.
pub struct SqlitePairStore {
    conn: Arc<Mutex<Connection>>,
}

fn backend(e: rusqlite::Error) -> SynmapError {
    SynmapError::backend(e)
}

impl SqlitePairStore {
    /// Create a new in-memory SQLite store.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::init_with_connection(conn)
    }

    /// Create or open a file-backed SQLite store, creating the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::init_with_connection(conn)
    }

    /// Open an existing dataset file for querying.
    ///
    /// Never creates the file or touches its schema and journal mode. A
    /// missing file is `DatasetNotFound`; a file without the pair tables
    /// is `InvalidDataset`.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::DatasetNotFound(path.display().to_string()).into());
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(backend)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").map_err(backend)?;

        let tables = Self::count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('experiments', 'cells', 'pairs', 'dynamics')",
        )?;
        if tables != 4 {
            return Err(SynmapError::invalid_dataset(format!(
                "{} is not a synmap dataset",
                path.display()
            )));
        }

        debug!(path = %path.display(), "opened existing dataset");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(backend)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS experiments (
                id INTEGER PRIMARY KEY,
                project_name TEXT NOT NULL,
                acq_timestamp REAL
            );

            CREATE TABLE IF NOT EXISTS cells (
                id INTEGER PRIMARY KEY,
                experiment_id INTEGER NOT NULL,
                cell_class TEXT,
                cre_type TEXT,
                target_layer TEXT,
                FOREIGN KEY (experiment_id) REFERENCES experiments(id)
            );

            CREATE TABLE IF NOT EXISTS pairs (
                id INTEGER PRIMARY KEY,
                experiment_id INTEGER NOT NULL,
                pre_cell_id INTEGER NOT NULL,
                post_cell_id INTEGER NOT NULL,
                has_synapse INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (experiment_id) REFERENCES experiments(id),
                FOREIGN KEY (pre_cell_id) REFERENCES cells(id),
                FOREIGN KEY (post_cell_id) REFERENCES cells(id)
            );

            CREATE TABLE IF NOT EXISTS dynamics (
                pair_id INTEGER PRIMARY KEY,
                stp_initial_50hz REAL,
                stp_induction_50hz REAL,
                stp_recovery_250ms REAL,
                paired_pulse_ratio_50hz REAL,
                FOREIGN KEY (pair_id) REFERENCES pairs(id)
            );

            CREATE INDEX IF NOT EXISTS idx_experiments_project ON experiments(project_name);
            CREATE INDEX IF NOT EXISTS idx_pairs_experiment ON pairs(experiment_id);
            CREATE INDEX IF NOT EXISTS idx_pairs_pre ON pairs(pre_cell_id);
            CREATE INDEX IF NOT EXISTS idx_pairs_post ON pairs(post_cell_id);
            "#,
        )
        .map_err(backend)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Leave WAL mode so the file is self-contained, then close it.
    pub(crate) fn close(self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA journal_mode=DELETE;")
            .map_err(backend)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SynmapError::backend("connection lock poisoned"))
    }

    /// Import a validated dataset in a single transaction.
    pub fn import(&self, dataset: &DatasetFile) -> Result<ImportStats> {
        self.import_with_progress(dataset, |_| {})
    }

    /// Import a dataset, calling `on_pair` after each pair is written.
    ///
    /// Nothing is written if validation or any insert fails.
    pub fn import_with_progress<F>(&self, dataset: &DatasetFile, mut on_pair: F) -> Result<ImportStats>
    where
        F: FnMut(usize),
    {
        dataset.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(backend)?;
        let mut stats = ImportStats::default();

        {
            let mut insert_expt = tx
                .prepare("INSERT INTO experiments (id, project_name, acq_timestamp) VALUES (?1, ?2, ?3)")
                .map_err(backend)?;
            for expt in &dataset.experiments {
                insert_expt
                    .execute(params![expt.id.0, expt.project_name, expt.acq_timestamp])
                    .map_err(backend)?;
                stats.experiments += 1;
            }

            let mut insert_cell = tx
                .prepare(
                    "INSERT INTO cells (id, experiment_id, cell_class, cre_type, target_layer)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(backend)?;
            for cell in &dataset.cells {
                insert_cell
                    .execute(params![
                        cell.id.0,
                        cell.experiment_id.0,
                        cell.cell_class.map(|c| c.as_str()),
                        cell.cre_type,
                        cell.target_layer,
                    ])
                    .map_err(backend)?;
                stats.cells += 1;
            }

            let experiment_of: std::collections::HashMap<CellId, ExperimentId> = dataset
                .cells
                .iter()
                .map(|c| (c.id, c.experiment_id))
                .collect();

            let mut insert_pair = tx
                .prepare(
                    "INSERT INTO pairs (id, experiment_id, pre_cell_id, post_cell_id, has_synapse)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(backend)?;
            let mut insert_dynamics = tx
                .prepare(
                    "INSERT INTO dynamics (pair_id, stp_initial_50hz, stp_induction_50hz,
                                           stp_recovery_250ms, paired_pulse_ratio_50hz)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(backend)?;
            for (i, pair) in dataset.pairs.iter().enumerate() {
                let experiment = experiment_of
                    .get(&pair.pre_cell)
                    .copied()
                    .ok_or_else(|| SynmapError::invalid_dataset(format!("{} is dangling", pair.id)))?;
                insert_pair
                    .execute(params![
                        pair.id.0,
                        experiment.0,
                        pair.pre_cell.0,
                        pair.post_cell.0,
                        pair.has_synapse,
                    ])
                    .map_err(backend)?;
                stats.pairs += 1;

                if let Some(d) = &pair.dynamics {
                    insert_dynamics
                        .execute(params![
                            pair.id.0,
                            d.stp_initial_50hz,
                            d.stp_induction_50hz,
                            d.stp_recovery_250ms,
                            d.paired_pulse_ratio_50hz,
                        ])
                        .map_err(backend)?;
                    stats.dynamics += 1;
                }
                on_pair(i + 1);
            }
        }

        tx.commit().map_err(backend)?;
        info!(
            dataset = %dataset.metadata.name,
            version = %dataset.metadata.version,
            pairs = stats.pairs,
            "imported dataset"
        );
        Ok(stats)
    }

    /// Look up a single pair by id.
    pub fn pair(&self, id: PairId) -> Result<Option<PairRecord>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE p.id = ?1", PAIR_SELECT);
        conn.query_row(&sql, params![id.0], read_pair)
            .optional()
            .map_err(backend)
    }

    fn count(conn: &Connection, sql: &str) -> Result<usize> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0)).map_err(backend)?;
        Ok(n as usize)
    }
}

impl PairSource for SqlitePairStore {
    fn query_pairs(&self, query: &PairQuery) -> Result<Vec<PairRecord>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if !query.projects.is_empty() {
            clauses.push(format!("e.project_name IN ({})", placeholders(query.projects.len())));
            values.extend(query.projects.iter().cloned().map(Value::Text));
        }
        if !query.experiments.is_empty() {
            clauses.push(format!("p.experiment_id IN ({})", placeholders(query.experiments.len())));
            values.extend(query.experiments.iter().map(|e| Value::Integer(e.0)));
        }
        if let Some(has_synapse) = query.has_synapse {
            clauses.push("p.has_synapse = ?".to_string());
            values.push(Value::Integer(has_synapse as i64));
        }
        if query.require_dynamics {
            clauses.push("d.pair_id IS NOT NULL".to_string());
        }

        let mut sql = PAIR_SELECT.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY p.id");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(backend)?;
        let pairs = stmt
            .query_map(params_from_iter(values), read_pair)
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;

        debug!(pairs = pairs.len(), filters = clauses.len(), "queried pairs");
        Ok(pairs)
    }

    fn summary(&self) -> Result<StoreSummary> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT project_name FROM experiments ORDER BY project_name")
            .map_err(backend)?;
        let projects = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;

        Ok(StoreSummary {
            experiments: Self::count(&conn, "SELECT COUNT(*) FROM experiments")?,
            cells: Self::count(&conn, "SELECT COUNT(*) FROM cells")?,
            pairs: Self::count(&conn, "SELECT COUNT(*) FROM pairs")?,
            synapses: Self::count(&conn, "SELECT COUNT(*) FROM pairs WHERE has_synapse = 1")?,
            with_dynamics: Self::count(&conn, "SELECT COUNT(*) FROM dynamics")?,
            projects,
        })
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn read_cell(row: &Row<'_>, offset: usize) -> rusqlite::Result<Cell> {
    let class: Option<String> = row.get(offset + 2)?;
    Ok(Cell {
        id: CellId(row.get(offset)?),
        experiment_id: ExperimentId(row.get(offset + 1)?),
        cell_class: class.as_deref().and_then(CellCategory::from_code),
        cre_type: row.get(offset + 3)?,
        target_layer: row.get(offset + 4)?,
    })
}

fn read_pair(row: &Row<'_>) -> rusqlite::Result<PairRecord> {
    let dynamics_id: Option<i64> = row.get(14)?;
    let dynamics = match dynamics_id {
        Some(_) => Some(Dynamics {
            stp_initial_50hz: row.get(15)?,
            stp_induction_50hz: row.get(16)?,
            stp_recovery_250ms: row.get(17)?,
            paired_pulse_ratio_50hz: row.get(18)?,
        }),
        None => None,
    };
    Ok(PairRecord {
        id: PairId(row.get(0)?),
        experiment_id: ExperimentId(row.get(1)?),
        project_name: row.get(2)?,
        has_synapse: row.get(3)?,
        pre: read_cell(row, 4)?,
        post: read_cell(row, 9)?,
        dynamics,
    })
}
