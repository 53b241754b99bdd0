//! Persistent environments backing the engine.
//!
//! An environment is one redb database file. The engine either keeps the
//! main and index tables in separate files (`Layout::Split`) or both in a
//! single file (`Layout::Shared`), where one write transaction covers both.

use std::fmt;
use std::path::{Path, PathBuf};

use redb::{Database, TableDefinition};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::{INDEX_TABLE, MAIN_TABLE};

/// How the main and index tables are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Two database files; `put` commits two independent transactions.
    Split,
    /// One database file; `put` commits both tables atomically.
    Shared,
}

/// One open database file with its tables created.
pub(crate) struct Environment {
    db: Database,
    path: PathBuf,
}

impl Environment {
    /// Open or create the database at `path` and make sure `tables` exist.
    ///
    /// Fails if the file ends up holding more than `max_tables` tables.
    pub(crate) fn open(
        path: &Path,
        tables: &[TableDefinition<'static, &'static [u8], &'static [u8]>],
        max_tables: usize,
    ) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::init(parent, e))?;
        }

        let db = Database::create(path).map_err(|e| StoreError::init(path, e))?;

        let txn = db.begin_write().map_err(|e| StoreError::init(path, e))?;
        for table in tables {
            txn.open_table(*table).map_err(|e| StoreError::init(path, e))?;
        }
        let table_count = txn
            .list_tables()
            .map_err(|e| StoreError::init(path, e))?
            .count();
        if table_count > max_tables {
            return Err(StoreError::init(
                path,
                format!("environment holds {table_count} tables, limit is {max_tables}"),
            ));
        }
        txn.commit().map_err(|e| StoreError::init(path, e))?;

        debug!(path = %path.display(), tables = table_count, "environment opened");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path)
            .finish()
    }
}

/// The environments an engine reads and writes.
#[derive(Debug)]
pub(crate) enum Environments {
    Split {
        main: Environment,
        index: Environment,
    },
    Shared(Environment),
}

impl Environments {
    pub(crate) fn open_split(
        store_path: &Path,
        index_path: &Path,
        max_tables: usize,
    ) -> StoreResult<Self> {
        let main = Environment::open(store_path, &[MAIN_TABLE], max_tables)?;
        let index = Environment::open(index_path, &[INDEX_TABLE], max_tables)?;
        Ok(Environments::Split { main, index })
    }

    pub(crate) fn open_shared(path: &Path, max_tables: usize) -> StoreResult<Self> {
        let env = Environment::open(path, &[MAIN_TABLE, INDEX_TABLE], max_tables)?;
        Ok(Environments::Shared(env))
    }

    /// Database holding the main table.
    pub(crate) fn main(&self) -> &Database {
        match self {
            Environments::Split { main, .. } => main.database(),
            Environments::Shared(env) => env.database(),
        }
    }

    /// Database holding the index table.
    pub(crate) fn index(&self) -> &Database {
        match self {
            Environments::Split { index, .. } => index.database(),
            Environments::Shared(env) => env.database(),
        }
    }

    pub(crate) fn layout(&self) -> Layout {
        match self {
            Environments::Split { .. } => Layout::Split,
            Environments::Shared(_) => Layout::Shared,
        }
    }

    pub(crate) fn paths(&self) -> (&Path, &Path) {
        match self {
            Environments::Split { main, index } => (main.path(), index.path()),
            Environments::Shared(env) => (env.path(), env.path()),
        }
    }
}
