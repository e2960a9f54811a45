use crate::postgres::DEFAULT_TIMEOUT;
use crate::{FileStore, MemoryStore, PostgresStore};
use burrow_core::storage::Result;
use burrow_core::Storage;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use typed_builder::TypedBuilder;

/// Which backend a process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    File,
    Memory,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Postgres => write!(f, "postgres"),
            BackendKind::File => write!(f, "file"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

/// Storage related configuration. Empty values count as unset.
#[derive(Debug, Clone, TypedBuilder)]
pub struct StorageSettings {
    #[builder(default)]
    pub database_dsn: Option<String>,
    #[builder(default)]
    pub file_path: Option<PathBuf>,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub database_timeout: Duration,
}

impl StorageSettings {
    /// Database DSN first, then file path, then memory.
    pub fn backend_kind(&self) -> BackendKind {
        if self.dsn().is_some() {
            BackendKind::Postgres
        } else if self.path().is_some() {
            BackendKind::File
        } else {
            BackendKind::Memory
        }
    }

    fn dsn(&self) -> Option<&str> {
        self.database_dsn.as_deref().filter(|dsn| !dsn.is_empty())
    }

    fn path(&self) -> Option<&PathBuf> {
        self.file_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

/// Constructs the backend selected by `settings`.
///
/// For PostgreSQL this connects and runs the schema migrations; any failure
/// is returned and the caller is expected to abort startup.
pub async fn open_storage(settings: &StorageSettings) -> Result<Arc<dyn Storage>> {
    let kind = settings.backend_kind();

    let storage: Arc<dyn Storage> = match (kind, settings.dsn(), settings.path()) {
        (BackendKind::Postgres, Some(dsn), _) => {
            Arc::new(PostgresStore::connect(dsn, settings.database_timeout).await?)
        }
        (BackendKind::File, _, Some(path)) => Arc::new(FileStore::open(path.clone()).await?),
        _ => Arc::new(MemoryStore::new()),
    };

    info!(backend = %kind, "storage backend selected");
    Ok(storage)
}
