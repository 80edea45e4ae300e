use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use quiz_core::model::{QuestionRecord, Subject};

use crate::content::QuestionSource;
use crate::error::QuestionBankError;

type Pool = Arc<[QuestionRecord]>;
type PoolCell = Arc<OnceCell<Pool>>;

/// Lazily materialised question pools, one per (subject, level).
///
/// The map lock is only held to look up or insert a cell. Generation runs
/// under the cell, so concurrent callers for the same key share one call to
/// the source while other keys proceed independently. A failed generation
/// leaves the cell empty and the next caller retries.
pub struct QuestionBank {
    source: Arc<dyn QuestionSource>,
    pools: Mutex<HashMap<(Subject, u32), PoolCell>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self {
            source,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// The pool for `(subject, level)`, generating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Source` if the source fails.
    pub async fn pool(&self, subject: Subject, level: u32) -> Result<Pool, QuestionBankError> {
        let cell = {
            let mut pools = self.pools.lock().await;
            Arc::clone(pools.entry((subject, level)).or_default())
        };

        let pool = cell
            .get_or_try_init(|| async {
                let records = self
                    .source
                    .generate(subject, level)
                    .await
                    .map_err(|source| QuestionBankError::Source {
                        subject,
                        level,
                        source,
                    })?;
                debug!(%subject, level, size = records.len(), "materialised question pool");
                Ok::<Pool, QuestionBankError>(Pool::from(records))
            })
            .await?;

        Ok(Arc::clone(pool))
    }

    pub async fn is_materialised(&self, subject: Subject, level: u32) -> bool {
        let pools = self.pools.lock().await;
        pools
            .get(&(subject, level))
            .is_some_and(|cell| cell.initialized())
    }

    /// Drop every cached pool; the next request regenerates.
    pub async fn clear(&self) {
        self.pools.lock().await.clear();
    }
}

impl std::fmt::Debug for QuestionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBank").finish_non_exhaustive()
    }
}
