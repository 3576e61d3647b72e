//! In-memory record store.
//!
//! Behaves like the hosted backend for the operations the domains use:
//! server-assigned ids, equality filters, ordering and upsert by key. Every
//! write is recorded in an operation log, and failures can be injected per
//! table and operation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{row_id, Filter, OrderBy, RecordStore, Row, StoreError};
use crate::types::{EntityId, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
    Upsert,
}

/// A write as seen by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOp {
    pub kind: WriteKind,
    pub table: Table,
    pub id: Option<EntityId>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, Vec<Row>>,
    writes: Vec<WriteOp>,
    failures: HashMap<(Table, WriteKind), StoreError>,
    next_id: u64,
}

impl Inner {
    fn assign_id(&mut self, table: Table) -> EntityId {
        self.next_id += 1;
        EntityId::new(format!("{}-{}", table.as_str(), self.next_id))
    }

    fn check_failure(&self, table: Table, kind: WriteKind) -> Result<(), StoreError> {
        match self.failures.get(&(table, kind)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Row> {
        self.tables.entry(table).or_default()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rows as-is, assigning ids to rows that lack one. Seeding is not
    /// recorded as a write.
    pub async fn seed(&self, table: Table, rows: Vec<Row>) -> Vec<EntityId> {
        let mut inner = self.inner.write().await;
        let mut ids = Vec::with_capacity(rows.len());
        for mut row in rows {
            let id = match row_id(&row) {
                Some(id) => id,
                None => {
                    let id = inner.assign_id(table);
                    row.insert("id".to_string(), Value::String(id.to_string()));
                    id
                }
            };
            inner.rows_mut(table).push(row);
            ids.push(id);
        }
        ids
    }

    /// Make every subsequent `kind` write to `table` fail with `error`.
    pub async fn fail_on(&self, table: Table, kind: WriteKind, error: StoreError) {
        self.inner.write().await.failures.insert((table, kind), error);
    }

    pub async fn clear_failures(&self) {
        self.inner.write().await.failures.clear();
    }

    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.inner.read().await.tables.get(&table).cloned().unwrap_or_default()
    }

    pub async fn writes(&self) -> Vec<WriteOp> {
        self.inner.read().await.writes.clone()
    }

    pub async fn write_count(&self, table: Table, kind: WriteKind) -> usize {
        self.inner
            .read()
            .await
            .writes
            .iter()
            .filter(|w| w.table == table && w.kind == kind)
            .count()
    }

    pub async fn writes_to(&self, table: Table) -> usize {
        self.inner.read().await.writes.iter().filter(|w| w.table == table).count()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| filter.matches(r)).cloned()))
    }

    async fn list(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Row> = inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_failure(table, WriteKind::Insert)?;

        let id = match row_id(&row) {
            Some(id) => id,
            None => inner.assign_id(table),
        };
        row.insert("id".to_string(), Value::String(id.to_string()));
        inner.rows_mut(table).push(row.clone());
        inner.writes.push(WriteOp { kind: WriteKind::Insert, table, id: Some(id) });
        Ok(row)
    }

    async fn update(&self, table: Table, id: &EntityId, patch: Row) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_failure(table, WriteKind::Update)?;

        let filter = Filter::by_id(id);
        let row = inner
            .rows_mut(table)
            .iter_mut()
            .find(|r| filter.matches(r))
            .ok_or(StoreError::NotFound { table })?;
        for (key, value) in patch {
            if key != "id" {
                row.insert(key, value);
            }
        }
        inner.writes.push(WriteOp { kind: WriteKind::Update, table, id: Some(id.clone()) });
        Ok(())
    }

    async fn delete(&self, table: Table, id: &EntityId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_failure(table, WriteKind::Delete)?;

        let filter = Filter::by_id(id);
        inner.rows_mut(table).retain(|r| !filter.matches(r));
        inner.writes.push(WriteOp { kind: WriteKind::Delete, table, id: Some(id.clone()) });
        Ok(())
    }

    async fn upsert(&self, table: Table, mut row: Row, conflict_key: &str) -> Result<Row, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_failure(table, WriteKind::Upsert)?;

        let key = row.get(conflict_key).filter(|v| !v.is_null()).cloned();
        let existing = key.as_ref().and_then(|key| {
            inner
                .tables
                .get(&table)
                .and_then(|rows| rows.iter().position(|r| r.get(conflict_key) == Some(key)))
        });

        let stored = match existing {
            Some(index) => {
                let target = &mut inner.rows_mut(table)[index];
                for (k, v) in row {
                    target.insert(k, v);
                }
                target.clone()
            }
            None => {
                if row_id(&row).is_none() {
                    let id = inner.assign_id(table);
                    row.insert("id".to_string(), Value::String(id.to_string()));
                }
                inner.rows_mut(table).push(row.clone());
                row
            }
        };

        inner.writes.push(WriteOp { kind: WriteKind::Upsert, table, id: row_id(&stored) });
        Ok(stored)
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).count())
            .unwrap_or(0))
    }
}
