//! Row reads and staged row writes

use std::sync::Arc;

use uuid::Uuid;

use crate::parser::ParsedTable;
use crate::storage::{Constraint, Store, StorageResult, UnitOfWork, Write};

use super::record::RowRecord;

/// Row access over the shared store.
#[derive(Debug, Clone)]
pub struct RowStore {
    store: Arc<Store>,
}

impl RowStore {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Rows of one version in index order, or `None` if the version has
    /// no row set.
    pub fn rows(&self, file_id: Uuid, version: u32) -> StorageResult<Option<Vec<RowRecord>>> {
        let tables = self.store.read()?;
        Ok(tables.rows(file_id, version).map(<[RowRecord]>::to_vec))
    }

    /// Stage one row record per data row of `table` under `version`.
    ///
    /// Returns the number of rows staged.
    pub fn stage_insert(
        &self,
        uow: &mut UnitOfWork,
        file_id: Uuid,
        version: u32,
        table: &ParsedTable,
        actor: Uuid,
    ) -> usize {
        let rows: Vec<RowRecord> = table
            .cells()
            .enumerate()
            .map(|(index, cells)| RowRecord::new(file_id, version, index as u64, cells, actor))
            .collect();
        let count = rows.len();
        uow.stage(Write::InsertRows { file_id, version, rows });
        count
    }

    /// Stage a content-identical copy of version `from` as version `to`.
    ///
    /// Returns the number of rows copied.
    pub fn stage_copy(
        &self,
        uow: &mut UnitOfWork,
        file_id: Uuid,
        from: u32,
        to: u32,
        actor: Uuid,
    ) -> StorageResult<usize> {
        let rows: Vec<RowRecord> = {
            let tables = self.store.read()?;
            let source = tables
                .rows(file_id, from)
                .ok_or(Constraint::MissingVersionRows { file_id, version: from })?;
            source.iter().map(|row| row.copy_to(to, actor)).collect()
        };
        let count = rows.len();
        uow.stage(Write::InsertRows { file_id, version: to, rows });
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::FileHead;
    use crate::ledger::VersionEntry;
    use crate::parser;

    fn seeded(content: &str) -> (Arc<Store>, RowStore, FileHead) {
        let store = Arc::new(Store::in_memory());
        let rows = RowStore::new(store.clone());
        let table = parser::parse(content.as_bytes(), "csv").unwrap();
        let head = FileHead::new("a.csv", Uuid::new_v4(), table.row_count() as u64, 0, false);

        let mut uow = store.begin();
        uow.stage(Write::InsertHead(head.clone()));
        uow.stage(Write::AppendVersion(VersionEntry::snapshot(&head, head.owner_id, "")));
        rows.stage_insert(&mut uow, head.id, 1, &table, head.owner_id);
        store.commit(uow).unwrap();
        (store, rows, head)
    }

    #[test]
    fn test_insert_keeps_order() {
        let (_, rows, head) = seeded("Region,Amount\nNorth,100\nSouth,250\n");
        let stored = rows.rows(head.id, 1).unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].index, 0);
        assert_eq!(stored[0].values(), vec!["North", "100"]);
        assert_eq!(stored[1].value("Amount"), Some("250"));
        assert!(rows.rows(head.id, 2).unwrap().is_none());
    }

    #[test]
    fn test_copy_is_content_identical() {
        let (store, rows, head) = seeded("Region,Amount\nNorth,100\nSouth,250\n");
        let next = head
            .apply(crate::head::Transition::Advance { rows: 2, size: 0, private: None })
            .unwrap();
        let actor = Uuid::new_v4();

        let mut uow = store.begin();
        uow.stage(Write::UpdateHead { expected_version: 1, head: next.clone() });
        uow.stage(Write::AppendVersion(VersionEntry::snapshot(&next, actor, "")));
        assert_eq!(rows.stage_copy(&mut uow, head.id, 1, 2, actor).unwrap(), 2);
        store.commit(uow).unwrap();

        let v1 = rows.rows(head.id, 1).unwrap().unwrap();
        let v2 = rows.rows(head.id, 2).unwrap().unwrap();
        assert_eq!(v1.iter().map(|r| &r.cells).collect::<Vec<_>>(), v2.iter().map(|r| &r.cells).collect::<Vec<_>>());
        assert!(v2.iter().all(|r| r.version == 2 && r.inserted_by == actor));
        assert!(v1.iter().all(|r| r.version == 1));
    }

    #[test]
    fn test_copy_of_missing_version_fails() {
        let (store, rows, head) = seeded("a\n1\n");
        let mut uow = store.begin();
        assert!(rows.stage_copy(&mut uow, head.id, 9, 2, head.owner_id).is_err());
        assert!(uow.is_empty());
    }
}
