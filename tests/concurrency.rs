//! Concurrency Tests
//!
//! - Concurrent replaces of one file never claim the same version
//! - Concurrent uploads of one filename have exactly one winner
//! - Readers only ever observe committed state

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use tabvault::identity::Caller;
use tabvault::observability::NullAuditSink;
use tabvault::identity::Directory;
use tabvault::storage::Store;
use tabvault::vault::{FileVault, ReplaceRequest, UploadFile, UploadRequest, VaultError};
use uuid::Uuid;

const THREADS: usize = 8;

fn vault() -> FileVault {
    FileVault::new(
        Arc::new(Store::in_memory()),
        Arc::new(Directory::new()),
        Arc::new(NullAuditSink),
    )
}

fn single(name: &str, content: &str) -> UploadRequest {
    UploadRequest::new(vec![UploadFile::new(content.as_bytes().to_vec(), name, false)])
}

/// Every replace gets its own version; together they form 2..=N+1.
#[test]
fn test_concurrent_replace_claims_each_version_once() {
    let vault = vault();
    let caller = Caller::admin(Uuid::new_v4());
    let head = vault.upload(&caller, single("n.csv", "n\n0\n")).unwrap().remove(0);
    let barrier = Barrier::new(THREADS);

    let versions: Vec<u32> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let (vault, caller, barrier) = (&vault, &caller, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let content = format!("n\n{}\n", i);
                    vault
                        .replace(caller, ReplaceRequest::new(head.id, content.into_bytes()))
                        .map(|h| h.version)
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|h| h.join().unwrap().ok())
            .collect()
    });

    let unique: HashSet<u32> = versions.iter().copied().collect();
    assert_eq!(unique.len(), versions.len());

    let tables = vault.store().read().unwrap();
    let head = tables.head(head.id).unwrap();
    assert_eq!(head.version as usize, 1 + versions.len());
    let ledger: Vec<u32> = tables.versions(head.id).map(|e| e.version).collect();
    assert_eq!(ledger, (1..=head.version).collect::<Vec<_>>());
    for version in 1..=head.version {
        assert_eq!(tables.rows(head.id, version).map(|r| r.len()), Some(1));
    }
}

/// Same filename from many threads: one head, one ledger entry, one row set.
#[test]
fn test_concurrent_upload_same_name_has_one_winner() {
    let vault = vault();
    let barrier = Barrier::new(THREADS);

    let results: Vec<Result<_, VaultError>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let (vault, barrier) = (&vault, &barrier);
                s.spawn(move || {
                    let caller = Caller::admin(Uuid::new_v4());
                    barrier.wait();
                    vault.upload(&caller, single("report.csv", &format!("n\n{}\n", i)))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(result.code(), "CONFLICT");
    }

    let tables = vault.store().read().unwrap();
    assert_eq!(tables.head_count(), 1);
    assert_eq!(tables.ledger_len(), 1);
    assert_eq!(tables.row_record_count(), 1);
}

/// Readers see versions appear whole: rows exist for every listed version.
#[test]
fn test_readers_never_see_partial_versions() {
    let vault = vault();
    let caller = Caller::admin(Uuid::new_v4());
    let head = vault.upload(&caller, single("n.csv", "n\n0\n")).unwrap().remove(0);

    thread::scope(|s| {
        let writer = s.spawn(|| {
            for i in 1..=20 {
                let content = format!("n\n{}\n{}\n", i, i);
                vault
                    .replace(&caller, ReplaceRequest::new(head.id, content.into_bytes()))
                    .unwrap();
            }
        });

        for _ in 0..2 {
            s.spawn(|| {
                for _ in 0..50 {
                    let tables = vault.store().read().unwrap();
                    let current = tables.head(head.id).unwrap();
                    assert_eq!(tables.latest_version(head.id), Some(current.version));
                    let rows = tables.rows(head.id, current.version).unwrap();
                    assert_eq!(rows.len() as u64, current.rows);
                }
            });
        }
        writer.join().unwrap();
    });
}
