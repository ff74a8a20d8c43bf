//! Version History Invariant Tests
//!
//! - Head version always equals the newest ledger version
//! - Replace advances by exactly one and leaves earlier rows untouched
//! - Revert copies a version's rows forward under a new number
//! - Delete then Reset restores the file exactly

use std::sync::Arc;

use tabvault::head::FileHead;
use tabvault::identity::{Caller, Capabilities, Directory, IdentityProvider};
use tabvault::observability::MemoryAuditSink;
use tabvault::storage::Store;
use tabvault::vault::{
    FileVault, ListOptions, ReplaceRequest, RevertRequest, UploadFile, UploadRequest,
};
use uuid::Uuid;

// =============================================================================
// Test Utilities
// =============================================================================

struct Env {
    vault: FileVault,
    audit: Arc<MemoryAuditSink>,
    owner: Caller,
}

fn env() -> Env {
    let mut directory = Directory::new().with_role(
        "Analyst",
        Capabilities {
            can_upload: true,
            can_view: true,
            ..Capabilities::default()
        },
    );
    let owner = directory.add_user("Ada", "Lovelace", "Analyst");
    let directory = Arc::new(directory);
    let audit = Arc::new(MemoryAuditSink::new());
    let vault = FileVault::new(Arc::new(Store::in_memory()), directory.clone(), audit.clone());
    Env {
        owner: directory.resolve(owner).unwrap(),
        vault,
        audit,
    }
}

fn upload(env: &Env, name: &str, content: &str) -> FileHead {
    env.vault
        .upload(
            &env.owner,
            UploadRequest::new(vec![UploadFile::new(content.as_bytes().to_vec(), name, false)]),
        )
        .unwrap()
        .remove(0)
}

fn replace(env: &Env, file_id: Uuid, content: &str) -> FileHead {
    env.vault
        .replace(&env.owner, ReplaceRequest::new(file_id, content.as_bytes().to_vec()))
        .unwrap()
}

fn values(env: &Env, file_id: Uuid, version: u32) -> Vec<Vec<String>> {
    env.vault
        .data(&env.owner, file_id, Some(version))
        .unwrap()
        .rows
        .iter()
        .map(|r| r.cells.iter().map(|c| c.value.clone()).collect())
        .collect()
}

fn assert_head_matches_ledger(env: &Env, file_id: Uuid) {
    let tables = env.vault.store().read().unwrap();
    let head = tables.head(file_id).unwrap();
    let versions: Vec<u32> = tables.versions(file_id).map(|e| e.version).collect();
    assert_eq!(versions, (1..=head.version).collect::<Vec<_>>());
}

// =============================================================================
// Scenario
// =============================================================================

/// Upload, replace, then revert a sales sheet.
#[test]
fn test_sales_scenario() {
    let env = env();

    let v1 = upload(&env, "sales.csv", "Region,Amount\nWest,100\nEast,200\n");
    assert_eq!((v1.version, v1.rows), (1, 2));

    let v2 = replace(&env, v1.id, "Region,Amount\nWest,150\nEast,200\nNorth,50\n");
    assert_eq!((v2.version, v2.rows), (2, 3));
    assert_eq!(values(&env, v1.id, 1), vec![vec!["West", "100"], vec!["East", "200"]]);

    let v3 = env
        .vault
        .revert(&env.owner, RevertRequest { file_id: v1.id, version: 1 })
        .unwrap();
    assert_eq!((v3.version, v3.rows), (3, 2));
    assert_eq!(values(&env, v1.id, 3), values(&env, v1.id, 1));

    let columns: Vec<String> = env
        .vault
        .data(&env.owner, v1.id, None)
        .unwrap()
        .columns()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(columns, vec!["Region", "Amount"]);

    assert_head_matches_ledger(&env, v1.id);
    assert_eq!(env.audit.actions(), vec!["upload", "replace", "revert"]);
}

// =============================================================================
// Replace
// =============================================================================

/// Many replaces: each adds one version, earlier rows never change.
#[test]
fn test_replace_preserves_every_prior_version() {
    let env = env();
    let head = upload(&env, "n.csv", "n\n0\n");

    for i in 1..=10u32 {
        let next = replace(&env, head.id, &format!("n\n{}\n", i));
        assert_eq!(next.version, i + 1);
        assert_head_matches_ledger(&env, head.id);
    }

    for version in 1..=11u32 {
        assert_eq!(values(&env, head.id, version), vec![vec![(version - 1).to_string()]]);
    }
    assert_eq!(env.vault.history(&env.owner, head.id).unwrap().len(), 11);
}

/// Replace keeps identity, filename and privacy.
#[test]
fn test_replace_keeps_identity() {
    let env = env();
    let head = upload(&env, "n.csv", "n\n0\n");
    let next = replace(&env, head.id, "n\n1\n2\n");
    assert_eq!(next.id, head.id);
    assert_eq!(next.filename, head.filename);
    assert_eq!(next.owner_id, head.owner_id);
    assert_eq!(next.private, head.private);
    assert_eq!(next.created_at, head.created_at);
}

// =============================================================================
// Revert
// =============================================================================

/// Reverting never rewinds the version number.
#[test]
fn test_revert_moves_forward() {
    let env = env();
    let head = upload(&env, "n.csv", "n\n1\n");
    replace(&env, head.id, "n\n2\n");
    replace(&env, head.id, "n\n3\n");

    let reverted = env
        .vault
        .revert(&env.owner, RevertRequest { file_id: head.id, version: 2 })
        .unwrap();
    assert_eq!(reverted.version, 4);
    assert_eq!(values(&env, head.id, 4), vec![vec!["2"]]);
    assert_eq!(values(&env, head.id, 2), vec![vec!["2"]]);
    assert_head_matches_ledger(&env, head.id);
}

// =============================================================================
// Delete / Reset
// =============================================================================

/// Delete then Reset leaves version, stats and rows as they were.
#[test]
fn test_delete_reset_round_trip() {
    let env = env();
    let head = upload(&env, "n.csv", "a,b\n1,2\n3,4\n");
    let before = values(&env, head.id, 1);

    let deleted = env.vault.delete(&env.owner, head.id).unwrap();
    assert!(deleted.deleted);
    assert!(env.vault.list(&env.owner, ListOptions::default()).unwrap().is_empty());
    assert_eq!(
        env.vault
            .list(&env.owner, ListOptions { include_deleted: true })
            .unwrap()
            .len(),
        1
    );
    // Still readable by identity while deleted.
    assert_eq!(values(&env, head.id, 1), before);

    let restored = env.vault.reset(&env.owner, head.id).unwrap();
    assert_eq!(
        (restored.version, restored.rows, restored.size),
        (head.version, head.rows, head.size)
    );
    assert_eq!(values(&env, head.id, 1), before);
    assert_eq!(env.vault.history(&env.owner, head.id).unwrap().len(), 1);
}

/// A deleted file's name can be taken; resetting it then conflicts.
#[test]
fn test_reset_conflicts_when_name_reused() {
    let env = env();
    let old = upload(&env, "n.csv", "n\n1\n");
    env.vault.delete(&env.owner, old.id).unwrap();

    let new = upload(&env, "n.csv", "n\n2\n");
    assert_ne!(new.id, old.id);

    let result = env.vault.reset(&env.owner, old.id);
    assert_eq!(result.unwrap_err().code(), "CONFLICT");
    assert_eq!(
        env.vault.find_by_name(&env.owner, "n.csv").unwrap().head.id,
        new.id
    );
}
