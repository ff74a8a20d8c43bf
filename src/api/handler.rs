//! API Handler for tabvault
//!
//! Resolves the caller, reads referenced content from disk, calls the file
//! service and renders the outcome. Holds no lock of its own; concurrency
//! control lives in the service and the store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::identity::Caller;
use crate::vault::{
    FileVault, ListOptions, ReplaceRequest, RevertRequest, UploadRequest,
};

use super::errors::{ApiError, ApiResult};
use super::request::{Envelope, Request};
use super::response::Response;

/// Request handler over a shared file service
#[derive(Clone)]
pub struct ApiHandler {
    vault: Arc<FileVault>,
}

impl ApiHandler {
    pub fn new(vault: Arc<FileVault>) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &Arc<FileVault> {
        &self.vault
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        let envelope = match Envelope::parse(json_request) {
            Ok(envelope) => envelope,
            Err(err) => return Response::error(Envelope::peek_id(json_request), &err),
        };

        let id = envelope.id.clone();
        let op = envelope.request.op();
        match self.dispatch(envelope) {
            Ok(data) => Response::success(id, data),
            Err(err) => {
                tracing::debug!(op, code = err.code(), "request failed");
                Response::error(id, &err)
            }
        }
    }

    /// Execute a parsed request
    pub fn dispatch(&self, envelope: Envelope) -> ApiResult<Value> {
        let caller = self.caller(&envelope)?;
        let vault = &self.vault;

        match envelope.request {
            Request::Upload { paths, filenames, private } => {
                let contents = paths.iter().map(|p| read_content(p)).collect::<ApiResult<Vec<_>>>()?;
                let mut request = UploadRequest::from_parallel(contents, filenames, private)?;
                for (file, path) in request.files.iter_mut().zip(&paths) {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        file.source_name = Some(name.to_string());
                    }
                }
                to_data(&vault.upload(&caller, request)?)
            }
            Request::Replace { file_id, path } => {
                let mut request = ReplaceRequest::new(file_id, read_content(&path)?);
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    request = request.with_source_name(name);
                }
                to_data(&vault.replace(&caller, request)?)
            }
            Request::Revert { file_id, version } => {
                to_data(&vault.revert(&caller, RevertRequest { file_id, version })?)
            }
            Request::Delete { file_id } => to_data(&vault.delete(&caller, file_id)?),
            Request::Reset { file_id } => to_data(&vault.reset(&caller, file_id)?),
            Request::List { include_deleted } => {
                to_data(&vault.list(&caller, ListOptions { include_deleted })?)
            }
            Request::Find { filename } => to_data(&vault.find_by_name(&caller, &filename)?),
            Request::History { file_id } => to_data(&vault.history(&caller, file_id)?),
            Request::Data { file_id, version } => to_data(&vault.data(&caller, file_id, version)?),
            Request::Grant { file_id, user_ids } => {
                to_data(&vault.grant(&caller, file_id, &user_ids)?)
            }
            Request::Revoke { grant_id } => to_data(&vault.revoke(&caller, grant_id)?),
            Request::Access { file_id } => to_data(&vault.list_access(&caller, file_id)?),
        }
    }

    fn caller(&self, envelope: &Envelope) -> ApiResult<Caller> {
        self.vault
            .identity()
            .resolve(envelope.user_id)
            .ok_or_else(|| ApiError::unauthenticated(envelope.user_id))
    }
}

fn read_content(path: &Path) -> ApiResult<Vec<u8>> {
    fs::read(path).map_err(|e| ApiError::file_read(path.display(), e))
}

fn to_data<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::invalid_request(format!("cannot encode response: {}", e)))
}
