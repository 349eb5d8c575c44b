use crate::error::{Result, SyncError};
use crate::hosted::{HostedReleases, ReleaseRequest};
use std::cell::RefCell;

/// Records hosted release calls instead of contacting a host
#[derive(Default)]
pub struct MockHosted {
    deleted: RefCell<Vec<(String, String)>>,
    created: RefCell<Vec<ReleaseRequest>>,
    fail_delete: bool,
    fail_create: bool,
}

impl MockHosted {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deleting reports failure, as when no previous release exists
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Creating reports failure
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// `(repo, tag)` pairs passed to `delete_release`
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.borrow().clone()
    }

    /// Requests passed to `create_release`
    pub fn created(&self) -> Vec<ReleaseRequest> {
        self.created.borrow().clone()
    }
}

impl HostedReleases for MockHosted {
    fn program(&self) -> &str {
        "gh"
    }

    fn delete_release(&self, repo: &str, tag: &str) -> Result<()> {
        self.deleted
            .borrow_mut()
            .push((repo.to_string(), tag.to_string()));
        if self.fail_delete {
            return Err(SyncError::command("gh release delete", "release not found"));
        }
        Ok(())
    }

    fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        self.created.borrow_mut().push(request.clone());
        if self.fail_create {
            return Err(SyncError::command("gh release create", "HTTP 502"));
        }
        Ok(())
    }
}
