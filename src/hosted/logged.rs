use crate::error::Result;
use crate::hosted::gh::{create_args, delete_args};
use crate::hosted::{HostedReleases, ReleaseRequest};
use crate::logbook::RunLog;

/// Echoes each hosted-release call to the run log the same way
/// [crate::git::LoggedVcs] echoes git mutations.
pub struct LoggedHosted<'a, H: HostedReleases> {
    inner: &'a H,
    log: &'a RunLog,
}

impl<'a, H: HostedReleases> LoggedHosted<'a, H> {
    pub fn new(inner: &'a H, log: &'a RunLog) -> Self {
        LoggedHosted { inner, log }
    }

    fn traced(&self, args: Vec<String>, op: impl FnOnce() -> Result<()>) -> Result<()> {
        self.log.debug(&format!(
            "EXECUTING: {} {}",
            self.inner.program(),
            args.join(" ")
        ));
        op().map_err(|e| {
            self.log.error(&format!("COMMAND FAILED: {}", e));
            e
        })
    }
}

impl<H: HostedReleases> HostedReleases for LoggedHosted<'_, H> {
    fn program(&self) -> &str {
        self.inner.program()
    }

    fn delete_release(&self, repo: &str, tag: &str) -> Result<()> {
        self.traced(delete_args(repo, tag), || self.inner.delete_release(repo, tag))
    }

    fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        self.traced(create_args(request), || self.inner.create_release(request))
    }
}
