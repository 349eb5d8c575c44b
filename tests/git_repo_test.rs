// tests/git_repo_test.rs
//
// End-to-end runs against real repositories: a work tree with a `dev`
// branch and a bare repository standing in for the public remote.

use chrono::NaiveDate;
use git2::Repository;
use release_sync::config::ReleaseConfig;
use release_sync::git::{GitRepository, Vcs};
use release_sync::hosted::MockHosted;
use release_sync::logbook::RunLog;
use release_sync::sync::{sync_dev, DevSyncOutcome, ReleaseMode, ReleaseSynchronizer};
use release_sync::version::VersionTag;
use release_sync::whitelist::Whitelist;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

struct Fixture {
    _root: TempDir,
    work: std::path::PathBuf,
    remote: std::path::PathBuf,
}

/// Work tree with `master` published to a bare remote and a `dev` branch
/// carrying one private file on top.
fn setup() -> Fixture {
    let root = TempDir::new().expect("Could not create temp dir");
    let work = root.path().join("mamba");
    let remote = root.path().join("public.git");
    fs::create_dir_all(&work).unwrap();

    git(root.path(), &["init", "--bare", "public.git"]);
    git(&work, &["init"]);
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    git(&work, &["config", "user.name", "Test User"]);
    git(&work, &["config", "user.email", "test@example.com"]);
    git(&work, &["config", "commit.gpgsign", "false"]);
    git(&work, &["config", "tag.gpgsign", "false"]);

    fs::write(work.join("README.md"), "# Mamba\n\nVersion: 1.0.0\n").unwrap();
    git(&work, &["add", "-A"]);
    git(&work, &["commit", "-m", "Initial release"]);

    let remote_str = remote.to_string_lossy().into_owned();
    git(&work, &["remote", "add", "public", remote_str.as_str()]);
    git(&work, &["push", "public", "master"]);

    git(&work, &["checkout", "-b", "dev"]);
    fs::write(work.join("secrets.txt"), "token\n").unwrap();
    fs::write(work.join("Mamba.csproj"), "<Project />\n").unwrap();
    git(&work, &["add", "-A"]);
    git(&work, &["commit", "-m", "Add project file"]);

    Fixture {
        _root: root,
        work,
        remote,
    }
}

fn config(release_remote: &str) -> ReleaseConfig {
    ReleaseConfig {
        project_name: "mamba".to_string(),
        release_remote: release_remote.to_string(),
        ..ReleaseConfig::default()
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

#[test]
fn test_incremental_release_keeps_history() {
    let fx = setup();
    let repo = GitRepository::open(&fx.work).unwrap();
    let cfg = config("public");
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let hosted = MockHosted::new();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&repo, &hosted, &cfg, &whitelist, &log)
        .with_date(date())
        .run(ReleaseMode::Incremental, &VersionTag::new("1.1.0").unwrap())
        .unwrap();
    assert!(report.tagged);

    let bare = Repository::open_bare(&fx.remote).unwrap();
    let head = bare
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(head.summary(), Some("Release v1.1.0"));
    assert_eq!(head.parent_count(), 1);
    assert_eq!(head.parent(0).unwrap().summary(), Some("Initial release"));

    let tree = head.tree().unwrap();
    assert!(tree.get_name("Mamba.csproj").is_some());
    assert!(tree.get_name("CHANGELOG.md").is_some());
    assert!(tree.get_name("secrets.txt").is_none());
    assert!(bare.find_reference("refs/tags/v1.1.0").is_ok());

    assert_eq!(repo.current_branch().unwrap(), "dev");
    assert!(fx.work.join("secrets.txt").exists());
}

#[test]
fn test_release_keeps_settings_and_logs_out_of_the_commit() {
    let fx = setup();
    let settings = fx.work.join("release-sync.toml");
    fs::write(&settings, "project_name = \"mamba\"\nlog_dir = \"logs\"\n").unwrap();

    let repo = GitRepository::open(&fx.work).unwrap();
    let cfg = ReleaseConfig {
        log_dir: Some("logs".to_string()),
        ..config("public")
    };
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let hosted = MockHosted::new();
    let log = RunLog::in_dir(&cfg.resolved_log_dir(&fx.work));
    log.info("Starting test run");
    let owned = cfg.owned_paths(&fx.work, &settings);

    ReleaseSynchronizer::new(&repo, &hosted, &cfg, &whitelist, &log)
        .with_owned_paths(owned)
        .with_date(date())
        .run(ReleaseMode::Incremental, &VersionTag::new("1.1.0").unwrap())
        .unwrap();

    let bare = Repository::open_bare(&fx.remote).unwrap();
    let tree = bare
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .tree()
        .unwrap();
    assert!(tree.get_name("Mamba.csproj").is_some());
    assert!(tree.get_name("logs").is_none());
    assert!(tree.get_name("release-sync.toml").is_none());

    assert!(settings.exists());
    let log_file = log.path().unwrap();
    assert!(log_file.starts_with(fx.work.join("logs")));
    assert!(fs::read_to_string(log_file)
        .unwrap()
        .contains("finished with"));
}

#[test]
fn test_flattened_release_leaves_single_root_commit() {
    let fx = setup();
    // Fetch URL names the hosted repository, pushes go to the bare remote
    git(
        &fx.work,
        &["remote", "add", "origin", "https://github.com/acme/mamba.git"],
    );
    let push_url = fx.remote.to_string_lossy().into_owned();
    git(
        &fx.work,
        &["remote", "set-url", "--push", "origin", push_url.as_str()],
    );

    let repo = GitRepository::open(&fx.work).unwrap();
    let cfg = config("origin");
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let hosted = MockHosted::new();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&repo, &hosted, &cfg, &whitelist, &log)
        .with_date(date())
        .run(ReleaseMode::Flattened, &VersionTag::new("1.2.0").unwrap())
        .unwrap();

    let bare = Repository::open_bare(&fx.remote).unwrap();
    let head = bare
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(head.summary(), Some("Release v1.2.0"));
    assert_eq!(head.parent_count(), 0);
    assert!(head.tree().unwrap().get_name("secrets.txt").is_none());

    let tag = bare
        .find_reference("refs/tags/v1.2.0")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(tag.id(), head.id());

    assert_eq!(report.hosted_release.as_deref(), Some("v1.2.0"));
    assert_eq!(hosted.created()[0].repo, "acme/mamba");
    assert_eq!(repo.current_branch().unwrap(), "dev");
    assert!(fx.work.join("secrets.txt").exists());

    let local = Repository::open(&fx.work).unwrap();
    let local_master = local
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(local_master.parent_count(), 0);
    assert!(local.find_branch("temp_release", git2::BranchType::Local).is_err());
}

#[test]
fn test_dev_sync_with_clean_tree_has_nothing_to_sync() {
    let fx = setup();
    let repo = GitRepository::open(&fx.work).unwrap();
    let cfg = config("public");
    // Already stamped, so staging finds nothing
    let version = VersionTag::new("1.0.0").unwrap();
    let log = RunLog::memory();

    let outcome = sync_dev(&repo, &cfg, &log, &version, true, |_| Ok(String::new())).unwrap();

    assert_eq!(outcome, DevSyncOutcome::NothingToSync);
    assert!(log.contains("Nothing to sync on dev."));
}

#[test]
fn test_repository_queries() {
    let fx = setup();
    git(&fx.work, &["tag", "v1.0.0", "master"]);
    let repo = GitRepository::open(&fx.work).unwrap();

    assert_eq!(repo.latest_tag().unwrap().as_deref(), Some("v1.0.0"));
    let commits = repo.commits_since(Some("v1.0.0"), 5).unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].summary, "Add project file");
    assert!(!repo.is_dirty().unwrap());

    fs::write(fx.work.join("scratch.txt"), "x").unwrap();
    assert!(repo.is_dirty().unwrap());
    assert!(!repo.has_staged_changes().unwrap());
}
