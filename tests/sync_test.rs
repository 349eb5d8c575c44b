// tests/sync_test.rs
use chrono::NaiveDate;
use release_sync::advisory::Advisory;
use release_sync::config::ReleaseConfig;
use release_sync::git::MockVcs;
use release_sync::hosted::MockHosted;
use release_sync::logbook::RunLog;
use release_sync::sync::{ReleaseMode, ReleaseSynchronizer, SyncState};
use release_sync::version::VersionTag;
use release_sync::whitelist::Whitelist;
use release_sync::SyncError;
use std::fs;
use tempfile::TempDir;

const REMOTE_URL: &str = "git@github.com:acme/mamba.git";

fn config() -> ReleaseConfig {
    ReleaseConfig {
        project_name: "mamba".to_string(),
        ..ReleaseConfig::default()
    }
}

fn work_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("README.md"), "# Mamba\n\n**Version**: 1.1.0\n").unwrap();
    fs::write(dir.path().join("secrets.txt"), "token").unwrap();
    dir
}

fn version() -> VersionTag {
    VersionTag::new("1.2.0").unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

#[test]
fn test_flattened_release_command_sequence() {
    let dir = work_tree();
    let vcs = MockVcs::new(dir.path(), "dev").with_remote("origin", REMOTE_URL);
    let hosted = MockHosted::new();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .with_date(date())
        .run(ReleaseMode::Flattened, &version())
        .unwrap();

    assert_eq!(
        vcs.calls(),
        vec![
            "git add CHANGELOG.md",
            "git branch -D temp_release",
            "git checkout --orphan temp_release dev",
            "git add -A",
            "git commit -m Release v1.2.0 --allow-empty",
            "git branch -M temp_release master",
            "git push origin master --force",
            "git tag -a v1.2.0 -m Version 1.2.0 -f",
            "git push origin refs/tags/v1.2.0 --force",
            "git checkout dev --force",
        ]
    );
    assert_eq!(vcs.current(), "dev");
    assert_eq!(report.hosted_release.as_deref(), Some("v1.2.0"));
    assert_eq!(report.states.last(), Some(&SyncState::ReturnedToDev));
    assert!(report.states.contains(&SyncState::PublishingHostedRelease));

    assert_eq!(
        hosted.deleted(),
        vec![("acme/mamba".to_string(), "v1.2.0".to_string())]
    );
    let created = hosted.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "v1.2.0");
    assert_eq!(created[0].notes, "- Performance and stability improvements.");
    assert!(created[0].assets.is_empty());

    let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert_eq!(readme, "# Mamba\n\n**Version**: 1.2.0\n");
    assert!(!dir.path().join("secrets.txt").exists());
}

#[test]
fn test_branch_mismatch_is_fatal_and_returns_to_dev() {
    let dir = work_tree();
    let vcs = MockVcs::new(dir.path(), "dev").stuck_on_checkout("master");
    let hosted = MockHosted::new();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let result = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Incremental, &version());

    match result {
        Err(SyncError::Precondition(msg)) => assert!(msg.contains("Branch mismatch")),
        other => panic!("expected precondition failure, got {:?}", other),
    }
    let calls = vcs.calls();
    assert!(!calls.iter().any(|c| c.starts_with("git pull")));
    assert_eq!(calls.last().map(String::as_str), Some("git checkout dev --force"));
    assert!(dir.path().join("secrets.txt").exists());
}

#[test]
fn test_tag_push_failure_is_advisory() {
    let dir = work_tree();
    let vcs = MockVcs::new(dir.path(), "dev").fail_on("push origin refs/tags");
    let hosted = MockHosted::new();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Incremental, &version())
        .unwrap();

    assert!(report.pushed);
    assert!(!report.tagged);
    assert!(report.returned_to_dev);
    assert!(report
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::UntaggedRelease { .. })));
    assert!(log.contains("Run: git push origin v1.2.0 --force"));
}

#[test]
fn test_hosted_create_failure_still_returns_to_dev() {
    let dir = work_tree();
    let vcs = MockVcs::new(dir.path(), "dev").with_remote("origin", REMOTE_URL);
    let hosted = MockHosted::new().failing_create();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let result = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Flattened, &version());

    assert!(result.is_err());
    assert_eq!(vcs.current(), "dev");
    assert_eq!(
        vcs.calls().last().map(String::as_str),
        Some("git checkout dev --force")
    );
}

#[test]
fn test_missing_previous_hosted_release_is_advisory() {
    let dir = work_tree();
    let vcs = MockVcs::new(dir.path(), "dev").with_remote("origin", REMOTE_URL);
    let hosted = MockHosted::new().failing_delete();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Flattened, &version())
        .unwrap();

    assert_eq!(hosted.created().len(), 1);
    assert!(report
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::HostedReleaseNotDeleted { .. })));
}

#[test]
fn test_release_assets_attached() {
    let dir = work_tree();
    fs::write(dir.path().join("Mamba.zip"), "zip").unwrap();
    let vcs = MockVcs::new(dir.path(), "dev").with_remote("origin", REMOTE_URL);
    let hosted = MockHosted::new();
    let cfg = ReleaseConfig {
        release_asset: Some("Mamba.zip".to_string()),
        attach_archive: true,
        backup_dir: Some("backups".to_string()),
        release_whitelist: vec![r".*\.md$".to_string(), r".*\.zip$".to_string()],
        ..config()
    };
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Flattened, &version())
        .unwrap();

    let assets = &hosted.created()[0].assets;
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0], dir.path().join("Mamba.zip"));
    assert!(assets[1].starts_with(dir.path().join("backups")));
    assert!(vcs
        .calls()
        .iter()
        .any(|c| c.starts_with("git archive --format=zip")));
}

#[test]
fn test_unwhitelisted_asset_survives_purge_for_upload() {
    let dir = work_tree();
    fs::create_dir(dir.path().join("dist")).unwrap();
    fs::write(dir.path().join("dist/Mamba.zip"), "zip").unwrap();
    fs::write(dir.path().join("dist/debug.pdb"), "symbols").unwrap();
    let vcs = MockVcs::new(dir.path(), "dev").with_remote("origin", REMOTE_URL);
    let hosted = MockHosted::new();
    let cfg = ReleaseConfig {
        release_asset: Some("dist/Mamba.zip".to_string()),
        ..config()
    };
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let log = RunLog::memory();

    let report = ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
        .run(ReleaseMode::Flattened, &version())
        .unwrap();

    assert!(!report
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::ReleaseAssetMissing { .. })));
    assert_eq!(
        hosted.created()[0].assets,
        vec![dir.path().join("dist/Mamba.zip")]
    );
    assert!(!dir.path().join("dist/debug.pdb").exists());
    assert!(report.purged.contains(&"dist/debug.pdb".to_string()));
    assert!(vcs
        .calls()
        .contains(&"git add -A -- . :(exclude)dist/Mamba.zip".to_string()));
}

#[test]
fn test_changelog_is_idempotent_across_runs() {
    let dir = work_tree();
    let cfg = config();
    let whitelist = Whitelist::new(&cfg.release_whitelist).unwrap();
    let hosted = MockHosted::new();

    for _ in 0..2 {
        let vcs = MockVcs::new(dir.path(), "dev");
        let log = RunLog::memory();
        ReleaseSynchronizer::new(&vcs, &hosted, &cfg, &whitelist, &log)
            .with_date(date())
            .run(ReleaseMode::Incremental, &version())
            .unwrap();
    }

    let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert_eq!(changelog.matches("## [1.2.0]").count(), 1);
    assert_eq!(changelog.matches("# Changelog").count(), 1);
}
