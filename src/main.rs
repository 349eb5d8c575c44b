use clap::{ArgGroup, Parser};

use release_sync::cli::{self, RunMode, SyncArgs};
use release_sync::ui;

#[derive(clap::Parser)]
#[command(
    name = "release-sync",
    version,
    about = "Sync a development branch and publish filtered, tagged releases"
)]
#[command(group(ArgGroup::new("mode").multiple(false)))]
struct Args {
    #[arg(long, group = "mode", help = "Incremental release: merge dev into the release branch")]
    update: bool,

    #[arg(long, group = "mode", help = "Flattened release: replace release history with one commit")]
    deploy: bool,

    #[arg(long, group = "mode", help = "Zip the release branch into the backup directory")]
    archive: bool,

    #[arg(long, group = "mode", help = "Bundle every ref into the backup directory")]
    backup: bool,

    #[arg(short, long, help = "Skip confirmation prompts")]
    yes: bool,

    #[arg(short, long, help = "Open the run log when finished")]
    open: bool,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, value_name = "VERSION", help = "Release this version instead of the manifest's")]
    release_version: Option<String>,
}

fn main() {
    let args = Args::parse();

    let sync_args = SyncArgs {
        config_path: args.config,
        mode: RunMode::from_flags(args.update, args.deploy, args.archive, args.backup),
        yes: args.yes,
        open: args.open,
        release_version: args.release_version,
    };

    if let Err(e) = cli::run(sync_args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
