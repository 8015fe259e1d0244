use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gitlab_release_resource::{commands, logging};

#[derive(Parser)]
#[command(name = "gitlab-release-resource")]
#[command(version, about = "Concourse resource for GitLab releases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit the releases published since the given version
    Check,
    /// Download a release into a directory
    In {
        /// Directory receiving the release files
        destination: PathBuf,
    },
    /// Create or update a release from a build output directory
    Out {
        /// Directory holding the files named in params
        source: PathBuf,
    },
}

/// Arguments for clap, inserting the subcommand when invoked through a
/// `check`, `in` or `out` link.
fn invocation_args(args: Vec<OsString>) -> Vec<OsString> {
    let invoked_as = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string);

    match invoked_as.as_deref() {
        Some(name @ ("check" | "in" | "out")) => {
            let mut rewritten = Vec::with_capacity(args.len() + 1);
            rewritten.push(OsString::from("gitlab-release-resource"));
            rewritten.push(OsString::from(name));
            rewritten.extend(args.into_iter().skip(1));
            rewritten
        }
        _ => args,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();

    runtime.block_on(async {
        match cli.command {
            Command::Check => commands::check(stdin, stdout).await,
            Command::In { destination } => commands::fetch(stdin, stdout, &destination).await,
            Command::Out { source } => commands::publish(stdin, stdout, &source).await,
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(invocation_args(std::env::args_os().collect()));
    let _guard = logging::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
