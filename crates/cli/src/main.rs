use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rename_bot_core::{
    app_paths, guess_mime, load_history, resolve_collision, save_history,
    suggest_name_with_fallback, write_new_file, AppConfig, AppPaths, CaseFormat, DirectoryListing,
    ExtensionOutcome, FileSummary, HistoryStore, RenameOptions, RenameSession, SpaceReplacement,
    HISTORY_LIMIT,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rename-bot")]
#[command(about = "Clean up, format and de-duplicate file names")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the cleaned-up name for a file.
    Suggest(SuggestArgs),
    Rename(RenameArgs),
    /// List the most recent renames, newest first.
    History(HistoryArgs),
    /// Write a file from the history back out under its new name.
    Restore(RestoreArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct SuggestArgs {
    file: PathBuf,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// New name; defaults to the suggested one. Only valid for a single file.
    #[arg(long)]
    name: Option<String>,
    /// MIME type of the input; guessed from the file name when omitted.
    #[arg(long)]
    mime: Option<String>,
    #[arg(long, value_enum)]
    case: Option<CaseArg>,
    #[arg(long, value_enum)]
    spaces: Option<SpacesArg>,
    #[arg(long)]
    target_dir: Option<PathBuf>,
    /// Write the renamed copy into the target directory.
    #[arg(long, default_value_t = false)]
    save: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct RestoreArgs {
    /// Position in `history`, starting at 1.
    index: usize,
    #[arg(long)]
    dest: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    /// Change one setting and write the config file.
    Set {
        /// One of target_dir, save_by_default, fallback_base, case_format,
        /// space_replacement.
        key: String,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaseArg {
    None,
    Lower,
    Upper,
    Title,
}

impl From<CaseArg> for CaseFormat {
    fn from(value: CaseArg) -> Self {
        match value {
            CaseArg::None => CaseFormat::None,
            CaseArg::Lower => CaseFormat::Lower,
            CaseArg::Upper => CaseFormat::Upper,
            CaseArg::Title => CaseFormat::TitleCase,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpacesArg {
    Keep,
    Underscore,
    Hyphen,
}

impl From<SpacesArg> for SpaceReplacement {
    fn from(value: SpacesArg) -> Self {
        match value {
            SpacesArg::Keep => SpaceReplacement::Keep,
            SpacesArg::Underscore => SpaceReplacement::Underscore,
            SpacesArg::Hyphen => SpaceReplacement::Hyphen,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct RenameReport {
    summary: FileSummary,
    final_name: String,
    extension: ExtensionOutcome,
    collided: bool,
    saved_to: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    index: usize,
    original_name: String,
    final_name: String,
    mime_type: String,
    created_at: String,
    size_bytes: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let paths = app_paths()?;

    match cli.command {
        Commands::Suggest(args) => cmd_suggest(args, &paths),
        Commands::Rename(args) => cmd_rename(args, &paths),
        Commands::History(args) => cmd_history(args, &paths),
        Commands::Restore(args) => cmd_restore(args, &paths),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(&paths),
            ConfigAction::Set { key, value } => cmd_config_set(&paths, &key, &value),
        },
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_suggest(args: SuggestArgs, paths: &AppPaths) -> Result<()> {
    let config = AppConfig::load_from(&paths.config_path)?;
    let original = file_name_of(&args.file)?;
    println!("{}", suggest_name_with_fallback(&original, &config.fallback_base));
    Ok(())
}

fn cmd_rename(args: RenameArgs, paths: &AppPaths) -> Result<()> {
    let batch = run_rename(&args, paths)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&batch.reports)?),
        OutputFormat::Table => print_reports(&batch.reports),
    }

    if !batch.saved {
        eprintln!(
            "dry run: nothing was written. Pass --save to write into {}",
            batch.target_dir.display()
        );
    }

    Ok(())
}

struct RenameBatch {
    reports: Vec<RenameReport>,
    target_dir: PathBuf,
    saved: bool,
}

/// Renames every input in order against one snapshot of the target
/// directory. History is persisted after each file, so a failure part way
/// keeps the entries of the files before it.
fn run_rename(args: &RenameArgs, paths: &AppPaths) -> Result<RenameBatch> {
    if args.name.is_some() && args.files.len() > 1 {
        bail!("--name can only be used with a single file");
    }

    let config = AppConfig::load_from(&paths.config_path)?;
    let target_dir = args
        .target_dir
        .clone()
        .unwrap_or_else(|| config.target_dir.clone());
    let save = args.save || config.save_by_default;
    debug!(target_dir = %target_dir.display(), save, files = args.files.len(), "starting rename");

    let history = load_history(&paths.history_dir)?;
    let mut session = RenameSession::new(history).with_fallback_base(config.fallback_base.clone());
    let mut listing = DirectoryListing::scan(&target_dir)?;
    let mut reports = Vec::with_capacity(args.files.len());

    for file in &args.files {
        let report = rename_one(&mut session, &mut listing, args, &config, file, save)?;
        save_history(&paths.history_dir, session.history())?;
        reports.push(report);
    }

    Ok(RenameBatch {
        reports,
        target_dir,
        saved: save,
    })
}

fn rename_one(
    session: &mut RenameSession,
    listing: &mut DirectoryListing,
    args: &RenameArgs,
    config: &AppConfig,
    file: &Path,
    save: bool,
) -> Result<RenameReport> {
    let original = file_name_of(file)?;
    let payload =
        fs::read(file).with_context(|| format!("failed to read input file: {}", file.display()))?;
    let mime_type = args.mime.clone().unwrap_or_else(|| guess_mime(&original));

    let suggestion = session.upload(original.clone(), mime_type.clone(), payload);
    let options = RenameOptions {
        name: args.name.clone().unwrap_or(suggestion),
        case_format: args.case.map(Into::into).unwrap_or(config.case_format),
        space_replacement: args
            .spaces
            .map(Into::into)
            .unwrap_or(config.space_replacement),
    };

    let outcome = session.process(&options, |name| listing.contains(name))?;
    listing.reserve(&outcome.final_name);

    match &outcome.extension {
        ExtensionOutcome::Inferred(ext) => {
            eprintln!("{original}: no extension given, added {ext}")
        }
        ExtensionOutcome::Unknown => eprintln!(
            "warning: {original}: could not detect the file type ({mime_type}); add an extension yourself"
        ),
        ExtensionOutcome::Present => {}
    }

    let saved_to = if save {
        let upload = session
            .current_upload()
            .context("upload disappeared from the session")?;
        Some(write_new_file(
            listing.root(),
            &outcome.final_name,
            &upload.payload,
        )?)
    } else {
        None
    };

    let summary = session
        .summary()
        .context("upload disappeared from the session")?;
    Ok(RenameReport {
        summary,
        final_name: outcome.final_name,
        extension: outcome.extension,
        collided: outcome.collided,
        saved_to,
    })
}

fn cmd_history(args: HistoryArgs, paths: &AppPaths) -> Result<()> {
    let history = load_history(&paths.history_dir)?;
    let rows = history_rows(&history);

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("no renames yet");
            }
            for row in &rows {
                println!(
                    "{}. {} -> {} ({})",
                    row.index, row.original_name, row.final_name, row.created_at
                );
            }
        }
    }
    Ok(())
}

fn history_rows(history: &HistoryStore) -> Vec<HistoryRow> {
    history
        .recent(HISTORY_LIMIT)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| HistoryRow {
            index: i + 1,
            original_name: entry.original_name.clone(),
            final_name: entry.final_name.clone(),
            mime_type: entry.mime_type.clone(),
            created_at: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            size_bytes: entry.payload.len(),
        })
        .collect()
}

fn cmd_restore(args: RestoreArgs, paths: &AppPaths) -> Result<()> {
    let path = run_restore(&args, paths)?;
    let name = file_name_of(&path)?;
    println!(
        "restored {} ({}) to {}",
        name,
        guess_mime(&name),
        path.display()
    );
    Ok(())
}

/// Writes a history entry back out. A file already holding the recorded
/// name gets a numbered sibling, the same as a fresh rename would.
fn run_restore(args: &RestoreArgs, paths: &AppPaths) -> Result<PathBuf> {
    let config = AppConfig::load_from(&paths.config_path)?;
    let session = RenameSession::new(load_history(&paths.history_dir)?);
    let Some(entry) = session.restore(args.index) else {
        bail!(
            "no history entry #{} (have {})",
            args.index,
            session.history().len()
        );
    };

    let dest = args.dest.clone().unwrap_or(config.target_dir);
    let listing = DirectoryListing::scan(&dest)?;
    let name = resolve_collision(&entry.final_name, |n| listing.contains(n))?;
    if name != entry.final_name {
        debug!(recorded = %entry.final_name, restored = %name, "restore target was taken");
    }
    Ok(write_new_file(&dest, &name, &entry.payload)?)
}

fn cmd_config_show(paths: &AppPaths) -> Result<()> {
    let config = AppConfig::load_from(&paths.config_path)?;
    println!("config file: {}", paths.config_path.display());
    println!("history: {}", paths.history_dir.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_set(paths: &AppPaths, key: &str, value: &str) -> Result<()> {
    let mut config = AppConfig::load_from(&paths.config_path)?;
    config.set(key, value)?;
    config.save_to(&paths.config_path)?;
    println!("{key} = {value} ({})", paths.config_path.display());
    Ok(())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("not a file path: {}", path.display()))
}

fn print_reports(reports: &[RenameReport]) {
    for report in reports {
        let summary = &report.summary;
        println!("{} -> {}", summary.name, report.final_name);
        println!("  type: {}", summary.mime_type);
        println!("  size: {}", summary.size_kb());
        if let Some((w, h)) = summary.dimensions {
            println!("  dimensions: {w}x{h}");
        }
        println!(
            "  processed at: {}",
            summary.processed_at.format("%Y-%m-%d %H:%M:%S")
        );
        if report.collided {
            println!("  name was taken, numbered to avoid overwriting");
        }
        if let Some(path) = &report.saved_to {
            println!("  saved to: {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_paths(root: &Path) -> AppPaths {
        AppPaths {
            config_path: root.join("config").join("config.toml"),
            history_dir: root.join("history"),
        }
    }

    fn rename_args(argv: &[&str]) -> RenameArgs {
        let cli = Cli::try_parse_from(argv).expect("parse args");
        match cli.command {
            Commands::Rename(args) => args,
            other => panic!("expected rename, got {other:?}"),
        }
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().expect("utf-8 path")
    }

    fn write_input(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
        fs::create_dir_all(dir).expect("create input dir");
        let path = dir.join(name);
        fs::write(&path, body).expect("write input");
        path
    }

    #[test]
    fn name_with_several_files_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let args = rename_args(&["rename-bot", "rename", "a.txt", "b.txt", "--name", "x.txt"]);

        let err = run_rename(&args, &test_paths(temp.path()))
            .err()
            .expect("several files with --name");
        assert!(err.to_string().contains("--name"));
        assert!(!temp.path().join("history").exists());
    }

    #[test]
    fn batch_reserves_names_between_files() {
        let temp = tempdir().expect("tempdir");
        let first = write_input(&temp.path().join("in1"), "x.txt", b"one");
        let second = write_input(&temp.path().join("in2"), "x.txt", b"two");
        let target = temp.path().join("out");
        let args = rename_args(&[
            "rename-bot",
            "rename",
            path_str(&first),
            path_str(&second),
            "--target-dir",
            path_str(&target),
            "--save",
        ]);

        let batch = run_rename(&args, &test_paths(temp.path())).expect("rename");
        let names: Vec<&str> = batch.reports.iter().map(|r| r.final_name.as_str()).collect();
        assert_eq!(names, ["x.txt", "x(1).txt"]);
        assert!(batch.saved);
        assert_eq!(fs::read(target.join("x.txt")).expect("read first"), b"one");
        assert_eq!(fs::read(target.join("x(1).txt")).expect("read second"), b"two");
    }

    #[test]
    fn dry_run_records_history_but_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        let input = write_input(&temp.path().join("in"), "IMG_20230101_123456.jpg", b"jpeg");
        let target = temp.path().join("out");
        let paths = test_paths(temp.path());
        let args = rename_args(&[
            "rename-bot",
            "rename",
            path_str(&input),
            "--target-dir",
            path_str(&target),
        ]);

        let batch = run_rename(&args, &paths).expect("rename");
        assert!(!batch.saved);
        assert_eq!(batch.reports[0].final_name, "Renamed_File.jpg");
        assert!(batch.reports[0].saved_to.is_none());
        assert!(!target.exists());

        let history = load_history(&paths.history_dir).expect("load history");
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(1)[0].final_name, "Renamed_File.jpg");
    }

    #[test]
    fn history_is_kept_for_files_before_a_failure() {
        let temp = tempdir().expect("tempdir");
        let good = write_input(&temp.path().join("in"), "a.txt", b"a");
        let missing = temp.path().join("in").join("missing.txt");
        let paths = test_paths(temp.path());
        let args = rename_args(&[
            "rename-bot",
            "rename",
            path_str(&good),
            path_str(&missing),
            "--target-dir",
            path_str(&temp.path().join("out")),
        ]);

        assert!(run_rename(&args, &paths).is_err());

        let history = load_history(&paths.history_dir).expect("load history");
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(1)[0].original_name, "a.txt");
    }

    #[test]
    fn restore_numbers_around_an_existing_file() {
        let temp = tempdir().expect("tempdir");
        let input = write_input(&temp.path().join("in"), "notes.txt", b"hello");
        let target = temp.path().join("out");
        let paths = test_paths(temp.path());
        let args = rename_args(&[
            "rename-bot",
            "rename",
            path_str(&input),
            "--target-dir",
            path_str(&target),
            "--save",
        ]);
        run_rename(&args, &paths).expect("rename");

        let restore = RestoreArgs {
            index: 1,
            dest: Some(target.clone()),
        };
        let restored = run_restore(&restore, &paths).expect("restore");
        assert_eq!(restored, target.join("notes(1).txt"));
        assert_eq!(fs::read(&restored).expect("read restored"), b"hello");
        assert_eq!(fs::read(target.join("notes.txt")).expect("read original"), b"hello");
    }

    #[test]
    fn restore_of_unknown_index_fails() {
        let temp = tempdir().expect("tempdir");
        let restore = RestoreArgs {
            index: 3,
            dest: Some(temp.path().join("out")),
        };
        assert!(run_restore(&restore, &test_paths(temp.path())).is_err());
    }

    #[test]
    fn config_set_is_persisted_and_used_by_rename() {
        let temp = tempdir().expect("tempdir");
        let paths = test_paths(temp.path());
        cmd_config_set(&paths, "case_format", "upper").expect("set case");
        cmd_config_set(&paths, "space_replacement", "hyphen").expect("set spaces");

        let config = AppConfig::load_from(&paths.config_path).expect("load config");
        assert_eq!(config.case_format, CaseFormat::Upper);
        assert_eq!(config.space_replacement, SpaceReplacement::Hyphen);

        let input = write_input(&temp.path().join("in"), "my notes.txt", b"n");
        let args = rename_args(&[
            "rename-bot",
            "rename",
            path_str(&input),
            "--target-dir",
            path_str(&temp.path().join("out")),
        ]);
        let batch = run_rename(&args, &paths).expect("rename");
        assert_eq!(batch.reports[0].final_name, "MY-NOTES.txt");
    }

    #[test]
    fn config_set_rejects_unknown_keys() {
        let temp = tempdir().expect("tempdir");
        let paths = test_paths(temp.path());
        assert!(cmd_config_set(&paths, "colour", "blue").is_err());
        assert!(!paths.config_path.exists());
    }
}
