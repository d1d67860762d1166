mod collision;
mod config;
mod extension;
mod format;
mod history;
mod name;
mod output;
mod pipeline;
mod sanitize;
mod session;
mod summary;

pub use collision::{
    resolve_collision, try_resolve_collision, try_resolve_collision_within, CollisionError,
    DirectoryListing, MAX_NUMBERED_ATTEMPTS,
};
pub use config::{app_paths, default_target_dir, AppConfig, AppPaths, CONFIG_KEYS};
pub use extension::{ensure_extension, extension_for_mime, ExtensionOutcome};
pub use format::{apply_case_format, replace_spaces, CaseFormat, SpaceReplacement};
pub use history::{load_history, save_history, HistoryEntry, HistoryStore, HISTORY_LIMIT};
pub use name::{split_name, NameComponents};
pub use output::{write_new_file, WriteError};
pub use pipeline::{execute, try_execute, RenameOutcome, RenameRequest};
pub use sanitize::{suggest_name, suggest_name_with_fallback, DEFAULT_FALLBACK_BASE};
pub use session::{RenameOptions, RenameSession, SessionError, Upload};
pub use summary::{guess_mime, FileSummary, FALLBACK_MIME};
