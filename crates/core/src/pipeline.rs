use crate::collision::{try_resolve_collision, CollisionError};
use crate::extension::{ensure_extension, ExtensionOutcome};
use crate::format::{apply_case_format, replace_spaces, CaseFormat, SpaceReplacement};
use crate::sanitize::suggest_name;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    pub original_name: String,
    pub mime_type: String,
    pub byte_len: u64,
    pub candidate_name: String,
    pub case_format: CaseFormat,
    pub space_replacement: SpaceReplacement,
}

impl RenameRequest {
    /// Starts a request whose candidate is the suggested clean-up of
    /// `original_name`.
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        byte_len: u64,
    ) -> Self {
        let original_name = original_name.into();
        Self {
            candidate_name: suggest_name(&original_name),
            original_name,
            mime_type: mime_type.into(),
            byte_len,
            case_format: CaseFormat::None,
            space_replacement: SpaceReplacement::Keep,
        }
    }

    pub fn with_candidate(mut self, candidate_name: impl Into<String>) -> Self {
        self.candidate_name = candidate_name.into();
        self
    }

    pub fn with_case_format(mut self, case_format: CaseFormat) -> Self {
        self.case_format = case_format;
        self
    }

    pub fn with_space_replacement(mut self, space_replacement: SpaceReplacement) -> Self {
        self.space_replacement = space_replacement;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub final_name: String,
    pub extension: ExtensionOutcome,
    /// True when the formatted name was taken and a `(n)` suffix was added.
    pub collided: bool,
}

/// Runs the rename stages in order: extension, case, spaces, collision.
///
/// The extension is inferred first so that it goes through the same case and
/// space handling as a user-typed one. Case formatting leaves it untouched
/// either way; space replacement does not.
pub fn execute(
    request: &RenameRequest,
    mut exists: impl FnMut(&str) -> bool,
) -> Result<RenameOutcome, CollisionError> {
    try_execute(request, |name| Ok(exists(name)))
}

pub fn try_execute<E>(
    request: &RenameRequest,
    exists: impl FnMut(&str) -> Result<bool, E>,
) -> Result<RenameOutcome, CollisionError<E>> {
    let (mut name, extension) = ensure_extension(&request.candidate_name, &request.mime_type);

    if request.case_format != CaseFormat::None {
        name = apply_case_format(&name, request.case_format);
    }
    if request.space_replacement != SpaceReplacement::Keep {
        name = replace_spaces(&name, request.space_replacement);
    }

    let final_name = try_resolve_collision(&name, exists)?;
    let collided = final_name != name;
    debug!(
        original = %request.original_name,
        candidate = %request.candidate_name,
        final_name = %final_name,
        collided,
        "rename pipeline finished"
    );

    Ok(RenameOutcome {
        final_name,
        extension,
        collided,
    })
}
