//! Per-translation-unit rewrite engine.
//!
//! Ties the pieces together for one source buffer: parse, index declarations,
//! discover cast sites, classify each site once, plan its edits, collect every
//! plan in one [`EditLog`] and apply the log in a single pass.

use crate::classify::{classify, CastKind};
use crate::cst::{discover_casts, CstError, CstParser, DeclarationIndex, DiscoveryOptions};
use crate::fix::{EditLog, RewriteError};
use crate::plan::{plan, SkipReason};
use crate::types::{CType, CTypeModel};
use serde::Serialize;

/// Options for [`rewrite_source`].
#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions {
    /// Re-parse the result and reject it if it introduced syntax errors.
    pub verify: bool,
    /// Leave casts inside arguments of function-like macros untouched.
    pub skip_macro_arguments: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            verify: true,
            skip_macro_arguments: true,
        }
    }
}

/// One rewritten cast.
#[derive(Debug, Clone, Serialize)]
pub struct CastRewrite {
    /// 1-based line of the cast.
    pub line: usize,
    /// Chosen keyword.
    pub kind: CastKind,
    /// Cast prefix as written, e.g. `(char *)`.
    pub original: String,
    /// Text that replaces the prefix, e.g. `const_cast<char *>(`.
    pub replacement: String,
    /// Whether a closing parenthesis is inserted after the operand.
    pub wraps_operand: bool,
    /// Operand type used for classification.
    pub source_type: CType,
    /// Destination type used for classification.
    pub dest_type: CType,
}

/// A cast that was left untouched.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCast {
    /// 1-based line of the cast.
    pub line: usize,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of rewriting one translation unit.
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    /// Rewritten casts, in document order.
    pub rewrites: Vec<CastRewrite>,
    /// Casts that were left untouched.
    pub skipped: Vec<SkippedCast>,
    /// The rewritten source.
    #[serde(skip)]
    pub output: String,
}

impl FileRewrite {
    /// Whether applying the rewrite changes the file.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.rewrites.is_empty()
    }

    /// Number of casts rewritten with the given keyword.
    #[must_use]
    pub fn count(&self, kind: CastKind) -> usize {
        self.rewrites.iter().filter(|r| r.kind == kind).count()
    }
}

/// Errors that abort the rewrite of a translation unit.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The source could not be parsed at all.
    #[error(transparent)]
    Parse(#[from] CstError),
    /// The collected edits could not be applied.
    #[error("edit application failed: {0}")]
    Apply(#[from] RewriteError),
    /// The rewritten text no longer parses although the input did.
    #[error("rewritten source introduces syntax errors")]
    Verification,
}

/// Rewrites every C-style cast in `source`.
///
/// Sites are independent: a site that cannot be rewritten is recorded in
/// [`FileRewrite::skipped`] and the others proceed. Only failures of the
/// edit log as a whole abort the file.
///
/// # Errors
///
/// Returns [`EngineError`] when the source cannot be parsed, when edits
/// conflict, or when verification rejects the result.
pub fn rewrite_source(source: &str, options: &RewriteOptions) -> Result<FileRewrite, EngineError> {
    let mut parser = CstParser::new()?;
    let tree = parser.parse(source)?;
    let index = DeclarationIndex::build(&tree);
    let model = CTypeModel::new(index.aliases().clone());
    let discovery = discover_casts(
        &tree,
        &index,
        &model,
        DiscoveryOptions {
            skip_macro_arguments: options.skip_macro_arguments,
        },
    );

    let mut log = EditLog::new(source);
    let mut rewrites = Vec::new();
    let mut skipped: Vec<SkippedCast> = discovery
        .malformed_lines
        .iter()
        .map(|&line| SkippedCast {
            line,
            reason: SkipReason::Malformed,
        })
        .collect();

    for site in &discovery.sites {
        let kind = classify(&model, &site.source_type, &site.dest_type);
        match plan(site, kind) {
            Ok(site_plan) => {
                rewrites.push(CastRewrite {
                    line: site.line,
                    kind,
                    original: tree.slice(site.lparen, site.rparen + 1).to_owned(),
                    replacement: site_plan.edits()[0].replacement.clone(),
                    wraps_operand: site_plan.wraps_operand(),
                    source_type: site.source_type.clone(),
                    dest_type: site.dest_type.clone(),
                });
                log.extend(site_plan.into_edits());
            }
            Err(reason) => skipped.push(SkippedCast {
                line: site.line,
                reason,
            }),
        }
    }
    skipped.sort_by_key(|s| s.line);

    let output = log.apply()?;

    if options.verify && !rewrites.is_empty() && !tree.has_errors() {
        let rewritten = parser.parse(&output)?;
        if rewritten.has_errors() {
            return Err(EngineError::Verification);
        }
    }

    Ok(FileRewrite {
        rewrites,
        skipped,
        output,
    })
}
