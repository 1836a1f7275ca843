//! File rules
//!
//! `file` and `files` are datatypes: they settle the value into one `$file`
//! envelope or an array of them, optionally restricted to named kinds
//! (`file:image,pdf`). `mimes`, `image`, `video` and `audio` then inspect
//! what the datatype left behind.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use super::{BuiltinRule, Failure, Outcome, RuleContext, Step};
use crate::foundation::predicates::join_list;
use crate::foundation::{FileRef, GuardError, GuardResult};

// ============================================================================
// FILE KINDS
// ============================================================================

/// Compiled MIME patterns per file kind (`image`, `video`, `pdf`, ...).
#[derive(Debug, Clone, Default)]
pub struct FileKinds(IndexMap<String, Vec<Regex>>);

impl FileKinds {
    /// Compiles the pattern table from configuration.
    pub fn from_config(patterns: &IndexMap<String, Vec<String>>) -> GuardResult<Self> {
        let mut kinds = IndexMap::with_capacity(patterns.len());
        for (kind, sources) in patterns {
            let compiled = sources
                .iter()
                .map(|source| {
                    Regex::new(source).map_err(|e| {
                        GuardError::Config(format!("file pattern '{source}' for '{kind}': {e}"))
                    })
                })
                .collect::<GuardResult<Vec<_>>>()?;
            kinds.insert(kind.clone(), compiled);
        }
        Ok(Self(kinds))
    }

    /// `true` when `mime` matches one of the patterns of `kind`.
    /// Unknown kinds match nothing.
    #[must_use]
    pub fn matches(&self, kind: &str, mime: &str) -> bool {
        self.0
            .get(kind)
            .is_some_and(|patterns| patterns.iter().any(|p| p.is_match(mime)))
    }

    /// `true` when `mime` matches any of `kinds`.
    #[must_use]
    pub fn matches_any(&self, kinds: &[String], mime: &str) -> bool {
        kinds.iter().any(|kind| self.matches(kind, mime))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// ============================================================================
// DATATYPES
// ============================================================================

fn kinds_failure(kinds: &[String]) -> Failure {
    Failure::default()
        .variant("kinds")
        .with("values", join_list(kinds, ", ", " or "))
}

fn kinds_hold(ctx: &RuleContext<'_>, files: &[FileRef]) -> bool {
    ctx.args.is_empty() || files.iter().all(|f| ctx.kinds.matches_any(ctx.args, &f.mime))
}

/// A single file. Arrays and file lists are reduced to their last file.
pub fn file(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let Some(value) = ctx.value() else {
        return Outcome::check(false);
    };
    let single = ctx.inspector.file(value);
    let Some(files) = ctx.inspector.files(value) else {
        return Outcome::check(false);
    };
    if !kinds_hold(ctx, &files) {
        return Outcome::fail(kinds_failure(ctx.args));
    }
    match (single, files.last()) {
        (Some(_), _) => Outcome::pass(),
        (None, Some(last)) => Outcome::replacing(last.to_value(), Step::Pass),
        (None, None) => Outcome::check(false),
    }
}

/// One or more files, stored as an array of `$file` envelopes.
pub fn files(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let Some(found) = ctx.value().and_then(|v| ctx.inspector.files(v)) else {
        return Outcome::check(false);
    };
    if !kinds_hold(ctx, &found) {
        return Outcome::fail(kinds_failure(ctx.args));
    }
    let normalized = Value::Array(found.iter().map(FileRef::to_value).collect());
    if ctx.value() == Some(&normalized) {
        return Outcome::pass();
    }
    Outcome::replacing(normalized, Step::Pass)
}

// ============================================================================
// CONTENT
// ============================================================================

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// `mimes:image/png,pdf` - every file has one of the listed MIME types or
/// file extensions.
pub fn mimes(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let allowed = |file: &FileRef| {
        ctx.args.iter().any(|entry| {
            entry.eq_ignore_ascii_case(&file.mime)
                || file
                    .name
                    .as_deref()
                    .and_then(extension)
                    .is_some_and(|ext| ext == entry.trim_start_matches('.').to_ascii_lowercase())
        })
    };
    let ok = ctx
        .value()
        .and_then(|v| ctx.inspector.files(v))
        .is_some_and(|files| files.iter().all(allowed));
    Outcome::check_with(ok, || {
        let listed = ctx.args.join(", ");
        Failure::default()
            .with("values", listed.clone())
            .with("mimes", listed)
    })
}

/// `image`, `video`, `audio` - every file matches the kind of the same name.
pub fn kind(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let kind = match ctx.rule {
        BuiltinRule::Video => "video",
        BuiltinRule::Audio => "audio",
        _ => "image",
    };
    let ok = ctx
        .value()
        .and_then(|v| ctx.inspector.files(v))
        .is_some_and(|files| files.iter().all(|f| ctx.kinds.matches(kind, &f.mime)));
    Outcome::check(ok)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Harness, fails, passes};
    use super::super::{BuiltinRule, Step};
    use super::*;
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn png(name: &str) -> FileRef {
        FileRef::new(name, 100, "image/png")
    }

    fn pdf() -> FileRef {
        FileRef::new("report.PDF", 200, "application/pdf")
    }

    #[test]
    fn test_default_kinds_compile() {
        let kinds = FileKinds::from_config(&EngineConfig::default().file_patterns).unwrap();
        assert!(kinds.matches("image", "image/jpeg"));
        assert!(kinds.matches("video", "video/mp4"));
        assert!(!kinds.matches("image", "application/pdf"));
        assert!(!kinds.matches("spreadsheet", "image/png"));
        assert!(kinds.kinds().any(|k| k == "pdf"));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let mut patterns = IndexMap::new();
        patterns.insert("broken".to_owned(), vec!["(".to_owned()]);
        assert!(matches!(FileKinds::from_config(&patterns), Err(GuardError::Config(_))));
    }

    #[test]
    fn test_file_reduces_array_to_last() {
        let value = json!([png("a.png").to_value(), png("b.png").to_value()]);
        let outcome = Harness::new(json!({ "field": value }), &[]).run(BuiltinRule::File).unwrap();
        assert_eq!(outcome.replace, Some(png("b.png").to_value()));
        assert_eq!(outcome.step, Step::Pass);
    }

    #[test]
    fn test_file_rejects_plain_values() {
        let outcome = Harness::new(json!({"field": "a.png"}), &[]).run(BuiltinRule::File).unwrap();
        assert!(fails(&outcome));
    }

    #[test]
    fn test_file_kinds_failure_lists_kinds() {
        let h = Harness::new(json!({ "field": pdf().to_value() }), &["image", "video"]);
        let Step::Fail(failure) = h.run(BuiltinRule::File).unwrap().step else {
            panic!("expected failure");
        };
        assert_eq!(failure.variant.as_deref(), Some("kinds"));
        assert_eq!(failure.params.get("values").map(String::as_str), Some("image or video"));

        let h = Harness::new(json!({ "field": pdf().to_value() }), &["image", "pdf"]);
        assert!(passes(&h.run(BuiltinRule::File).unwrap()));
    }

    #[test]
    fn test_files_normalizes_to_array() {
        let list = FileRef::list_value(&[png("a.png"), pdf()]);
        let outcome = Harness::new(json!({ "field": list }), &[]).run(BuiltinRule::Files).unwrap();
        assert_eq!(outcome.replace, Some(json!([png("a.png").to_value(), pdf().to_value()])));

        let single = png("a.png").to_value();
        let outcome = Harness::new(json!({ "field": single }), &[]).run(BuiltinRule::Files).unwrap();
        assert_eq!(outcome.replace, Some(json!([png("a.png").to_value()])));
    }

    #[rstest]
    #[case(&["image/png", "application/pdf"], true)]
    #[case(&["png", "pdf"], true)]
    #[case(&["image/png"], false)]
    fn test_mimes(#[case] args: &[&str], #[case] ok: bool) {
        let value = json!([png("a.png").to_value(), pdf().to_value()]);
        let outcome = Harness::new(json!({ "field": value }), args).run(BuiltinRule::Mimes).unwrap();
        assert_eq!(passes(&outcome), ok);
    }

    #[rstest]
    #[case(BuiltinRule::Image, "image/gif", true)]
    #[case(BuiltinRule::Image, "image/svg+xml", false)]
    #[case(BuiltinRule::Video, "video/webm", true)]
    #[case(BuiltinRule::Audio, "video/webm", false)]
    fn test_kind_rules(#[case] rule: BuiltinRule, #[case] mime: &str, #[case] ok: bool) {
        let value = FileRef::new("x", 1, mime).to_value();
        let outcome = Harness::new(json!({ "field": value }), &[]).run(rule).unwrap();
        assert_eq!(passes(&outcome), ok);
    }
}
