//! Commit message synthesis from the staged diff.

use std::fmt::Write as _;

/// Build a commit message from `git diff --cached --name-status` output.
///
/// Change lines whose path starts with one of `excluded_prefixes` (the raw
/// sidecar directories) are ignored — sidecar churn is noise, only
/// human-editable content is worth summarizing. When nothing else is staged
/// the message collapses to the literal `"Minor update"`, which means a
/// sidecar-only commit can land with a near-meaningless message; accepted
/// tradeoff, not a bug.
pub fn summarize_name_status(
    name_status: &str,
    excluded_prefixes: &[&str],
    max_files: usize,
) -> String {
    let mut created = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();
    let mut renamed = Vec::new();

    for line in name_status.lines() {
        let mut fields = line.split('\t');
        let Some(status) = fields.next() else { continue };
        let Some(path) = fields.next() else { continue };
        if status.is_empty() || path.is_empty() {
            continue;
        }

        // Renames carry both paths; exclusion applies to the new path.
        let effective_path = if status.starts_with('R') {
            fields.next().unwrap_or(path)
        } else {
            path
        };
        if excluded_prefixes
            .iter()
            .any(|prefix| effective_path.starts_with(prefix))
        {
            continue;
        }

        match status.chars().next() {
            Some('A') => created.push(path.to_string()),
            Some('M') => modified.push(path.to_string()),
            Some('D') => deleted.push(path.to_string()),
            Some('R') => renamed.push(format!("{path} -> {effective_path}")),
            _ => {}
        }
    }

    let groups = [
        ("created", created),
        ("modified", modified),
        ("deleted", deleted),
        ("renamed", renamed),
    ];
    if groups.iter().all(|(_, files)| files.is_empty()) {
        return "Minor update".to_string();
    }

    let mut parts = Vec::new();
    for (label, files) in &groups {
        if files.is_empty() {
            continue;
        }
        let mut part = format!("{label} {}: ", files.len());
        let shown: Vec<&str> = files.iter().take(max_files).map(String::as_str).collect();
        let _ = write!(part, "{}", shown.join(", "));
        if files.len() > max_files {
            part.push('…');
        }
        parts.push(part);
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_DIRS: [&str; 2] = ["scriptsraw/", "snippetsraw/"];

    #[test]
    fn groups_changes_by_type() {
        let diff = "A\tscripts/new.ps1\nM\tscripts/old.py\nD\tsnippets/gone.sh";
        let message = summarize_name_status(diff, &RAW_DIRS, 5);
        assert_eq!(
            message,
            "created 1: scripts/new.ps1; modified 1: scripts/old.py; deleted 1: snippets/gone.sh"
        );
    }

    #[test]
    fn raw_directory_changes_are_excluded_from_summary() {
        let diff = "A\tscripts/a.ps1\nA\tscripts/b.py\nM\tscriptsraw/7 - a.json";
        let message = summarize_name_status(diff, &RAW_DIRS, 5);
        assert_eq!(message, "created 2: scripts/a.ps1, scripts/b.py");
    }

    #[test]
    fn raw_only_diff_collapses_to_minor_update() {
        let diff = "M\tscriptsraw/7 - a.json\nM\tsnippetsraw/3 - b.json";
        assert_eq!(summarize_name_status(diff, &RAW_DIRS, 5), "Minor update");
    }

    #[test]
    fn empty_diff_is_minor_update() {
        assert_eq!(summarize_name_status("", &RAW_DIRS, 5), "Minor update");
    }

    #[test]
    fn renames_show_both_paths() {
        let diff = "R100\tscripts/old.ps1\tscripts/new.ps1";
        assert_eq!(
            summarize_name_status(diff, &RAW_DIRS, 5),
            "renamed 1: scripts/old.ps1 -> scripts/new.ps1"
        );
    }

    #[test]
    fn long_file_lists_are_truncated() {
        let diff = "A\ta\nA\tb\nA\tc\nA\td\nA\te\nA\tf";
        let message = summarize_name_status(diff, &[], 5);
        assert_eq!(message, "created 6: a, b, c, d, e…");
    }
}
