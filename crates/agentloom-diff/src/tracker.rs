//! The turn diff tracker.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{DiffError, DiffResult};

/// The kind of mutation a tool performed on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditAction {
    /// The file was created.
    Create,
    /// The file was overwritten in full.
    Overwrite,
    /// A range within the file was replaced.
    Replace,
    /// Content was inserted before a line.
    InsertBefore,
    /// Content was inserted after a line.
    InsertAfter,
    /// The file was deleted.
    Delete,
    /// The file was renamed/moved.
    Rename,
}

impl EditAction {
    fn as_str(self) -> &'static str {
        match self {
            EditAction::Create => "create",
            EditAction::Overwrite => "overwrite",
            EditAction::Replace => "replace",
            EditAction::InsertBefore => "insert_before",
            EditAction::InsertAfter => "insert_after",
            EditAction::Delete => "delete",
            EditAction::Rename => "rename",
        }
    }
}

impl std::fmt::Display for EditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file mutation recorded during a turn.
#[derive(Debug, Clone)]
pub struct FileEdit {
    /// The resolved absolute path.
    pub path: PathBuf,
    /// The tool that made this edit.
    pub tool_name: String,
    /// When the edit was recorded.
    pub timestamp: DateTime<Utc>,
    /// What kind of mutation this was.
    pub action: EditAction,
    /// The file's content before the mutation, if known.
    pub old_content: Option<String>,
    /// The file's content after the mutation, or (for `Rename`) the
    /// destination path string.
    pub new_content: Option<String>,
    /// The line range the edit touched, if applicable.
    pub line_range: Option<(usize, usize)>,
}

/// Accumulates file edits performed within a single turn.
pub struct TurnDiffTracker {
    turn_id: u64,
    edits: Vec<FileEdit>,
    locked_paths: HashSet<PathBuf>,
    conflicts: Vec<String>,
    undone: bool,
}

impl TurnDiffTracker {
    /// Start a new tracker for the given turn.
    pub fn new(turn_id: u64) -> Self {
        Self {
            turn_id,
            edits: Vec::new(),
            locked_paths: HashSet::new(),
            conflicts: Vec::new(),
            undone: false,
        }
    }

    /// The turn this tracker belongs to.
    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    /// Lock a file to guard against concurrent writes. Errors if already
    /// locked.
    pub fn lock_file(&mut self, path: impl AsRef<Path>) -> DiffResult<()> {
        let resolved = resolve(path.as_ref());
        if !self.locked_paths.insert(resolved.clone()) {
            return Err(DiffError::AlreadyLocked(resolved));
        }
        Ok(())
    }

    /// Release a file lock. A no-op if the path was not locked.
    pub fn unlock_file(&mut self, path: impl AsRef<Path>) {
        self.locked_paths.remove(&resolve(path.as_ref()));
    }

    /// Record an edit made by a tool, after its mutation has already
    /// succeeded. Detects a conflict when this edit's `old_content` differs
    /// from the most recent prior edit's `new_content` for the same path.
    #[allow(clippy::too_many_arguments)]
    pub fn record_edit(
        &mut self,
        path: impl AsRef<Path>,
        tool_name: impl Into<String>,
        action: EditAction,
        old_content: Option<String>,
        new_content: Option<String>,
        line_range: Option<(usize, usize)>,
    ) {
        let resolved = resolve(path.as_ref());
        let tool_name = tool_name.into();

        if let Some(last_with_content) = self
            .edits_for_path(&resolved)
            .into_iter()
            .rev()
            .find(|e| e.new_content.is_some())
        {
            if let (Some(prior_new), Some(ref this_old)) =
                (&last_with_content.new_content, &old_content)
            {
                if prior_new != this_old {
                    self.conflicts.push(format!(
                        "{}: prior new content diverges from current old content (tool={tool_name})",
                        resolved.display()
                    ));
                }
            }
        }

        self.edits.push(FileEdit {
            path: resolved,
            tool_name,
            timestamp: Utc::now(),
            action,
            old_content,
            new_content,
            line_range,
        });
    }

    /// All edits recorded for a resolved path, in recording order.
    pub fn edits_for_path(&self, path: &Path) -> Vec<&FileEdit> {
        let resolved = resolve(path);
        self.edits.iter().filter(|e| e.path == resolved).collect()
    }

    /// Human-readable per-path summary of actions and tools.
    pub fn generate_summary(&self) -> String {
        if self.edits.is_empty() {
            return "No files modified this turn.".to_string();
        }

        let mut grouped: BTreeMap<&Path, Vec<&FileEdit>> = BTreeMap::new();
        for edit in &self.edits {
            grouped.entry(edit.path.as_path()).or_default().push(edit);
        }

        let mut lines = vec![format!("Turn {} modifications:", self.turn_id)];
        for (path, edits) in grouped {
            let mut actions: Vec<String> = edits.iter().map(|e| e.action.to_string()).collect();
            actions.sort();
            actions.dedup();
            let mut tools: Vec<String> = edits.iter().map(|e| e.tool_name.clone()).collect();
            tools.sort();
            tools.dedup();
            lines.push(format!(
                "  {}: {} (via {})",
                path.display(),
                actions.join(", "),
                tools.join(", ")
            ));
        }
        lines.join("\n")
    }

    /// A unified diff across every path with both an old and new content
    /// snapshot.
    pub fn generate_unified_diff(&self) -> Option<String> {
        let mut paths: Vec<&Path> = self.edits.iter().map(|e| e.path.as_path()).collect();
        paths.sort();
        paths.dedup();

        let mut diffs = Vec::new();
        for path in paths {
            let path_edits = self.edits_for_path(path);
            let old_content = path_edits.iter().find_map(|e| e.old_content.clone());
            let new_content = path_edits
                .iter()
                .rev()
                .find_map(|e| e.new_content.clone());

            let (Some(old), Some(new)) = (old_content, new_content) else {
                continue;
            };

            let diff = similar::TextDiff::from_lines(&old, &new)
                .unified_diff()
                .header(&format!("a/{}", path.display()), &format!("b/{}", path.display()))
                .to_string();
            if !diff.is_empty() {
                diffs.push(diff);
            }
        }

        if diffs.is_empty() {
            None
        } else {
            Some(diffs.join("\n"))
        }
    }

    /// A textual report of any recorded conflicts, or `None` if there were
    /// none.
    pub fn generate_conflict_report(&self) -> Option<String> {
        if self.conflicts.is_empty() {
            return None;
        }
        let mut lines = vec![format!("Turn {} conflict warnings:", self.turn_id)];
        lines.extend(self.conflicts.iter().map(|c| format!("  - {c}")));
        Some(lines.join("\n"))
    }

    /// Undo every edit in this turn, in reverse order. Idempotent: a second
    /// call returns an empty operation list and touches nothing.
    pub fn undo(&mut self) -> DiffResult<Vec<String>> {
        if self.undone {
            return Ok(Vec::new());
        }

        let mut operations = Vec::new();
        for edit in self.edits.iter().rev() {
            match edit.action {
                EditAction::Create if edit.old_content.is_none() => {
                    if edit.path.exists() {
                        std::fs::remove_file(&edit.path).map_err(|e| io_err(&edit.path, e))?;
                        operations.push(format!("removed {}", edit.path.display()));
                    }
                }
                EditAction::Delete => {
                    if let Some(old) = &edit.old_content {
                        if let Some(parent) = edit.path.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| io_err(&edit.path, e))?;
                        }
                        std::fs::write(&edit.path, old).map_err(|e| io_err(&edit.path, e))?;
                        operations.push(format!("restored {}", edit.path.display()));
                    }
                }
                EditAction::Rename => {
                    let Some(dest_str) = edit.new_content.as_deref().filter(|s| !s.is_empty())
                    else {
                        continue;
                    };
                    let mut candidates = vec![PathBuf::from(dest_str)];
                    let dest_path = PathBuf::from(dest_str);
                    if !dest_path.is_absolute() {
                        if let Some(parent) = edit.path.parent() {
                            candidates.push(resolve(&parent.join(&dest_path)));
                        }
                    }
                    if let Ok(canon) = dest_path.canonicalize() {
                        candidates.push(canon);
                    }

                    let mut moved = false;
                    for candidate in candidates {
                        if candidate.exists() && std::fs::rename(&candidate, &edit.path).is_ok() {
                            operations.push(format!(
                                "renamed {} -> {}",
                                candidate.display(),
                                edit.path.display()
                            ));
                            moved = true;
                            break;
                        }
                    }
                    if !moved {
                        operations.push(format!("rename undo failed for {}", edit.path.display()));
                    }
                }
                _ => {
                    if let Some(old) = &edit.old_content {
                        if let Some(parent) = edit.path.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| io_err(&edit.path, e))?;
                        }
                        std::fs::write(&edit.path, old).map_err(|e| io_err(&edit.path, e))?;
                        operations.push(format!("reverted {}", edit.path.display()));
                    } else if edit.path.exists() {
                        std::fs::remove_file(&edit.path).map_err(|e| io_err(&edit.path, e))?;
                        operations.push(format!("removed {}", edit.path.display()));
                    }
                }
            }
        }

        self.undone = true;
        Ok(operations)
    }
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn io_err(path: &Path, source: std::io::Error) -> DiffError {
    DiffError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lock_rejects_double_lock() {
        let mut tracker = TurnDiffTracker::new(1);
        tracker.lock_file("/tmp/a.txt").unwrap();
        let err = tracker.lock_file("/tmp/a.txt").unwrap_err();
        assert!(matches!(err, DiffError::AlreadyLocked(_)));
    }

    #[test]
    fn conflict_detected_on_diverging_old_content() {
        let mut tracker = TurnDiffTracker::new(1);
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "v1").unwrap();

        tracker.record_edit(
            &path,
            "writer",
            EditAction::Overwrite,
            Some("v0".into()),
            Some("v1".into()),
            None,
        );
        tracker.record_edit(
            &path,
            "writer2",
            EditAction::Overwrite,
            Some("different".into()),
            Some("v2".into()),
            None,
        );
        assert!(tracker.generate_conflict_report().is_some());
    }

    #[test]
    fn undo_create_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.txt");
        std::fs::write(&path, "content").unwrap();

        let mut tracker = TurnDiffTracker::new(1);
        tracker.record_edit(&path, "writer", EditAction::Create, None, Some("content".into()), None);
        let ops = tracker.undo().unwrap();
        assert_eq!(ops.len(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn undo_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.txt");
        std::fs::write(&path, "content").unwrap();

        let mut tracker = TurnDiffTracker::new(1);
        tracker.record_edit(&path, "writer", EditAction::Create, None, Some("content".into()), None);
        tracker.undo().unwrap();
        let second = tracker.undo().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn undo_rename_moves_destination_back() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        std::fs::write(&src, "hi").unwrap();
        std::fs::rename(&src, &dest).unwrap();

        let mut tracker = TurnDiffTracker::new(1);
        tracker.record_edit(
            &src,
            "renamer",
            EditAction::Rename,
            None,
            Some(dest.to_string_lossy().to_string()),
            None,
        );
        let ops = tracker.undo().unwrap();
        assert_eq!(ops.len(), 1);
        assert!(src.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn unified_diff_needs_both_snapshots() {
        let mut tracker = TurnDiffTracker::new(1);
        tracker.record_edit(
            "/tmp/only_new.txt",
            "writer",
            EditAction::Create,
            None,
            Some("new content".into()),
            None,
        );
        assert!(tracker.generate_unified_diff().is_none());
    }

    #[test]
    fn summary_lists_no_files_when_empty() {
        let tracker = TurnDiffTracker::new(1);
        assert_eq!(tracker.generate_summary(), "No files modified this turn.");
    }
}
