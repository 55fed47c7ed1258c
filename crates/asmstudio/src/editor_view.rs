use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;

use crate::event_bus::Event;
use crate::text_buffer::TextBuffer;
use crate::views::View;

/// Source text plus the binary encoding derived from it. The binary is
/// assembled from the text at snapshot time, never cached across edits.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub text: String,
    pub binary: Vec<u8>,
}

/// What kind of file a load request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Assembly,
}

/// Parameters handed over by the open workflow.
#[derive(Debug, Clone)]
pub struct LoadParams {
    pub path: PathBuf,
    pub kind: FileKind,
}

const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// The editable program source. The only owner of program text; other
/// components see read-only `Program` snapshots.
pub struct EditorView {
    pub buffer: TextBuffer,
    last_published: String,
    diagnostic: Option<String>,
}

impl EditorView {
    pub fn new(tab_size: usize) -> Self {
        let mut buffer = TextBuffer::new();
        buffer.set_tab_size(tab_size);
        Self {
            buffer,
            last_published: String::new(),
            diagnostic: None,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.content()
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    pub fn mark_saved(&mut self) {
        self.buffer.mark_saved();
    }

    /// Most recent assembly failure, if the last snapshot did not encode.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Build a read-only snapshot of the current program. The binary is
    /// derived from the text as it is right now; a program that fails
    /// to assemble yields an empty binary and records the diagnostic.
    pub fn snapshot(&mut self) -> Program {
        let text = self.buffer.content();
        let binary = match asmcore::assemble(&text) {
            Ok(words) => {
                self.diagnostic = None;
                asmcore::words_to_bytes(&words)
            }
            Err(e) => {
                log::warn!("program does not assemble: {}", e);
                self.diagnostic = Some(e.to_string());
                Vec::new()
            }
        };
        Program { text, binary }
    }

    /// Snapshot and wrap in the change event the controller routes to
    /// the processor. Also remembers the published text so the
    /// controller can tell whether a re-publish is needed later.
    pub fn emit_program_changed(&mut self) -> Event {
        let program = self.snapshot();
        self.last_published = program.text.clone();
        Event::ProgramChanged(program)
    }

    pub fn has_unpublished_changes(&self) -> bool {
        self.buffer.content() != self.last_published
    }

    /// Replace the program with the contents of a file on disk.
    pub async fn load_file(&mut self, params: &LoadParams) -> Result<()> {
        let FileKind::Assembly = params.kind;
        let path = &params.path;

        let metadata = fs::metadata(path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
        if !metadata.is_file() {
            return Err(anyhow::anyhow!("{} is not a file", path.display()));
        }
        if metadata.len() > LARGE_FILE_THRESHOLD {
            log::warn!(
                "Large file detected ({} bytes): {}",
                metadata.len(),
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        if content.contains('\0') {
            return Err(anyhow::anyhow!(
                "{} looks like a binary file",
                path.display()
            ));
        }

        self.buffer.set_content(&content);
        self.diagnostic = None;
        log::info!("Successfully opened file: {}", path.display());
        Ok(())
    }

    /// Replace the program with already-loaded text (bundled examples).
    pub fn load_text(&mut self, source: &str) {
        self.buffer.set_content(source);
        self.diagnostic = None;
    }

    /// Reset to an empty, untitled program.
    pub fn new_program(&mut self) {
        self.buffer.set_content("");
        self.diagnostic = None;
    }
}

impl View for EditorView {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_snapshot_derives_binary_from_current_text() {
        let mut editor = EditorView::new(4);
        editor.buffer.set_content("li r1, 1\nhalt\n");
        let first = editor.snapshot();
        assert_eq!(first.binary.len(), 8);
        assert!(editor.diagnostic().is_none());

        // Edit, snapshot again: the binary must track the new text.
        editor.buffer.set_content("li r1, 1\nli r2, 2\nhalt\n");
        let second = editor.snapshot();
        assert_eq!(second.binary.len(), 12);
    }

    #[test]
    fn test_snapshot_records_diagnostic_for_bad_program() {
        let mut editor = EditorView::new(4);
        editor.buffer.set_content("bogus r1\n");
        let program = editor.snapshot();
        assert!(program.binary.is_empty());
        assert!(editor.diagnostic().unwrap().contains("bogus"));
    }

    #[test]
    fn test_emit_tracks_published_text() {
        let mut editor = EditorView::new(4);
        editor.buffer.set_content("halt\n");
        assert!(editor.has_unpublished_changes());

        let event = editor.emit_program_changed();
        assert_eq!(event.kind(), EventKind::ProgramChanged);
        assert!(!editor.has_unpublished_changes());

        editor.buffer.insert_char('#');
        assert!(editor.has_unpublished_changes());
    }

    #[tokio::test]
    async fn test_load_file_replaces_program() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "li r1, 9").unwrap();

        let mut editor = EditorView::new(4);
        let params = LoadParams {
            path: file.path().to_path_buf(),
            kind: FileKind::Assembly,
        };
        editor.load_file(&params).await.unwrap();
        assert_eq!(editor.text(), "li r1, 9\n");
        assert!(!editor.is_modified());
    }

    #[tokio::test]
    async fn test_load_file_missing_path_fails() {
        let mut editor = EditorView::new(4);
        let params = LoadParams {
            path: PathBuf::from("/no/such/file.s"),
            kind: FileKind::Assembly,
        };
        assert!(editor.load_file(&params).await.is_err());
    }

    #[test]
    fn test_new_program_clears_text() {
        let mut editor = EditorView::new(4);
        editor.buffer.set_content("halt\n");
        editor.new_program();
        assert!(editor.text().is_empty());
    }
}
