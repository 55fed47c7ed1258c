use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::path::PathBuf;

use crate::config::Config;
use crate::editor_view::{EditorView, FileKind, LoadParams};
use crate::event_bus::{Event, EventBus, EventKind};
use crate::examples_catalog::ExamplesCatalog;
use crate::file_manager::FileManager;
use crate::memory_view::MemoryView;
use crate::processor_view::ProcessorView;
use crate::ui_state::{Mode, PathPurpose, PendingAction, UiState};
use crate::views::{View, ViewId, Views};

/// Which file, if any, the current program is associated with. Mutated
/// only here: the save-as workflow sets the path, New clears it.
pub struct Session {
    pub current_file: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Self {
        Self { current_file: None }
    }

    pub fn display_name(&self) -> String {
        match &self.current_file {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => "[untitled]".to_string(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// How the user answered a save confirmation.
enum ConfirmChoice {
    Save,
    Discard,
    Cancel,
}

/// The session controller: owns the views, the event routing table and
/// the file workflows. All cross-view effects pass through `route`.
pub struct App {
    pub config: Config,
    pub session: Session,
    pub views: Views,
    pub ui: UiState,
    pub file_manager: FileManager,
    pub catalog: ExamplesCatalog,
    bus: EventBus<Views>,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let cpu = asmcore::Cpu::new(config.memory.size_bytes);
        let views = Views::new(
            EditorView::new(config.editor.tab_size),
            ProcessorView::new(cpu, config.run.max_steps),
            MemoryView::new(config.memory.words_per_row),
        );

        let mut app = Self {
            config,
            session: Session::new(),
            views,
            ui: UiState::new(),
            file_manager: FileManager::new(),
            catalog: ExamplesCatalog::bundled(),
            bus: EventBus::new(),
        };
        app.wire_routes();
        Ok(app)
    }

    /// The fixed routing table. Registered once; delivery order within
    /// an event kind is the registration order below.
    fn wire_routes(&mut self) {
        self.bus.subscribe(
            EventKind::ProgramChanged,
            Box::new(|views, event| {
                if let Event::ProgramChanged(program) = event {
                    views.processor.reload(program)?;
                }
                Ok(Vec::new())
            }),
        );
        // Registered after the reload handler so a visible Memory view
        // always refreshes from the newly loaded image.
        self.bus.subscribe(
            EventKind::ProgramChanged,
            Box::new(|views, _| {
                if views.active == ViewId::Memory {
                    views.memory.update(views.processor.cpu());
                }
                Ok(Vec::new())
            }),
        );
        self.bus.subscribe(
            EventKind::ExecutionStepped,
            Box::new(|views, _| {
                views.memory.update(views.processor.cpu());
                Ok(Vec::new())
            }),
        );
        self.bus.subscribe(
            EventKind::ExecutionExited,
            Box::new(|views, event| {
                if let Event::ExecutionExited(code) = event {
                    views.processor.on_finished(*code);
                }
                Ok(Vec::new())
            }),
        );
        self.bus.subscribe(
            EventKind::ViewActivated,
            Box::new(|views, event| {
                if let Event::ViewActivated(ViewId::Memory) = event {
                    views.memory.update(views.processor.cpu());
                }
                Ok(Vec::new())
            }),
        );
        self.bus.subscribe(
            EventKind::ResetRequested,
            Box::new(|views, _| {
                views.processor.reset();
                Ok(Vec::new())
            }),
        );
        self.bus.subscribe(
            EventKind::ReloadRequested,
            Box::new(|views, _| Ok(vec![views.editor.emit_program_changed()])),
        );
        self.bus.subscribe(
            EventKind::LogLine,
            Box::new(|views, event| {
                if let Event::LogLine(line) = event {
                    views.processor.append_log(line);
                }
                Ok(Vec::new())
            }),
        );
    }

    /// Publish an event and every follow-up it produces. Handler faults
    /// are collected, never short-circuit delivery, and surface only
    /// after the queue drains.
    pub fn route(&mut self, event: Event) -> Result<()> {
        let mut queue = VecDeque::from([event]);
        let mut failures = Vec::new();

        while let Some(event) = queue.pop_front() {
            let mut follow_ups = Vec::new();
            if let Err(e) = self.bus.publish(&mut self.views, &event, &mut follow_ups) {
                failures.push(e);
            }
            queue.extend(follow_ups);
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            n => {
                let joined = failures
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(anyhow::anyhow!("{} event deliveries failed: {}", n, joined))
            }
        }
    }

    fn route_and_report(&mut self, event: Event) {
        if let Err(e) = self.route(event) {
            log::error!("Event delivery failed: {}", e);
            self.ui.set_error(e.to_string());
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.views.editor.is_modified()
    }

    pub fn should_quit(&self) -> bool {
        self.ui.should_quit()
    }

    pub fn update_status(&mut self) {
        self.ui.update_status();
    }

    /// Switch the visible view. Leaving the editor with edits the
    /// processor has not seen re-publishes the program first.
    pub fn set_active_view(&mut self, id: ViewId) {
        if id == self.views.active {
            return;
        }
        if self.views.active == ViewId::Editor && self.views.editor.has_unpublished_changes() {
            let event = self.views.editor.emit_program_changed();
            self.route_and_report(event);
        }

        let previous = self.views.active;
        self.views.view_mut(previous).deactivate();
        self.views.active = id;
        self.views.view_mut(id).activate();
        self.route_and_report(Event::ViewActivated(id));
    }

    // ---- New / Open / Save / SaveAs workflows -------------------------

    /// Start the New Program workflow. Unsaved work gates the reset
    /// behind a three-way confirmation.
    pub fn new_program_requested(&mut self) {
        let text_empty = self.views.editor.buffer.is_empty();
        match &self.session.current_file {
            Some(path) => {
                let prompt = format!(
                    "Save program \"{}\" before creating a new file?",
                    path.display()
                );
                self.ui.enter_confirm(prompt, PendingAction::NewProgram);
            }
            None if !text_empty => {
                self.ui.enter_confirm(
                    "Save program before creating a new file?".to_string(),
                    PendingAction::NewProgram,
                );
            }
            None => self.complete_new_program(),
        }
    }

    fn complete_new_program(&mut self) {
        self.session.current_file = None;
        self.views.editor.new_program();
        let event = self.views.editor.emit_program_changed();
        self.route_and_report(event);
        self.ui.set_info("New program".to_string());
    }

    /// Start the Open workflow: the path prompt is the modal chooser.
    pub fn open_requested(&mut self) {
        self.ui.enter_path_input(PathPurpose::Open);
    }

    /// Hand chooser parameters to the editor, then publish the change.
    pub async fn load_program(&mut self, params: LoadParams) {
        match self.views.editor.load_file(&params).await {
            Ok(()) => {
                let event = self.views.editor.emit_program_changed();
                self.route_and_report(event);
                self.ui
                    .set_success(format!("Loaded {}", params.path.display()));
            }
            Err(e) => {
                log::error!("Failed to load '{}': {}", params.path.display(), e);
                self.ui.set_error(e.to_string());
            }
        }
    }

    /// Save to the associated file, or fall through to Save As when
    /// there is none yet.
    pub async fn save_program(&mut self) {
        let Some(path) = self.session.current_file.clone() else {
            self.ui
                .enter_path_input(PathPurpose::SaveAs { then: None });
            return;
        };

        let program = self.views.editor.snapshot();
        let binary_path = FileManager::derived_binary_path(&path);

        // The two writes are independent: one failing neither blocks
        // the other nor aborts the operation.
        let text_result = self.file_manager.write_text(&path, &program.text).await;
        let binary_result = self
            .file_manager
            .write_binary(&binary_path, &program.binary)
            .await;

        if text_result.is_ok() {
            self.views.editor.mark_saved();
        }
        match (&text_result, &binary_result) {
            (Ok(()), Ok(())) => {
                self.ui
                    .set_success(format!("Wrote {}", self.session.display_name()));
            }
            _ => {
                let problems: Vec<String> = [text_result, binary_result]
                    .into_iter()
                    .filter_map(|r| r.err().map(|e| e.to_string()))
                    .collect();
                log::error!("Save incomplete: {}", problems.join("; "));
                self.ui
                    .set_warning(format!("Save incomplete: {}", problems.join("; ")));
            }
        }
    }

    /// Start the Save As workflow.
    pub fn save_as_requested(&mut self) {
        self.ui
            .enter_path_input(PathPurpose::SaveAs { then: None });
    }

    pub fn examples_requested(&mut self) {
        if self.catalog.is_empty() {
            self.ui.set_info("No bundled examples".to_string());
        } else {
            self.ui.enter_example_picker();
        }
    }

    /// Start the quit workflow; unsaved edits gate it behind the same
    /// three-way confirmation as New.
    pub fn quit_requested(&mut self) {
        if self.is_dirty() {
            self.ui
                .enter_confirm("Save changes before exit?".to_string(), PendingAction::Quit);
        } else {
            self.ui.quit();
        }
    }

    async fn finish_pending(&mut self, action: PendingAction) {
        match action {
            PendingAction::NewProgram => self.complete_new_program(),
            PendingAction::Quit => self.ui.quit(),
        }
    }

    async fn resolve_confirm(&mut self, choice: ConfirmChoice) {
        let Mode::Confirm { then, .. } = self.ui.mode.clone() else {
            return;
        };
        self.ui.back_to_view();

        match choice {
            ConfirmChoice::Cancel => {
                self.ui.set_info("Cancelled".to_string());
            }
            ConfirmChoice::Discard => self.finish_pending(then).await,
            ConfirmChoice::Save => {
                if self.session.current_file.is_some() {
                    self.save_program().await;
                    self.finish_pending(then).await;
                } else {
                    // Saving first needs a target; the pending action
                    // resumes after the chooser confirms.
                    self.ui
                        .enter_path_input(PathPurpose::SaveAs { then: Some(then) });
                }
            }
        }
    }

    async fn confirm_path_input(&mut self) {
        let Mode::PathInput { purpose } = self.ui.mode.clone() else {
            return;
        };
        let input = self.ui.input.trim().to_string();
        if input.is_empty() {
            self.ui.set_warning("No file name given".to_string());
            return;
        }
        self.ui.back_to_view();

        match purpose {
            PathPurpose::Open => {
                let params = LoadParams {
                    path: PathBuf::from(input),
                    kind: FileKind::Assembly,
                };
                self.load_program(params).await;
            }
            PathPurpose::SaveAs { then } => {
                let path = FileManager::ensure_source_extension(PathBuf::from(input));
                self.session.current_file = Some(path);
                self.save_program().await;
                if let Some(action) = then {
                    self.finish_pending(action).await;
                }
            }
        }
    }

    fn cancel_modal(&mut self) {
        self.ui.back_to_view();
        self.ui.set_info("Cancelled".to_string());
    }

    fn confirm_example(&mut self) {
        let Some(entry) = self.catalog.get(self.ui.picker_index) else {
            self.cancel_modal();
            return;
        };
        let (name, source) = (entry.name, entry.source);
        self.ui.back_to_view();
        self.views.editor.load_text(source);
        let event = self.views.editor.emit_program_changed();
        self.route_and_report(event);
        self.ui.set_success(format!("Loaded example '{}'", name));
    }

    // ---- Execution actions (Processor view) ---------------------------

    fn processor_step(&mut self) {
        if self.views.processor.is_finished() {
            self.ui
                .set_info("Program has exited; reset or reload to run again".to_string());
            return;
        }
        for event in self.views.processor.step() {
            self.route_and_report(event);
        }
    }

    fn processor_run(&mut self) {
        if self.views.processor.is_finished() {
            self.ui
                .set_info("Program has exited; reset or reload to run again".to_string());
            return;
        }
        for event in self.views.processor.run() {
            self.route_and_report(event);
        }
    }

    // ---- Key handling -------------------------------------------------

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match self.ui.mode.clone() {
            Mode::View => self.handle_view_key(key).await,
            Mode::Confirm { .. } => self.handle_confirm_key(key).await,
            Mode::PathInput { .. } => self.handle_path_input_key(key).await,
            Mode::ExamplePicker => self.handle_picker_key(key),
        }
        Ok(())
    }

    async fn handle_view_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => self.quit_requested(),
                KeyCode::Char('n') => self.new_program_requested(),
                KeyCode::Char('o') => self.open_requested(),
                KeyCode::Char('s') => self.save_program().await,
                KeyCode::Char('a') => self.save_as_requested(),
                KeyCode::Char('e') => self.examples_requested(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::F(1) => return self.set_active_view(ViewId::Editor),
            KeyCode::F(2) => return self.set_active_view(ViewId::Processor),
            KeyCode::F(3) => return self.set_active_view(ViewId::Memory),
            _ => {}
        }

        match self.views.active {
            ViewId::Editor => self.handle_editor_key(key),
            ViewId::Processor => self.handle_processor_key(key),
            ViewId::Memory => self.handle_memory_key(key),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let buffer = &mut self.views.editor.buffer;
        match key.code {
            KeyCode::Char(c) => buffer.insert_char(c),
            KeyCode::Enter => buffer.insert_newline(),
            KeyCode::Tab => buffer.insert_tab(),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete_forward(),
            KeyCode::Left => buffer.move_left(),
            KeyCode::Right => buffer.move_right(),
            KeyCode::Up => buffer.move_up(),
            KeyCode::Down => buffer.move_down(),
            KeyCode::Home => buffer.move_line_start(),
            KeyCode::End => buffer.move_line_end(),
            KeyCode::PageUp => buffer.page_up(),
            KeyCode::PageDown => buffer.page_down(),
            _ => {}
        }
    }

    fn handle_processor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') => self.processor_step(),
            KeyCode::Char('r') => self.processor_run(),
            KeyCode::Char('x') => self.route_and_report(Event::ResetRequested),
            KeyCode::Char('l') => self.route_and_report(Event::ReloadRequested),
            KeyCode::Tab => self.set_active_view(self.views.active.next()),
            _ => {}
        }
    }

    fn handle_memory_key(&mut self, key: KeyEvent) {
        let memory = &mut self.views.memory;
        match key.code {
            KeyCode::Up => memory.scroll_up(1),
            KeyCode::Down => memory.scroll_down(1),
            KeyCode::PageUp => memory.scroll_up(8),
            KeyCode::PageDown => memory.scroll_down(8),
            KeyCode::Home => memory.scroll_home(),
            KeyCode::Tab => self.set_active_view(self.views.active.next()),
            _ => {}
        }
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.resolve_confirm(ConfirmChoice::Save).await
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.resolve_confirm(ConfirmChoice::Discard).await
            }
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => {
                self.resolve_confirm(ConfirmChoice::Cancel).await
            }
            _ => {}
        }
    }

    async fn handle_path_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.confirm_path_input().await,
            KeyCode::Esc => self.cancel_modal(),
            KeyCode::Char(c) => self.ui.input.push(c),
            KeyCode::Backspace => {
                self.ui.input.pop();
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                self.ui.picker_index = self.ui.picker_index.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.catalog.len().saturating_sub(1);
                self.ui.picker_index = (self.ui.picker_index + 1).min(last);
            }
            KeyCode::Enter => self.confirm_example(),
            KeyCode::Esc => self.cancel_modal(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App {
        App::with_config(Config::default()).unwrap()
    }

    async fn type_path(app: &mut App, path: &std::path::Path) {
        for c in path.display().to_string().chars() {
            app.handle_key_event(key(KeyCode::Char(c))).await.unwrap();
        }
        app.handle_key_event(key(KeyCode::Enter)).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_program_on_empty_untitled_skips_prompt() {
        let mut app = app();
        app.new_program_requested();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(app.session.current_file.is_none());
    }

    #[tokio::test]
    async fn test_new_program_cancel_leaves_everything_unchanged() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 1\n");

        app.new_program_requested();
        assert!(matches!(app.ui.mode, Mode::Confirm { .. }));

        app.handle_key_event(key(KeyCode::Char('c'))).await.unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.views.editor.text(), "li r1, 1\n");
        assert!(app.session.current_file.is_none());
    }

    #[tokio::test]
    async fn test_new_program_discard_clears_state() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 1\n");

        app.new_program_requested();
        app.handle_key_event(key(KeyCode::Char('n'))).await.unwrap();

        assert!(app.views.editor.text().is_empty());
        assert!(app.session.current_file.is_none());
        // The processor picked up the now-empty program.
        assert_eq!(app.views.processor.cpu().program_len(), 0);
    }

    #[tokio::test]
    async fn test_new_program_with_file_prompts_with_name() {
        let mut app = app();
        app.session.current_file = Some(PathBuf::from("prog.s"));
        app.new_program_requested();
        match &app.ui.mode {
            Mode::Confirm { prompt, then } => {
                assert!(prompt.contains("prog.s"));
                assert_eq!(*then, PendingAction::NewProgram);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_without_path_opens_one_save_as_prompt() {
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");

        app.handle_key_event(ctrl('s')).await.unwrap();
        assert_eq!(
            app.ui.mode,
            Mode::PathInput {
                purpose: PathPurpose::SaveAs { then: None }
            }
        );
        assert!(app.session.current_file.is_none());
    }

    #[tokio::test]
    async fn test_save_as_writes_text_and_binary_with_shared_basename() {
        let dir = TempDir::new().unwrap();
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");

        app.handle_key_event(ctrl('s')).await.unwrap();
        let target = dir.path().join("prog.s");
        type_path(&mut app, &target).await;

        assert_eq!(app.session.current_file, Some(target.clone()));
        assert!(!app.is_dirty());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "halt\n");
        let binary = std::fs::read(dir.path().join("prog.bin")).unwrap();
        assert_eq!(binary.len(), 4);
    }

    #[tokio::test]
    async fn test_save_as_cancel_sets_no_path_and_writes_nothing() {
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");

        app.handle_key_event(ctrl('a')).await.unwrap();
        assert!(matches!(app.ui.mode, Mode::PathInput { .. }));

        app.handle_key_event(key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(app.session.current_file.is_none());
        assert!(app.is_dirty());
    }

    #[tokio::test]
    async fn test_new_program_save_then_continue_via_save_as() {
        let dir = TempDir::new().unwrap();
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");

        app.new_program_requested();
        app.handle_key_event(key(KeyCode::Char('y'))).await.unwrap();
        assert_eq!(
            app.ui.mode,
            Mode::PathInput {
                purpose: PathPurpose::SaveAs {
                    then: Some(PendingAction::NewProgram)
                }
            }
        );

        let target = dir.path().join("kept.s");
        type_path(&mut app, &target).await;

        // The program was persisted, then the workspace was cleared.
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "halt\n");
        assert!(app.views.editor.text().is_empty());
        assert!(app.session.current_file.is_none());
    }

    #[tokio::test]
    async fn test_save_with_existing_path_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("prog.s");
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 3\nhalt\n");
        app.session.current_file = Some(target.clone());

        app.save_program().await;

        assert!(target.exists());
        let binary = std::fs::read(dir.path().join("prog.bin")).unwrap();
        assert_eq!(binary.len(), 8);
        assert!(!app.is_dirty());
    }

    #[tokio::test]
    async fn test_program_changed_reloads_processor() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 2\nhalt\n");
        let event = app.views.editor.emit_program_changed();
        app.route(event).unwrap();

        assert_eq!(app.views.processor.cpu().program_len(), 8);
        // The editor is active, so the memory projection stays stale.
        assert!(app.views.memory.is_empty());
    }

    #[tokio::test]
    async fn test_program_changed_refreshes_visible_memory_view() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 2\nhalt\n");
        app.set_active_view(ViewId::Memory);
        assert!(!app.views.memory.is_empty());

        app.views.editor.buffer.set_content("li r2, 9\nli r3, 1\nhalt\n");
        let event = app.views.editor.emit_program_changed();
        app.route(event).unwrap();

        let first_word = app.views.memory.rows(1)[0].1[0];
        assert_eq!(
            app.views.processor.cpu().read_word(0),
            Some(first_word)
        );
        assert_eq!(app.views.processor.cpu().program_len(), 12);
    }

    #[tokio::test]
    async fn test_leaving_editor_publishes_pending_changes() {
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");
        assert!(app.views.editor.has_unpublished_changes());

        app.set_active_view(ViewId::Processor);
        assert!(!app.views.editor.has_unpublished_changes());
        assert_eq!(app.views.processor.cpu().program_len(), 4);
    }

    #[tokio::test]
    async fn test_reload_request_republishes_current_program() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 1\nhalt\n");
        app.route(Event::ReloadRequested).unwrap();
        assert_eq!(app.views.processor.cpu().program_len(), 8);
    }

    #[tokio::test]
    async fn test_reset_request_rewinds_engine() {
        let mut app = app();
        app.views.editor.buffer.set_content("li r1, 1\nli r2, 2\nhalt\n");
        app.set_active_view(ViewId::Processor);

        app.handle_key_event(key(KeyCode::Char('s'))).await.unwrap();
        assert_ne!(app.views.processor.cpu().pc(), 0);

        app.handle_key_event(key(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.views.processor.cpu().pc(), 0);
    }

    #[tokio::test]
    async fn test_run_to_exit_marks_processor_finished() {
        let mut app = app();
        app.views.editor.buffer.set_content("print r0\nhalt 4\n");
        app.set_active_view(ViewId::Processor);

        app.handle_key_event(key(KeyCode::Char('r'))).await.unwrap();

        assert!(app.views.processor.is_finished());
        assert_eq!(app.views.processor.cpu().exit_code(), Some(4));
        assert!(!app.views.memory.is_empty());
        let log = app.views.processor.log_lines().join("\n");
        assert!(log.contains("exited with code 4"));
    }

    #[tokio::test]
    async fn test_quit_with_clean_editor_is_immediate() {
        let mut app = app();
        app.handle_key_event(ctrl('q')).await.unwrap();
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_quit_with_dirty_editor_prompts_then_discards() {
        let mut app = app();
        app.views.editor.buffer.insert_char('x');

        app.handle_key_event(ctrl('q')).await.unwrap();
        assert!(matches!(app.ui.mode, Mode::Confirm { .. }));
        assert!(!app.should_quit());

        app.handle_key_event(key(KeyCode::Char('n'))).await.unwrap();
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_example_picker_loads_selection() {
        let mut app = app();
        app.handle_key_event(ctrl('e')).await.unwrap();
        assert_eq!(app.ui.mode, Mode::ExamplePicker);

        app.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(!app.views.editor.text().is_empty());
        assert!(app.views.processor.cpu().program_len() > 0);
    }

    #[tokio::test]
    async fn test_open_missing_file_reports_error_and_keeps_state() {
        let mut app = app();
        app.views.editor.buffer.set_content("halt\n");

        app.handle_key_event(ctrl('o')).await.unwrap();
        type_path(&mut app, std::path::Path::new("/no/such/file.s")).await;

        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.views.editor.text(), "halt\n");
        assert!(app.session.current_file.is_none());
    }

    #[tokio::test]
    async fn test_open_loads_file_into_editor() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.s");
        std::fs::write(&source, "li r1, 5\nhalt\n").unwrap();

        let mut app = app();
        app.handle_key_event(ctrl('o')).await.unwrap();
        type_path(&mut app, &source).await;

        assert_eq!(app.views.editor.text(), "li r1, 5\nhalt\n");
        // Opening does not associate the session with the file; only
        // the save-as workflow sets the path.
        assert!(app.session.current_file.is_none());
        assert_eq!(app.views.processor.cpu().program_len(), 8);
    }
}
