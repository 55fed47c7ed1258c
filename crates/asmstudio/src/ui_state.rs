use crate::status_manager::StatusManager;

/// Workflow that resumes once a confirmation or chooser resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    NewProgram,
    Quit,
}

/// What a typed path is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPurpose {
    Open,
    SaveAs { then: Option<PendingAction> },
}

/// Interaction mode. `View` is normal operation; the other modes are
/// the cooperative suspension points of the save/open workflows — the
/// suspended workflow sits in the mode until a key resolves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    View,
    Confirm { prompt: String, then: PendingAction },
    PathInput { purpose: PathPurpose },
    ExamplePicker,
}

pub struct UiState {
    pub mode: Mode,
    pub input: String,
    pub picker_index: usize,
    pub status: StatusManager,
    should_quit: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            mode: Mode::View,
            input: String::new(),
            picker_index: 0,
            status: StatusManager::new(),
            should_quit: false,
        }
    }

    pub fn enter_confirm(&mut self, prompt: String, then: PendingAction) {
        self.mode = Mode::Confirm { prompt, then };
    }

    pub fn enter_path_input(&mut self, purpose: PathPurpose) {
        self.input.clear();
        self.mode = Mode::PathInput { purpose };
    }

    pub fn enter_example_picker(&mut self) {
        self.picker_index = 0;
        self.mode = Mode::ExamplePicker;
    }

    pub fn back_to_view(&mut self) {
        self.mode = Mode::View;
        self.input.clear();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_info(&mut self, message: String) {
        self.status.set_info(message);
    }

    pub fn set_success(&mut self, message: String) {
        self.status.set_success(message);
    }

    pub fn set_warning(&mut self, message: String) {
        self.status.set_warning(message);
    }

    pub fn set_error(&mut self, message: String) {
        self.status.set_error(message);
    }

    pub fn update_status(&mut self) {
        self.status.update();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
