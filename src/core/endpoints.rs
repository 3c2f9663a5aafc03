/// Path of the status resource, relative to the web script base.
pub const STATUS_PATH: &str = "/bulk/export/status.json";
pub const PAUSE_PATH: &str = "/bulk/export/pause";
pub const RESUME_PATH: &str = "/bulk/export/resume";
pub const STOP_PATH: &str = "/bulk/export/stop";

/// Indicator icon shown once the export has finished, relative to the app base.
pub const COMPLETION_ICON_PATH: &str = "/images/bulkexport/logo.png";

/// Control actions the export job accepts over POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Pause,
    Resume,
    Stop,
}

impl JobAction {
    pub fn name(self) -> &'static str {
        match self {
            JobAction::Pause => "pause",
            JobAction::Resume => "resume",
            JobAction::Stop => "stop",
        }
    }
}

/// The URLs the widget talks to, derived once from the two base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub app_base: String,
    pub status: String,
    pub pause: String,
    pub resume: String,
    pub stop: String,
}

impl Endpoints {
    pub fn new(app_base_url: &str, script_base_url: &str) -> Self {
        let script = script_base_url.trim_end_matches('/');
        Self {
            app_base: app_base_url.trim_end_matches('/').to_string(),
            status: format!("{script}{STATUS_PATH}"),
            pause: format!("{script}{PAUSE_PATH}"),
            resume: format!("{script}{RESUME_PATH}"),
            stop: format!("{script}{STOP_PATH}"),
        }
    }

    pub fn action(&self, action: JobAction) -> &str {
        match action {
            JobAction::Pause => &self.pause,
            JobAction::Resume => &self.resume,
            JobAction::Stop => &self.stop,
        }
    }

    pub fn completion_icon(&self) -> String {
        format!("{}{COMPLETION_ICON_PATH}", self.app_base)
    }
}
