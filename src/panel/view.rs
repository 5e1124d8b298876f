//! Panel view state: output panes, run trigger and displays.
//!
//! Views are plain values captured at panel construction; the controller
//! updates them and hosts render them however they like.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::types::PanelId;

pub const READY_TEXT: &str = "Ready!";
pub const NO_ERRORS_TEXT: &str = "No Errors!";
pub const RUN_LABEL: &str = "Run";
pub const RUNNING_LABEL: &str = "Running...";
pub const NO_VERSION_TEXT: &str = "0.0.0";

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid line break regex"));

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

/// Visible text of an HTML fragment
pub fn render_html(markup: &str) -> String {
    let text = LINE_BREAK_REGEX.replace_all(markup, "\n");
    let text = TAG_REGEX.replace_all(&text, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Output pane with a raw/HTML toggle.
///
/// The raw text is stored once per run and every render derives from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPane {
    raw: String,
    html: bool,
    displayed: String,
}

impl Default for OutputPane {
    fn default() -> Self {
        Self {
            raw: READY_TEXT.to_string(),
            html: false,
            displayed: READY_TEXT.to_string(),
        }
    }
}

impl OutputPane {
    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
        self.render();
    }

    pub fn set_html_mode(&mut self, html: bool) {
        self.html = html;
        self.render();
    }

    pub fn is_html(&self) -> bool {
        self.html
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    fn render(&mut self) {
        self.displayed = if self.html {
            render_html(&self.raw)
        } else {
            self.raw.clone()
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunTrigger {
    enabled: bool,
}

impl Default for RunTrigger {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl RunTrigger {
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        if self.enabled {
            RUN_LABEL
        } else {
            RUNNING_LABEL
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelView {
    pub id: PanelId,
    pub output: OutputPane,
    pub errors: String,
    pub version_display: String,
    pub perf_display: String,
    pub trigger: RunTrigger,
    pub selected_version: Option<String>,
    attached: bool,
}

impl PanelView {
    pub fn new(id: PanelId, default_version: Option<&str>) -> Self {
        Self {
            id,
            output: OutputPane::default(),
            errors: NO_ERRORS_TEXT.to_string(),
            version_display: default_version.unwrap_or(NO_VERSION_TEXT).to_string(),
            perf_display: "0ms".to_string(),
            trigger: RunTrigger::default(),
            selected_version: default_version.map(str::to_string),
            attached: true,
        }
    }

    pub fn title(&self) -> String {
        format!("PHP Version {}:", self.id)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }
}
