use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub num_mouse_events: usize,
    pub last_key_event_name: String,
    pub last_type_name: String,
    /// Last action taken (e.g. "cursor_down") for debugging key handling.
    pub last_action: String,
    pub enabled: bool,
    /// Snapshot of the help flag at render time (set by App when enabled).
    pub show_help_at_render: bool,
    /// "<subset>/<disruption>" at render time.
    pub selection: String,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
        self.last_type_name = format!("{:?}", event.kind);
    }

    pub fn on_mouse(&mut self, event: &crossterm::event::MouseEvent) {
        self.num_mouse_events += 1;
        self.last_type_name = format!("{:?}", event.kind);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(format!(
            "events={} keys={} mouse={} last_key={} kind={} last_action={} help={} frames={} selection={}",
            self.num_events,
            self.num_key_events,
            self.num_mouse_events,
            self.last_key_event_name,
            self.last_type_name,
            self.last_action,
            self.show_help_at_render,
            self.num_frames,
            self.selection
        ))
        .render(area, buf);
    }
}
