use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

pub mod config;
pub mod error_display;
mod help_strings;
pub mod labels;
pub mod loader;
pub mod logging;
pub mod pivot;
pub mod plot;
pub mod plot_export;
pub mod selection;
pub mod widgets;

pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use sepviz_cli::{Args, FileFormat, LabelStyleArg, OrientationArg};

use error_display::user_message_from_report;
use labels::{LabelStyle, DISRUPTIONS, SUBSETS};
use loader::{load_table, DataSource, LoadOptions, ScoreTable};
use pivot::{Orientation, PivotGrid};
use plot::PlotData;
use plot_export::{default_export_path, write_plot, PlotExportFormat};
use selection::{CellKey, Selection};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::grid::{preferred_size, GridState, ScoreGrid};
use widgets::legend::Legend;
use widgets::plot::{PlotState, ScatterPlot};

pub const APP_NAME: &str = "sepviz";
/// Heading drawn across the top of the screen.
pub const APP_TITLE: &str = "Semantic Separation Visualization";

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Open(DataSource, LoadOptions),
    DoLoad(DataSource, LoadOptions), // Internal event to actually load after the "Loading" frame is drawn
    CellClicked(CellKey),
    Export(PlotExportFormat),
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Grid,
    Plot,
}

/// Full-screen error. While active nothing else is drawn and only quit works.
#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }
}

pub struct App {
    events: Sender<AppEvent>,
    table: Option<ScoreTable>,
    selection: Selection,
    grid: Option<PivotGrid>,
    plot: PlotData,
    grid_state: GridState,
    plot_state: PlotState,
    focus: Focus,
    orientation: Orientation,
    label_style: LabelStyle,
    marker: Marker,
    theme: Theme,
    error_modal: ErrorModal,
    loading: Option<String>,
    status: Option<String>,
    show_help: bool,
    help_scroll: usize,
    export_dir: PathBuf,
    debug: DebugState,
}

impl App {
    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, Theme::default(), AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, app_config: AppConfig) -> App {
        let display = &app_config.display;
        App {
            events,
            table: None,
            selection: Selection::init(&SUBSETS, &DISRUPTIONS),
            grid: None,
            plot: PlotData::default(),
            grid_state: GridState::new(),
            plot_state: PlotState::new(),
            focus: Focus::Grid,
            orientation: display.orientation().unwrap_or_default(),
            label_style: display.label_style().unwrap_or_default(),
            marker: display.plot_marker().unwrap_or(Marker::Braille),
            theme,
            error_modal: ErrorModal::new(),
            loading: None,
            status: None,
            show_help: false,
            help_scroll: 0,
            export_dir: PathBuf::from("."),
            debug: DebugState {
                enabled: app_config.debug.enabled,
                ..DebugState::default()
            },
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.rebuild_grid();
        }
    }

    pub fn set_label_style(&mut self, style: LabelStyle) {
        if self.label_style != style {
            self.label_style = style;
            self.rebuild_grid();
        }
    }

    /// Directory plot exports are written to (default: current directory).
    pub fn set_export_dir(&mut self, dir: PathBuf) {
        self.export_dir = dir;
    }

    /// Enter the full-screen error state.
    pub fn show_fatal(&mut self, message: String) {
        tracing::error!(%message, "fatal");
        self.loading = None;
        self.error_modal.show(message);
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.error_modal
            .active
            .then_some(self.error_modal.message.as_str())
    }

    pub fn table(&self) -> Option<&ScoreTable> {
        self.table.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn grid(&self) -> Option<&PivotGrid> {
        self.grid.as_ref()
    }

    pub fn plot(&self) -> &PlotData {
        &self.plot
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn grid_cursor(&self) -> (usize, usize) {
        self.grid_state.cursor
    }

    pub fn hovered_point(&self) -> Option<usize> {
        self.plot_state.hovered
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Install a loaded table: build the grid and the plot for the current selection.
    pub fn set_table(&mut self, table: ScoreTable) -> Result<()> {
        let grid = PivotGrid::from_table(
            &table,
            &SUBSETS,
            &DISRUPTIONS,
            self.orientation,
            self.label_style,
        )?;
        let plot = PlotData::from_table(&table, self.selection.current())?;
        if let Some((row, col)) = grid.position_of(&self.selection) {
            self.grid_state.set_cursor(&grid, row, col);
        }
        self.grid = Some(grid);
        self.plot = plot;
        self.table = Some(table);
        self.loading = None;
        Ok(())
    }

    fn rebuild_grid(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match PivotGrid::from_table(
            table,
            &SUBSETS,
            &DISRUPTIONS,
            self.orientation,
            self.label_style,
        ) {
            Ok(grid) => {
                if let Some(old) = &self.grid {
                    // Keep the cursor on the same (subset, disruption) pair.
                    let (row, col) = self.grid_state.cursor;
                    let (r, c) = if old.orientation != grid.orientation {
                        (col, row)
                    } else {
                        (row, col)
                    };
                    self.grid_state.set_cursor(&grid, r, c);
                }
                self.grid = Some(grid);
            }
            Err(e) => self.status = Some(user_message_from_report(&e, None)),
        }
    }

    fn rebuild_plot(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.plot_state.clear_hover();
        match PlotData::from_table(table, self.selection.current()) {
            Ok(plot) => {
                tracing::debug!(rows = plot.row_count(), "plot rebuilt");
                self.plot = plot;
            }
            Err(e) => self.status = Some(user_message_from_report(&e, None)),
        }
    }

    fn export(&mut self, format: PlotExportFormat) {
        let path = self
            .export_dir
            .join(default_export_path(&self.plot, format));
        let title = format!(
            "{} / {}",
            SUBSETS.full(&self.plot.key.subset),
            DISRUPTIONS.full(&self.plot.key.disruption)
        );
        self.status = Some(match write_plot(&path, &self.plot, &title, format) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "plot export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        let ctrl_c = event.modifiers.contains(KeyModifiers::CONTROL)
            && event.code == KeyCode::Char('c');
        if ctrl_c {
            return Some(AppEvent::Exit);
        }

        // The error screen only offers quitting.
        if self.error_modal.active {
            return match event.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Some(AppEvent::Exit),
                _ => None,
            };
        }

        if self.show_help {
            match event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.help_scroll = self.help_scroll.saturating_add(1);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.help_scroll = self.help_scroll.saturating_sub(1);
                }
                _ => {}
            }
            return None;
        }

        self.status = None;

        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('?') => {
                self.show_help = true;
                self.debug.last_action = "help".to_string();
                return None;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Grid => Focus::Plot,
                    Focus::Plot => Focus::Grid,
                };
                self.debug.last_action = format!("focus_{:?}", self.focus).to_lowercase();
                return None;
            }
            KeyCode::Char('t') => {
                self.set_orientation(self.orientation.toggled());
                self.debug.last_action = format!("orientation_{}", self.orientation.as_str());
                return None;
            }
            KeyCode::Char('L') => {
                self.set_label_style(self.label_style.toggled());
                self.debug.last_action = format!("labels_{}", self.label_style.as_str());
                return None;
            }
            KeyCode::Char('e') => return Some(AppEvent::Export(PlotExportFormat::Png)),
            KeyCode::Char('E') => return Some(AppEvent::Export(PlotExportFormat::Svg)),
            KeyCode::Char('[') => {
                self.plot_state.step(&self.plot, -1);
                return None;
            }
            KeyCode::Char(']') => {
                self.plot_state.step(&self.plot, 1);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Grid => self.grid_key(event),
            Focus::Plot => {
                match event.code {
                    KeyCode::Left | KeyCode::Char('h') => self.plot_state.step(&self.plot, -1),
                    KeyCode::Right | KeyCode::Char('l') => self.plot_state.step(&self.plot, 1),
                    _ => {}
                }
                None
            }
        }
    }

    fn grid_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let grid = self.grid.as_ref()?;
        let (d_row, d_col, action) = match event.code {
            KeyCode::Up | KeyCode::Char('k') => (-1, 0, "cursor_up"),
            KeyCode::Down | KeyCode::Char('j') => (1, 0, "cursor_down"),
            KeyCode::Left | KeyCode::Char('h') => (0, -1, "cursor_left"),
            KeyCode::Right | KeyCode::Char('l') => (0, 1, "cursor_right"),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.debug.last_action = "click_cell".to_string();
                return Some(AppEvent::CellClicked(self.grid_state.cursor_key(grid)));
            }
            _ => return None,
        };
        self.grid_state.move_cursor(grid, d_row, d_col);
        self.debug.last_action = action.to_string();
        None
    }

    fn mouse(&mut self, event: &MouseEvent) -> Option<AppEvent> {
        self.debug.on_mouse(event);
        if self.error_modal.active || self.show_help {
            return None;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let (row, col) = self.grid_state.cell_at(event.column, event.row)?;
                let grid = self.grid.as_ref()?;
                self.grid_state.set_cursor(grid, row, col);
                self.focus = Focus::Grid;
                self.debug.last_action = "click_cell".to_string();
                Some(AppEvent::CellClicked(grid.resolve(row, col)))
            }
            MouseEventKind::Moved => {
                self.plot_state
                    .hover_at(&self.plot, event.column, event.row);
                None
            }
            _ => None,
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Mouse(mouse) => self.mouse(mouse),
            AppEvent::Open(source, options) => {
                // Draw "Loading" before the blocking read
                self.loading = Some(format!("Loading {}", source));
                Some(AppEvent::DoLoad(source.clone(), options.clone()))
            }
            AppEvent::DoLoad(source, options) => {
                let loaded = load_table(source, options).and_then(|table| self.set_table(table));
                if let Err(e) = loaded {
                    self.show_fatal(user_message_from_report(&e, Some(source)));
                }
                None
            }
            AppEvent::CellClicked(key) => {
                if self.selection.click_received(key.clone()) {
                    self.rebuild_plot();
                }
                None
            }
            AppEvent::Export(format) => {
                self.export(*format);
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_error_screen(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Error ")
            .border_style(Style::default().fg(self.color("modal_border_error")));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        Paragraph::new(self.error_modal.message.as_str())
            .style(Style::default().fg(self.color("error")))
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);
        Paragraph::new("Press q to quit")
            .style(Style::default().fg(self.color("dimmed")))
            .centered()
            .render(chunks[1], buf);
    }

    fn render_help(&mut self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 70, 80);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color("modal_border")));

        let text = help_strings::main_view();
        let max_scroll = text
            .lines()
            .count()
            .saturating_sub(block.inner(popup_area).height as usize);
        self.help_scroll = self.help_scroll.min(max_scroll);

        Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(self.color("text_primary")))
            .scroll((self.help_scroll as u16, 0))
            .render(popup_area, buf);
    }

    fn render_dashboard(&mut self, area: Rect, buf: &mut Buffer) {
        let Some(grid) = &self.grid else {
            let text = self.loading.as_deref().unwrap_or("No data loaded");
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1), Constraint::Length(1), Constraint::Fill(1)])
                .split(area);
            Paragraph::new(text)
                .style(Style::default().fg(self.color("primary")))
                .centered()
                .render(rows[1], buf);
            return;
        };

        let (grid_width, grid_height) = preferred_size(grid);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(grid_column_width(grid_width, area.width)),
                Constraint::Fill(1),
            ])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(grid_height), Constraint::Fill(1)])
            .split(columns[0]);

        ScoreGrid::new(grid, &self.selection, &self.theme)
            .focused(self.focus == Focus::Grid)
            .render(left[0], buf, &mut self.grid_state);
        Legend::new(&self.theme).render(left[1], buf);
        ScatterPlot::new(&self.plot, &self.theme, &SUBSETS, &DISRUPTIONS)
            .marker(self.marker)
            .focused(self.focus == Focus::Plot)
            .render(columns[1], buf, &mut self.plot_state);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let mut constraints = vec![
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(APP_TITLE)
            .style(
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .centered()
            .render(layout[0], buf);

        let fatal = self.error_modal.active;
        if fatal {
            self.render_error_screen(layout[1], buf);
        } else {
            self.render_dashboard(layout[1], buf);
            if self.show_help {
                self.render_help(layout[1], buf);
            }
        }

        let mut controls = Controls::new()
            .with_dimmed(fatal)
            .with_plot_focused(self.focus == Focus::Plot)
            .with_bg(self.color("controls_bg"))
            .with_status(self.status.clone());
        if self.table.is_some() && !fatal {
            controls = controls.with_row_count(self.plot.row_count());
        }
        controls.render(layout[2], buf);

        if self.debug.enabled {
            self.debug.show_help_at_render = self.show_help;
            self.debug.selection = format!(
                "{}/{}",
                self.selection.subset(),
                self.selection.disruption()
            );
            let style = Style::default().add_modifier(Modifier::DIM);
            buf.set_style(layout[3], style);
            self.debug.render(layout[3], buf);
        }
    }
}

/// Width of the grid column: what the grid asks for, at most 3/5 of the screen.
fn grid_column_width(preferred: u16, screen_width: u16) -> u16 {
    let cap = (u32::from(screen_width) * 3 / 5) as u16;
    preferred.min(cap)
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Command-line options that override the config file for a session.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub orientation: Option<Orientation>,
    pub label_style: Option<LabelStyle>,
    pub debug: bool,
}

impl From<&Args> for RunOptions {
    fn from(args: &Args) -> Self {
        Self {
            orientation: args.orientation.map(Orientation::from),
            label_style: args.labels.map(LabelStyle::from),
            debug: args.debug,
        }
    }
}

/// Run the dashboard until the user quits. A source that could not be
/// resolved is shown on the error screen.
pub fn run(
    source: std::result::Result<DataSource, loader::LoadError>,
    load_options: LoadOptions,
    run_options: RunOptions,
    config: AppConfig,
) -> Result<()> {
    use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
    use std::sync::mpsc;

    let theme = Theme::from_config(&config.theme)
        .or_else(|e| Theme::from_config(&AppConfig::default().theme).map_err(|_| e))?;

    let mut terminal = ratatui::try_init().map_err(|e| {
        color_eyre::eyre::eyre!(
            "sepviz requires an interactive terminal (TTY). No terminal detected: {}",
            e
        )
    })?;
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let poll_interval = std::time::Duration::from_millis(config.performance.event_poll_interval_ms);
    let mut app = App::new_with_config(tx.clone(), theme, config);
    if run_options.debug {
        app.enable_debug();
    }
    if let Some(orientation) = run_options.orientation {
        app.set_orientation(orientation);
    }
    if let Some(style) = run_options.label_style {
        app.set_label_style(style);
    }

    match source {
        Ok(source) => tx.send(AppEvent::Open(source, load_options))?,
        Err(e) => app.show_fatal(e.to_string()),
    }
    terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;

    let result = event_loop(&mut terminal, &mut app, &tx, &rx, poll_interval);

    crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    tx: &Sender<AppEvent>,
    rx: &std::sync::mpsc::Receiver<AppEvent>,
    poll_interval: std::time::Duration,
) -> Result<()> {
    use std::sync::mpsc::RecvTimeoutError;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => {
                    if key.is_press() {
                        tx.send(AppEvent::Key(key))?
                    }
                }
                crossterm::event::Event::Mouse(mouse) => tx.send(AppEvent::Mouse(mouse))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            terminal.draw(|frame| frame.render_widget(&mut *app, frame.area()))?;
        }
    }
    Ok(())
}
