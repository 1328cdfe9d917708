//! Interactive TUI (Terminal User Interface) for Tabula.
//!
//! Provides a table browser with:
//! - Real-time filtering as you type
//! - Paging and row selection
//! - Column hiding and sorting on the focused column
//! - Reloading the dataset file

use crate::app::App;
use crate::render::cell_text;
use crate::TableArgs;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use std::io;
use std::time::{Duration, Instant};
use tabula_core::{Config, FileSource, SortDirection, SortProp, Table, TabulaError};

/// TUI application state.
struct TuiApp {
    /// The table being browsed
    table: Table,

    /// Where reloads read from
    source: FileSource,

    /// Current page (0-based)
    page: usize,

    /// Selected row within the page
    selected: usize,

    /// Focused visible column
    focused_column: usize,

    /// Whether we should quit
    should_quit: bool,

    /// Last filter time
    last_filter_time: Duration,

    /// Status message
    status_message: Option<String>,
}

impl TuiApp {
    fn new(table: Table, source: FileSource) -> Self {
        TuiApp {
            table,
            source,
            page: 0,
            selected: 0,
            focused_column: 0,
            should_quit: false,
            last_filter_time: Duration::ZERO,
            status_message: None,
        }
    }

    /// Apply a new search string.
    fn search(&mut self, search: String) {
        let start = Instant::now();
        let saved = self.table.set_search(search);
        self.last_filter_time = start.elapsed();

        self.page = 0;
        self.selected = 0;
        self.status_message = saved.err().map(save_failed);
    }

    /// Handle input character.
    fn on_char(&mut self, c: char) {
        let mut search = self.table.search().to_string();
        search.push(c);
        self.search(search);
    }

    /// Handle backspace.
    fn on_backspace(&mut self) {
        let mut search = self.table.search().to_string();
        search.pop();
        self.search(search);
    }

    /// Drop the search and show every row.
    fn reset_filter(&mut self) {
        let saved = self.table.update_filter(true);
        self.page = 0;
        self.selected = 0;
        self.status_message = Some(match saved {
            Ok(()) => "Filter cleared".to_string(),
            Err(e) => save_failed(e),
        });
    }

    fn page_len(&self) -> usize {
        self.table.page(self.page).len()
    }

    /// Keep page, selection and focus inside their bounds.
    fn clamp(&mut self) {
        self.page = self.page.min(self.table.page_count().saturating_sub(1));
        self.selected = self.selected.min(self.page_len().saturating_sub(1));
        self.focused_column = self
            .focused_column
            .min(self.table.table_columns().len().saturating_sub(1));
    }

    /// Move selection up.
    fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else if self.page > 0 {
            self.page -= 1;
            self.selected = self.page_len().saturating_sub(1);
        }
    }

    /// Move selection down.
    fn select_next(&mut self) {
        if self.selected + 1 < self.page_len() {
            self.selected += 1;
        } else if self.page + 1 < self.table.page_count() {
            self.page += 1;
            self.selected = 0;
        }
    }

    /// Previous page.
    fn page_up(&mut self) {
        self.page = self.page.saturating_sub(1);
        self.clamp();
    }

    /// Next page.
    fn page_down(&mut self) {
        self.page += 1;
        self.clamp();
    }

    /// Move column focus right, wrapping around.
    fn focus_next_column(&mut self) {
        let count = self.table.table_columns().len();
        self.focused_column = (self.focused_column + 1) % count.max(1);
    }

    fn focused_prop(&self) -> Option<String> {
        self.table
            .table_columns()
            .get(self.focused_column)
            .map(|c| c.prop.clone())
    }

    /// Sort by the focused column, flipping direction if it already is.
    fn sort_focused(&mut self) {
        let Some(prop) = self.focused_prop() else {
            return;
        };
        let dir = match self.table.sorts().first() {
            Some(sort) if sort.prop == prop && sort.dir == SortDirection::Asc => {
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        let saved = self.table.set_sorts(vec![SortProp::new(prop.as_str(), dir)]);
        self.status_message = Some(match saved {
            Ok(()) => format!("Sorted by {} ({})", prop, dir),
            Err(e) => save_failed(e),
        });
    }

    /// Hide the focused column.
    fn hide_focused(&mut self) {
        let Some(prop) = self.focused_prop() else {
            return;
        };
        self.status_message = Some(match self.table.toggle_column(&prop, false) {
            Ok(true) => format!("Column '{}' hidden", prop),
            Ok(false) => "The last visible column cannot be hidden".to_string(),
            Err(e) => save_failed(e),
        });
        self.clamp();
    }

    /// Show every hidden column.
    fn show_all_columns(&mut self) {
        let hidden: Vec<String> = self
            .table
            .columns()
            .iter()
            .filter(|c| c.is_hidden)
            .map(|c| c.prop.clone())
            .collect();
        let saved = hidden
            .iter()
            .try_for_each(|prop| self.table.toggle_column(prop, true).map(|_| ()));
        self.status_message = Some(match saved {
            Ok(()) => format!("{} columns shown", hidden.len()),
            Err(e) => save_failed(e),
        });
        self.clamp();
    }

    /// Reload the dataset file.
    fn reload(&mut self) {
        if !self.table.reload_data(&self.source) {
            self.status_message = Some("Reload already in progress".to_string());
            return;
        }
        self.status_message = Some(if self.table.loading_error() {
            format!("Failed to reload {}", self.source.path().display())
        } else {
            format!("Reloaded {} rows", self.table.data().len())
        });
        self.clamp();
    }

    /// Select the highlighted row.
    fn select_current(&mut self) {
        let Some(row) = self.table.page(self.page).get(self.selected).map(|r| (*r).clone()) else {
            return;
        };
        let key = cell_text(&row, self.table.identifier());
        self.table.select(vec![row]);
        self.status_message = Some(format!("Selected {} = {}", self.table.identifier(), key));
    }
}

/// Status line for a change that applied but could not be stored.
fn save_failed(error: TabulaError) -> String {
    format!("Failed to save table settings: {}", error)
}

/// Run the TUI application.
pub fn run(config: Config, args: &TableArgs) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let (table, source) = app.open_table(args)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_app = TuiApp::new(table, source);

    // Main loop
    let result = run_loop(&mut terminal, &mut tui_app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main event loop.
fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut TuiApp) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Char(c) => {
                            if key.modifiers.contains(KeyModifiers::CONTROL) {
                                match c {
                                    's' => app.sort_focused(),
                                    'h' => app.hide_focused(),
                                    'a' => app.show_all_columns(),
                                    'r' => app.reset_filter(),
                                    _ => {}
                                }
                            } else {
                                app.on_char(c);
                            }
                        }
                        KeyCode::Backspace => {
                            app.on_backspace();
                        }
                        KeyCode::Tab => {
                            app.focus_next_column();
                        }
                        KeyCode::Up => {
                            app.select_previous();
                        }
                        KeyCode::Down => {
                            app.select_next();
                        }
                        KeyCode::PageUp => {
                            app.page_up();
                        }
                        KeyCode::PageDown => {
                            app.page_down();
                        }
                        KeyCode::Home => {
                            app.page = 0;
                            app.selected = 0;
                        }
                        KeyCode::End => {
                            app.page = app.table.page_count().saturating_sub(1);
                            app.selected = app.page_len().saturating_sub(1);
                        }
                        KeyCode::Enter => {
                            app.select_current();
                        }
                        KeyCode::F(5) => {
                            app.reload();
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

mod ui {
    use super::*;
    use ratatui::widgets::Table;

    /// Draw the UI.
    pub fn draw(f: &mut Frame, app: &TuiApp) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Search box
                Constraint::Min(10),   // Rows
                Constraint::Length(2), // Status bar
            ])
            .split(f.area());

        draw_search_box(f, app, chunks[0]);
        draw_rows(f, app, chunks[1]);
        draw_status_bar(f, app, chunks[2]);
    }

    /// Draw the search input box.
    fn draw_search_box(f: &mut Frame, app: &TuiApp, area: Rect) {
        let search = app.table.search();
        let input = Paragraph::new(search)
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Search (column:value, 'quoted text') "),
            );
        f.render_widget(input, area);

        // Show cursor
        f.set_cursor_position(Position::new(
            area.x + search.chars().count() as u16 + 1,
            area.y + 1,
        ));
    }

    /// Draw the current page.
    fn draw_rows(f: &mut Frame, app: &TuiApp, area: Rect) {
        let columns = app.table.table_columns();
        let sort = app.table.sorts().first();

        let header = Row::new(columns.iter().enumerate().map(|(i, c)| {
            let arrow = match sort {
                Some(s) if s.prop == c.prop && s.dir == SortDirection::Asc => " ▲",
                Some(s) if s.prop == c.prop => " ▼",
                _ => "",
            };
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if i == app.focused_column {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            Cell::from(format!("{}{}", c.name, arrow)).style(style)
        }));

        let rows: Vec<Row> = app
            .table
            .page(app.page)
            .into_iter()
            .map(|row| Row::new(columns.iter().map(|c| Cell::from(cell_text(row, &c.prop)))))
            .collect();

        let widths: Vec<Constraint> = columns
            .iter()
            .map(|c| Constraint::Fill(c.flex_grow.unwrap_or(1) as u16))
            .collect();

        let title = format!(
            " Rows ({} of {} match, filtered in {:.1}ms) ",
            app.table.row_count(),
            app.table.data().len(),
            app.last_filter_time.as_secs_f64() * 1000.0
        );

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = TableState::default().with_selected(Some(app.selected));
        f.render_stateful_widget(table, area, &mut state);
    }

    /// Draw the status bar.
    fn draw_status_bar(f: &mut Frame, app: &TuiApp, area: Rect) {
        let status = if let Some(ref msg) = app.status_message {
            msg.clone()
        } else {
            format!(
                "Page {}/{} ({} per page) | ↑↓:Navigate Tab:Column Ctrl+S:Sort Ctrl+H:Hide Ctrl+A:Show all Ctrl+R:Clear F5:Reload Enter:Select Esc:Quit",
                app.page + 1,
                app.table.page_count().max(1),
                app.table.limit()
            )
        };

        let status_bar = Paragraph::new(status).style(Style::default().fg(Color::Gray));

        f.render_widget(status_bar, area);
    }
}
