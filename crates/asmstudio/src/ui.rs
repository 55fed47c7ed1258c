use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::status_manager::MessageType;
use crate::ui_state::{Mode, PathPurpose};
use crate::views::ViewId;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title / tab bar
            Constraint::Min(0),    // Active view
            Constraint::Length(2), // Status bar
        ])
        .split(f.size());

    draw_title_bar(f, app, chunks[0]);

    match app.views.active {
        ViewId::Editor => draw_editor(f, app, chunks[1]),
        ViewId::Processor => draw_processor(f, app, chunks[1]),
        ViewId::Memory => draw_memory(f, app, chunks[1]),
    }

    draw_status_bar(f, app, chunks[2]);

    if app.ui.mode == Mode::ExamplePicker {
        draw_example_picker(f, app, chunks[1]);
    }
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " asmstudio ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (index, id) in ViewId::ALL.iter().enumerate() {
        let label = format!(" F{} {} ", index + 1, id.title());
        let style = if *id == app.views.active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(label, style));
    }

    let dirty = if app.is_dirty() { " *" } else { "" };
    spans.push(Span::styled(
        format!("  {}{}", app.session.display_name(), dirty),
        Style::default().fg(Color::Gray),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.session.display_name());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let buffer = &mut app.views.editor.buffer;
    buffer.set_viewport_height(inner.height as usize);

    let number_width = if app.config.editor.line_numbers { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(number_width), Constraint::Min(0)])
        .split(inner);

    let viewport_lines = buffer.viewport_lines();
    let start_line = buffer.viewport_offset();

    if app.config.editor.line_numbers {
        let numbers: Vec<String> = (0..viewport_lines.len())
            .map(|i| format!("{:4} ", start_line + i + 1))
            .collect();
        let widget =
            Paragraph::new(numbers.join("\n")).style(Style::default().fg(Color::DarkGray));
        f.render_widget(widget, chunks[0]);
    }

    let content = viewport_lines.join("");
    f.render_widget(Paragraph::new(content), chunks[1]);

    // Cursor, mapped through character display widths.
    let (cursor_line, cursor_col) = buffer.cursor_position();
    if cursor_line >= start_line && cursor_line < start_line + viewport_lines.len().max(1) {
        let display_col: usize = buffer
            .current_line()
            .chars()
            .take(cursor_col)
            .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
            .sum();
        let x = chunks[1].x + display_col as u16;
        let y = chunks[1].y + (cursor_line - start_line) as u16;
        if x < chunks[1].x + chunks[1].width && y < chunks[1].y + chunks[1].height {
            f.set_cursor(x, y);
        }
    }
}

fn draw_processor(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let processor = &app.views.processor;
    let cpu = processor.cpu();
    let regs = cpu.registers();

    let format_row = |range: std::ops::Range<usize>| {
        Line::from(
            range
                .map(|i| format!("r{} {:#010x}  ", i, regs[i] as u32))
                .collect::<String>(),
        )
    };
    let state = if processor.is_finished() {
        match cpu.exit_code() {
            Some(code) => format!("exited ({})", code),
            None => "exited".to_string(),
        }
    } else {
        "running".to_string()
    };
    let lines = vec![
        format_row(0..4),
        format_row(4..8),
        Line::from(format!("pc {:#010x}  state: {}", cpu.pc(), state)),
    ];
    let registers = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Registers"));
    f.render_widget(registers, chunks[0]);

    let log_block = Block::default().borders(Borders::ALL).title("Log");
    let log_inner = log_block.inner(chunks[1]);
    let log_lines = processor.log_lines();
    let skip = log_lines.len().saturating_sub(log_inner.height as usize);
    let tail = log_lines[skip..].join("\n");
    f.render_widget(Paragraph::new(tail).block(log_block), chunks[1]);
}

fn draw_memory(f: &mut Frame, app: &App, area: Rect) {
    let memory = &app.views.memory;
    let block = Block::default().borders(Borders::ALL).title("Memory");
    let inner = block.inner(area);

    if memory.is_empty() {
        let hint = Paragraph::new("No machine state yet — load and run a program first")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(hint, area);
        return;
    }

    let pc_row_stride = memory.words_per_row() * 4;
    let pc_row = memory.pc() as usize / pc_row_stride * pc_row_stride;
    let lines: Vec<Line> = memory
        .rows(inner.height as usize)
        .into_iter()
        .map(|(addr, words)| {
            let mut text = format!("{:#06x}  ", addr);
            for word in words {
                text.push_str(&format!("{:08x} ", word));
            }
            let style = if addr == pc_row {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(Span::styled(text, style))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let message_line = match &app.ui.mode {
        Mode::Confirm { prompt, .. } => Line::from(Span::styled(
            format!("{}  (y)es / (n)o / (c)ancel", prompt),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Mode::PathInput { purpose } => {
            let label = match purpose {
                PathPurpose::Open => "Open file",
                PathPurpose::SaveAs { .. } => "Save as",
            };
            Line::from(format!("{}: {}_", label, app.ui.input))
        }
        Mode::ExamplePicker => Line::from("Select an example  (Enter to load, Esc to cancel)"),
        Mode::View => match app.ui.status.current() {
            Some(message) => Line::from(Span::styled(
                message.content.clone(),
                style_for_message(&message.message_type),
            )),
            None => match app.views.editor.diagnostic() {
                Some(diagnostic) if app.views.active == ViewId::Editor => Line::from(
                    Span::styled(
                        diagnostic.to_string(),
                        Style::default().fg(Color::Yellow),
                    ),
                ),
                _ => Line::from(""),
            },
        },
    };
    f.render_widget(Paragraph::new(message_line), chunks[0]);

    let hints = match app.views.active {
        ViewId::Editor => "^S save  ^A save as  ^N new  ^O open  ^E examples  ^Q quit",
        ViewId::Processor => "s step  r run  x reset  l reload  Tab next view  ^Q quit",
        ViewId::Memory => "Up/Down scroll  PgUp/PgDn page  Home top  Tab next view  ^Q quit",
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
}

fn draw_example_picker(f: &mut Frame, app: &App, area: Rect) {
    let height = (app.catalog.len() as u16 + 2).min(area.height);
    let popup = centered_rect(40, height, area);
    f.render_widget(Clear, popup);

    let items: Vec<ListItem> = app
        .catalog
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry.name))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Load Example"))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.ui.picker_index));
    f.render_stateful_widget(list, popup, &mut state);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn style_for_message(message_type: &MessageType) -> Style {
    match message_type {
        MessageType::Info => Style::default().fg(Color::Cyan),
        MessageType::Success => Style::default().fg(Color::Green),
        MessageType::Warning => Style::default().fg(Color::Yellow),
        MessageType::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}
