use ropey::Rope;
use std::cmp;

/// Plain editable text with a cursor and a scrolling viewport. Columns
/// are character indices; display-width mapping happens at draw time.
#[derive(Clone)]
pub struct TextBuffer {
    rope: Rope,
    cursor_line: usize,
    cursor_col: usize,
    viewport_offset: usize,
    viewport_height: usize,
    modified: bool,
    tab_size: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor_line: 0,
            cursor_col: 0,
            viewport_offset: 0,
            viewport_height: 24,
            modified: false,
            tab_size: 4,
        }
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size;
    }

    pub fn set_content(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.viewport_offset = 0;
        self.modified = false;
    }

    pub fn content(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.adjust_viewport();
    }

    pub fn viewport_lines(&self) -> Vec<String> {
        let end_line = cmp::min(
            self.viewport_offset + self.viewport_height,
            self.rope.len_lines(),
        );
        (self.viewport_offset..end_line)
            .filter_map(|i| self.rope.get_line(i))
            .map(|line| line.to_string())
            .collect()
    }

    pub fn current_line(&self) -> String {
        self.rope
            .get_line(self.cursor_line)
            .map(|l| l.to_string())
            .unwrap_or_default()
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.char_index();
        self.rope.insert_char(idx, c);
        self.cursor_col += 1;
        self.modified = true;
    }

    pub fn insert_newline(&mut self) {
        let idx = self.char_index();
        self.rope.insert_char(idx, '\n');
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.modified = true;
        self.adjust_viewport();
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..self.tab_size {
            self.insert_char(' ');
        }
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        let idx = self.char_index();
        if idx == 0 {
            return;
        }
        if self.cursor_col == 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_char_len(self.cursor_line);
        } else {
            self.cursor_col -= 1;
        }
        self.rope.remove(idx - 1..idx);
        self.modified = true;
        self.adjust_viewport();
    }

    pub fn delete_forward(&mut self) {
        let idx = self.char_index();
        if idx < self.rope.len_chars() {
            self.rope.remove(idx..idx + 1);
            self.modified = true;
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_char_len(self.cursor_line);
            self.adjust_viewport();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.line_char_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.cursor_col = 0;
            self.adjust_viewport();
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_col();
            self.adjust_viewport();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.clamp_col();
            self.adjust_viewport();
        }
    }

    pub fn move_line_start(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_line_end(&mut self) {
        self.cursor_col = self.line_char_len(self.cursor_line);
    }

    pub fn page_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(self.viewport_height);
        self.clamp_col();
        self.adjust_viewport();
    }

    pub fn page_down(&mut self) {
        let max_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_line = cmp::min(self.cursor_line + self.viewport_height, max_line);
        self.clamp_col();
        self.adjust_viewport();
    }

    fn char_index(&self) -> usize {
        self.rope.line_to_char(self.cursor_line) + self.cursor_col
    }

    // Length of a line without its trailing newline.
    fn line_char_len(&self, line: usize) -> usize {
        match self.rope.get_line(line) {
            Some(slice) => {
                let mut len = slice.len_chars();
                if len > 0 && slice.char(len - 1) == '\n' {
                    len -= 1;
                }
                len
            }
            None => 0,
        }
    }

    fn clamp_col(&mut self) {
        self.cursor_col = cmp::min(self.cursor_col, self.line_char_len(self.cursor_line));
    }

    fn adjust_viewport(&mut self) {
        if self.cursor_line < self.viewport_offset {
            self.viewport_offset = self.cursor_line;
        } else if self.cursor_line >= self.viewport_offset + self.viewport_height {
            self.viewport_offset = self.cursor_line + 1 - self.viewport_height;
        }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_content() {
        let mut buffer = TextBuffer::new();
        for c in "li r1, 5".chars() {
            buffer.insert_char(c);
        }
        assert_eq!(buffer.content(), "li r1, 5");
        assert!(buffer.is_modified());
        assert_eq!(buffer.cursor_position(), (0, 8));
    }

    #[test]
    fn test_set_content_resets_state() {
        let mut buffer = TextBuffer::new();
        buffer.insert_char('x');
        buffer.set_content("halt\n");
        assert!(!buffer.is_modified());
        assert_eq!(buffer.cursor_position(), (0, 0));
        assert_eq!(buffer.content(), "halt\n");
    }

    #[test]
    fn test_newline_and_backspace_join() {
        let mut buffer = TextBuffer::new();
        buffer.insert_char('a');
        buffer.insert_newline();
        buffer.insert_char('b');
        assert_eq!(buffer.content(), "a\nb");
        assert_eq!(buffer.cursor_position(), (1, 1));

        buffer.backspace();
        buffer.backspace();
        assert_eq!(buffer.content(), "a");
        assert_eq!(buffer.cursor_position(), (0, 1));
    }

    #[test]
    fn test_cursor_movement_clamps_to_line() {
        let mut buffer = TextBuffer::new();
        buffer.set_content("first line\nx\n");
        buffer.move_line_end();
        assert_eq!(buffer.cursor_position(), (0, 10));
        buffer.move_down();
        assert_eq!(buffer.cursor_position(), (1, 1));
    }

    #[test]
    fn test_move_right_wraps_to_next_line() {
        let mut buffer = TextBuffer::new();
        buffer.set_content("ab\ncd");
        buffer.move_line_end();
        buffer.move_right();
        assert_eq!(buffer.cursor_position(), (1, 0));
        buffer.move_left();
        assert_eq!(buffer.cursor_position(), (0, 2));
    }

    #[test]
    fn test_viewport_follows_cursor() {
        let mut buffer = TextBuffer::new();
        let text = (0..50).map(|i| format!("line{}\n", i)).collect::<String>();
        buffer.set_content(&text);
        buffer.set_viewport_height(10);
        for _ in 0..20 {
            buffer.move_down();
        }
        let offset = buffer.viewport_offset();
        assert!(offset > 0);
        assert!(buffer.cursor_position().0 < offset + 10);
        assert_eq!(buffer.viewport_lines().len(), 10);
    }

    #[test]
    fn test_insert_tab_uses_spaces() {
        let mut buffer = TextBuffer::new();
        buffer.set_tab_size(2);
        buffer.insert_tab();
        assert_eq!(buffer.content(), "  ");
    }
}
