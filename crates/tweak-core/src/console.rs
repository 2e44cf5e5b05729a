use std::collections::VecDeque;

use crate::logging::{LogEntry, LogLevel};

/// State of the drop-down console overlay: log lines, the input line, and
/// command history.
pub struct Console {
    visible: bool,
    log_lines: VecDeque<LogEntry>,
    pub input_buffer: String,
    pub cursor_pos: usize,
    scroll_offset: usize,
    max_lines: usize,
    min_level: LogLevel,
    history: VecDeque<String>,
    history_size: usize,
    /// Position while browsing history; `None` when editing a fresh line.
    history_cursor: Option<usize>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Console {
    pub fn new(max_lines: usize) -> Self {
        Self {
            visible: false,
            log_lines: VecDeque::with_capacity(max_lines),
            input_buffer: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            max_lines,
            min_level: LogLevel::Trace,
            history: VecDeque::new(),
            history_size: 50,
            history_cursor: None,
        }
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        if self.log_lines.len() >= self.max_lines {
            self.log_lines.pop_front();
            if self.scroll_offset > 0 {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
        }
        self.log_lines.push_back(entry);
    }

    /// Append a line produced by the console itself.
    pub fn push_line(&mut self, level: LogLevel, target: &str, message: impl Into<String>) {
        self.push_log(LogEntry {
            level,
            target: target.to_string(),
            message: message.into(),
        });
    }

    pub fn log_lines(&self) -> &VecDeque<LogEntry> {
        &self.log_lines
    }

    /// Lines at or above the minimum level, oldest first.
    pub fn visible_lines(&self) -> impl Iterator<Item = &LogEntry> {
        let min = self.min_level;
        self.log_lines.iter().filter(move |e| e.level >= min)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
        self.scroll_offset = 0;
    }

    pub fn clear_logs(&mut self) {
        self.log_lines.clear();
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, amount: usize) {
        let max_offset = self.visible_lines().count().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + amount).min(max_offset);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn insert_char(&mut self, c: char) {
        self.input_buffer.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    /// Replace the input line, placing the cursor at its end.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_buffer = text.into();
        self.cursor_pos = self.input_buffer.len();
    }

    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let prev = self.input_buffer[..self.cursor_pos]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.input_buffer.remove(prev);
            self.cursor_pos = prev;
        }
    }

    pub fn cursor_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos = self.input_buffer[..self.cursor_pos]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_pos < self.input_buffer.len() {
            self.cursor_pos = self.input_buffer[self.cursor_pos..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_pos + i)
                .unwrap_or(self.input_buffer.len());
        }
    }

    /// Submit the current input buffer. Returns the input and clears the
    /// buffer; non-blank input is appended to the history.
    pub fn submit_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_pos = 0;
        self.history_cursor = None;

        let trimmed = input.trim();
        if !trimmed.is_empty() && self.history.back().map(String::as_str) != Some(trimmed) {
            if self.history.len() >= self.history_size {
                self.history.pop_front();
            }
            self.history.push_back(trimmed.to_string());
        }
        input
    }

    pub fn history(&self) -> &VecDeque<String> {
        &self.history
    }

    /// Step back to the previous history entry.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(idx);
        let entry = self.history[idx].clone();
        self.set_input(entry);
    }

    /// Step forward in history; past the newest entry the line is cleared.
    pub fn history_next(&mut self) {
        match self.history_cursor {
            None => {}
            Some(i) if i + 1 < self.history.len() => {
                self.history_cursor = Some(i + 1);
                let entry = self.history[i + 1].clone();
                self.set_input(entry);
            }
            Some(_) => {
                self.history_cursor = None;
                self.set_input(String::new());
            }
        }
    }
}
