//! Terminal rendering of observations and replies

use chrono::Local;

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    timestamps: bool,
}

impl Renderer {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }

    pub fn render(&self, lines: Vec<String>) -> Vec<String> {
        if !self.timestamps {
            return lines;
        }
        let stamp = Local::now().format("%H:%M:%S");
        lines
            .into_iter()
            .map(|line| format!("[{}] {}", stamp, line))
            .collect()
    }
}
