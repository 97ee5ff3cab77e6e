use std::fmt::Display;

const INDENT: &str = "    ";

pub struct StringBuilder {
    lines: Vec<String>,
    depth: usize,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
        }
    }

    pub fn build(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn push<T: Display>(&mut self, text: T) {
        let text = text.to_string();

        for line in text.split('\n') {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines.push(format!("{}{line}", INDENT.repeat(self.depth)));
            }
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth -= 1;
    }
}
