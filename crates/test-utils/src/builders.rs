#![allow(dead_code)]

/// Builder for block definition source text.
pub struct DefinitionBuilder {
    source: String,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self {
            source: String::new(),
        }
    }

    /// Append a block whose body is the given lines, indented by two spaces.
    pub fn block(mut self, name: &str, lines: &[&str]) -> Self {
        if !self.source.is_empty() {
            self.source.push('\n');
        }
        self.source.push_str(name);
        self.source.push_str(" {\n");
        for line in lines {
            self.source.push_str("  ");
            self.source.push_str(line);
            self.source.push('\n');
        }
        self.source.push_str("}\n");
        self
    }

    /// Append raw text (comments, malformed blocks, ...).
    pub fn raw(mut self, text: &str) -> Self {
        self.source.push_str(text);
        self
    }

    pub fn build(self) -> String {
        self.source
    }
}

impl Default for DefinitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The `dev` block used throughout the tests: one untracked line and two
/// tracked ones.
pub fn dev_block() -> String {
    DefinitionBuilder::new()
        .block("dev", &["$ echo hi", "% sleep 100", "@ echo wrap"])
        .build()
}
