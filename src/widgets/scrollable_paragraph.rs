#[derive(Debug, Default, Clone)]
pub struct ScrollableParagraphState {
    pub content: String,
    pub scroll_offset_vertical: u16,
    width: u16,
    height: u16,
}

impl ScrollableParagraphState {
    pub fn new(content: String) -> Self {
        Self { content, ..Self::default() }
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
        self.scroll_offset_vertical = 0; // Reset scroll when content changes
    }

    /// Inner size of the panel the paragraph is drawn in.
    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.scroll_offset_vertical = self.scroll_offset_vertical.min(self.max_scroll());
    }

    // Approximates wrapping by character count.
    fn wrapped_line_count(&self) -> u16 {
        let width = usize::from(self.width.max(1));
        let lines: usize = self
            .content
            .lines()
            .map(|line| line.chars().count().max(1).div_ceil(width))
            .sum();
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    pub fn max_scroll(&self) -> u16 {
        self.wrapped_line_count().saturating_sub(self.height)
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset_vertical = self.scroll_offset_vertical.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset_vertical =
            self.scroll_offset_vertical.saturating_add(amount).min(self.max_scroll());
    }
}
