/// Typewriter-style text reveal used for speech bubbles

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    text: String,
    // byte offset of every char boundary after the first char, plus text.len()
    boundaries: Vec<usize>,
    shown: usize,
    chars_per_tick: usize,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, chars_per_tick: usize) -> Self {
        let text = text.into();
        let boundaries = text
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .filter(|&i| i > 0)
            .collect();
        Self {
            text,
            boundaries,
            shown: 0,
            chars_per_tick: chars_per_tick.max(1),
        }
    }

    /// Reveal the next chunk and return everything visible so far.
    pub fn tick(&mut self) -> &str {
        self.shown = (self.shown + self.chars_per_tick).min(self.boundaries.len());
        self.visible()
    }

    pub fn visible(&self) -> &str {
        match self.shown {
            0 => "",
            n => &self.text[..self.boundaries[n - 1]],
        }
    }

    pub fn skip(&mut self) {
        self.shown = self.boundaries.len();
    }

    pub fn is_finished(&self) -> bool {
        self.shown == self.boundaries.len()
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// Ticks left until the whole text is visible.
    pub fn remaining_ticks(&self) -> usize {
        let left = self.boundaries.len() - self.shown;
        left.div_ceil(self.chars_per_tick)
    }
}
