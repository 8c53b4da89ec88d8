/// What the module's shared glyph memory is currently loaded with.
///
/// Bars, big digits and custom glyphs all live in the same block of
/// re-programmable memory, so loading one silently wipes the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialMemory {
    None,
    HorizontalBar,
    VerticalBar,
    BigDigit,
    CustomGlyph,
}

impl Default for SpecialMemory {
    fn default() -> Self {
        SpecialMemory::None
    }
}

/// Tracks the last mode loaded into glyph memory.
#[derive(Debug, Default)]
pub struct ModeTracker {
    current: SpecialMemory,
}

impl ModeTracker {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn current(&self) -> SpecialMemory {
        self.current
    }

    /// Switches to `mode`. Returns true if the mode changed, meaning the
    /// caller has to send the mode's initialization command first.
    pub fn enter(&mut self, mode: SpecialMemory) -> bool {
        if self.current == mode {
            return false;
        }
        self.current = mode;
        true
    }

    /// Custom glyphs are defined per slot, so there is nothing to initialize.
    pub fn define_glyph(&mut self) {
        self.current = SpecialMemory::CustomGlyph;
    }
}
