#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    DarkGray,
    Red,
    Green,
}

/// One grid cell's content. Two elements are "the same entity" when their
/// glyphs match; colors and the blocking flag are presentation and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
    pub blocking: bool,
}

impl Element {
    pub const EMPTY: Element = Element::new(' ', Color::Default, Color::Default, false);
    pub const WALL: Element = Element::new('▤', Color::Black, Color::DarkGray, true);
    pub const VEGETATION: Element = Element::new('♣', Color::Green, Color::Default, false);
    pub const ENEMY: Element = Element::new('☠', Color::Red, Color::Default, true);
    pub const AVATAR: Element = Element::new('☺', Color::Black, Color::Default, true);
    pub const PORTAL: Element = Element::new('O', Color::Green, Color::Default, false);
    pub const TRAP: Element = Element::new('X', Color::Red, Color::Default, false);
    pub const GHOST: Element = Element::new('G', Color::DarkGray, Color::Default, false);
    pub const TREASURE: Element = Element::new('$', Color::Green, Color::Default, false);
    pub const GUARDIAN: Element = Element::new('@', Color::Red, Color::Default, true);

    pub const fn new(glyph: char, fg: Color, bg: Color, blocking: bool) -> Self {
        Self {
            glyph,
            fg,
            bg,
            blocking,
        }
    }

    pub fn is(&self, other: Element) -> bool {
        self.glyph == other.glyph
    }

    pub fn is_empty(&self) -> bool {
        self.is(Element::EMPTY)
    }
}

impl Default for Element {
    fn default() -> Self {
        Element::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_glyph_only() {
        let recolored = Element::new('G', Color::Red, Color::Green, true);
        assert!(recolored.is(Element::GHOST));
        assert!(!Element::GHOST.is(Element::GUARDIAN));
    }

    #[test]
    fn trap_is_walkable_and_guardian_is_not() {
        assert!(!Element::TRAP.blocking);
        assert!(Element::GUARDIAN.blocking);
        assert!(Element::default().is_empty());
    }
}
