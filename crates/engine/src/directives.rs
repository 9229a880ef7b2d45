use crate::world::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalDirective {
    Use { at: Position },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapDirective {
    Activate { at: Position },
    Deactivate { at: Position },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostDirective {
    Pursue,
    Patrol,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreasureDirective {
    Appear { at: Position },
    Collect { at: Position },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianDirective {
    Wake,
    Sleep,
}
