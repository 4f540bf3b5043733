#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    RunLeft,
    RunRight,
    Jump,
    Attack,
    Dash,
    Restart,
    ToggleOverlay,
    Quit,
}

const ACTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

impl InputAction {
    /// Actions that fire once per key press rather than while held.
    pub const EDGE_TRIGGERED: [InputAction; 5] = [
        InputAction::Jump,
        InputAction::Attack,
        InputAction::Dash,
        InputAction::Restart,
        InputAction::ToggleOverlay,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::RunLeft => 0,
            InputAction::RunRight => 1,
            InputAction::Jump => 2,
            InputAction::Attack => 3,
            InputAction::Dash => 4,
            InputAction::Restart => 5,
            InputAction::ToggleOverlay => 6,
            InputAction::Quit => 7,
        }
    }

    pub fn is_edge_triggered(self) -> bool {
        Self::EDGE_TRIGGERED.contains(&self)
    }
}
