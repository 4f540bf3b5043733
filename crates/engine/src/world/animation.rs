use super::entity::Facing;

pub const ATTACK_DURATION_TICKS: u32 = 10;
/// Attack timer value at which the swing switches to its second frame.
pub const ATTACK_FRAME_SPLIT_TICKS: u32 = 5;
pub const RUN_FRAME_COUNT: u32 = 4;
pub const RUN_FRAME_PERIOD_TICKS: u32 = 5;

const IDLE_SPRITES: [&str; 2] = ["idle_left", "idle_right"];
const RUN_SPRITES: [[&str; 4]; 2] = [
    ["run_left_1", "run_left_2", "run_left_3", "run_left_4"],
    ["run_right_1", "run_right_2", "run_right_3", "run_right_4"],
];
const ATTACK_SPRITES: [[&str; 2]; 2] = [
    ["attack_left_1", "attack_left_2"],
    ["attack_right_1", "attack_right_2"],
];
const DASH_RUN_FRAME: usize = 1;
const AIRBORNE_RUN_FRAME: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPose {
    Idle(Facing),
    /// `frame` is the 0-based run cycle index.
    Run { facing: Facing, frame: u32 },
    Airborne(Facing),
    Dash(Facing),
    /// `frame` is 0 for the wind-up and 1 for the follow-through.
    Attack { facing: Facing, frame: u32 },
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self::Idle(Facing::Right)
    }
}

impl PlayerPose {
    pub fn facing(self) -> Facing {
        match self {
            Self::Idle(facing)
            | Self::Airborne(facing)
            | Self::Dash(facing)
            | Self::Run { facing, .. }
            | Self::Attack { facing, .. } => facing,
        }
    }

    /// Atlas sprite shown for this pose.
    pub fn sprite_name(self) -> &'static str {
        match self {
            Self::Idle(facing) => IDLE_SPRITES[facing.index()],
            Self::Run { facing, frame } => {
                RUN_SPRITES[facing.index()][(frame % RUN_FRAME_COUNT) as usize]
            }
            Self::Airborne(facing) => RUN_SPRITES[facing.index()][AIRBORNE_RUN_FRAME],
            Self::Dash(facing) => RUN_SPRITES[facing.index()][DASH_RUN_FRAME],
            Self::Attack { facing, frame } => ATTACK_SPRITES[facing.index()][frame.min(1) as usize],
        }
    }
}

/// Per-tick facts the state machine chooses a pose from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationInput {
    pub attacking: bool,
    pub attack_timer: u32,
    pub dashing: bool,
    pub dash_direction: Facing,
    pub move_x: f32,
    pub is_jumping: bool,
    pub velocity_y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAnimation {
    facing: Facing,
    run_ticks: u32,
    pose: PlayerPose,
}

impl PlayerAnimation {
    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn pose(&self) -> PlayerPose {
        self.pose
    }

    pub fn run_frame(&self) -> u32 {
        match self.pose {
            PlayerPose::Run { frame, .. } => frame,
            _ => 0,
        }
    }

    /// Picks this tick's pose. Rules are tried in priority order and the
    /// first match wins; facing only follows intent once attack and dash
    /// have been ruled out.
    pub fn update(&mut self, input: &AnimationInput) -> PlayerPose {
        self.pose = self.select(input);
        self.pose
    }

    fn select(&mut self, input: &AnimationInput) -> PlayerPose {
        if input.attacking {
            let frame = u32::from(input.attack_timer >= ATTACK_FRAME_SPLIT_TICKS);
            return PlayerPose::Attack {
                facing: self.facing,
                frame,
            };
        }
        if input.dashing {
            return PlayerPose::Dash(input.dash_direction);
        }
        if let Some(facing) = Facing::from_intent(input.move_x) {
            self.facing = facing;
        }
        if input.is_jumping || input.velocity_y < 0.0 {
            return PlayerPose::Airborne(self.facing);
        }
        if input.move_x != 0.0 {
            let frame = (self.run_ticks / RUN_FRAME_PERIOD_TICKS) % RUN_FRAME_COUNT;
            self.run_ticks = self.run_ticks.wrapping_add(1);
            return PlayerPose::Run {
                facing: self.facing,
                frame,
            };
        }
        self.run_ticks = 0;
        PlayerPose::Idle(self.facing)
    }
}
