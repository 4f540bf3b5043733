use platformer_engine::{CombatConfig, Entity, Roster, TileMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeathCause {
    Enemy,
    Fire,
    Fell,
}

impl DeathCause {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Enemy => "enemy",
            Self::Fire => "fire",
            Self::Fell => "fell",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CombatOutcome {
    pub(crate) kills: u32,
    pub(crate) death: Option<DeathCause>,
}

/// Pairwise player-vs-world checks for one tick. Attacks land before
/// contact damage, so an enemy struck on the same tick it touches the player
/// dies harmlessly.
pub(crate) fn resolve_interactions(
    roster: &mut Roster,
    map: &TileMap,
    config: &CombatConfig,
) -> CombatOutcome {
    let mut outcome = CombatOutcome::default();
    let (Some(player), npcs) = roster.split_player_mut() else {
        return outcome;
    };
    if !player.body.alive {
        return outcome;
    }

    let hitbox = player.attack_hitbox(config.attack_range);
    let player_box = player.body.aabb();
    let passes_enemies = player.is_dashing();

    for npc in npcs.iter_mut() {
        match npc {
            Entity::Enemy(enemy) if enemy.body.alive => {
                let enemy_box = enemy.body.aabb();
                if hitbox.is_some_and(|hitbox| hitbox.overlaps(&enemy_box)) {
                    enemy.body.alive = false;
                    enemy.move_x = 0.0;
                    outcome.kills += 1;
                    player.grant_dash_charge();
                    debug!(x = enemy.body.x, y = enemy.body.y, "enemy_defeated");
                } else if !passes_enemies && enemy_box.overlaps(&player_box) {
                    outcome.death.get_or_insert(DeathCause::Enemy);
                }
            }
            Entity::Fire(fire) if fire.active => {
                if fire.body.aabb().overlaps(&player_box) {
                    fire.extinguish();
                    outcome.death.get_or_insert(DeathCause::Fire);
                }
            }
            _ => {}
        }
    }

    if player.body.top() > map.pixel_height() {
        outcome.death.get_or_insert(DeathCause::Fell);
    }
    if outcome.death.is_some() {
        player.kill();
    }
    outcome
}
