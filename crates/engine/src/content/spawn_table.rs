use std::path::Path;

use serde::Deserialize;

use super::{read_json, ContentError};
use crate::world::SpawnRecord;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct StartPoint {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelTableDocument {
    player: StartPoint,
    #[serde(default)]
    spawns: Vec<SpawnRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LevelTable {
    pub player_start: (f32, f32),
    pub spawns: Vec<SpawnRecord>,
}

pub(crate) fn load_level_table(path: &Path) -> Result<LevelTable, ContentError> {
    let document: LevelTableDocument = read_json(path)?;
    let coordinates = std::iter::once((document.player.x, document.player.y))
        .chain(document.spawns.iter().map(|spawn| (spawn.x, spawn.y)));
    for (x, y) in coordinates {
        if !x.is_finite() || !y.is_finite() {
            return Err(ContentError::InvalidValue {
                path: path.to_path_buf(),
                message: format!("non-finite coordinate ({x}, {y})"),
            });
        }
    }
    Ok(LevelTable {
        player_start: (document.player.x, document.player.y),
        spawns: document.spawns,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::content::test_support::write;
    use crate::world::SpawnKind;

    #[test]
    fn reads_player_start_and_spawns() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{ "player": { "x": 32, "y": 96.5 }, "spawns": [ { "x": 1, "y": 2, "type": "fire" } ] }"#,
        );

        let table = load_level_table(&temp.path().join("level.json")).expect("table");
        assert_eq!(table.player_start, (32.0, 96.5));
        assert_eq!(table.spawns.len(), 1);
        assert_eq!(table.spawns[0].kind, SpawnKind::Fire);
    }

    #[test]
    fn spawns_are_optional() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "level.json", r#"{ "player": { "x": 0, "y": 0 } }"#);

        let table = load_level_table(&temp.path().join("level.json")).expect("table");
        assert!(table.spawns.is_empty());
    }

    #[test]
    fn missing_player_is_a_json_error() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "level.json", r#"{ "spawns": [] }"#);

        let error = load_level_table(&temp.path().join("level.json")).expect_err("no player");
        assert!(matches!(error, ContentError::Json { .. }));
    }
}
