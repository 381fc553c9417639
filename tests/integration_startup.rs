//! Integration test to ensure a session can start from files on disk.

use std::io::Write;
use tilechase::{
    generate_layout, ChaseError, ChaseResult, DetectionMode, GameCompletionState,
    GenerationConfig, LevelLayout, LevelSession, SessionConfig,
};

const MAP: &str = "\
#########
#P..#..G#
#.#.#.#D#
#...K..E#
#########
";

#[test]
fn test_basic_startup_from_files() -> ChaseResult<()> {
    let dir = tempfile::tempdir()?;

    let map_path = dir.path().join("level.txt");
    std::fs::write(&map_path, MAP)?;

    let config_path = dir.path().join("settings.json");
    let mut file = std::fs::File::create(&config_path)?;
    writeln!(
        file,
        r#"{{ "lives": 2, "keys_required": null, "agent": {{ "detection_mode": "proximity", "detection_radius": 3.0 }} }}"#
    )?;

    let layout = LevelLayout::load(&map_path)?;
    let config = SessionConfig::load(&config_path)?;
    assert_eq!(config.agent.detection_mode, DetectionMode::Proximity);

    let session = LevelSession::from_layout(layout, config, 12345)?;
    assert_eq!(session.lives(), 2);
    assert_eq!(session.keys_required(), 1);
    assert_eq!(session.agents().len(), 1);
    assert_eq!(session.completion(), GameCompletionState::Playing);
    assert!(session.in_cinematic());

    Ok(())
}

#[test]
fn test_bad_config_file_is_reported() -> ChaseResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "player": { "move_speed": -2.0 } }"#)?;

    assert!(matches!(
        SessionConfig::load(&path),
        Err(ChaseError::InvalidConfig(_))
    ));
    assert!(matches!(
        SessionConfig::load(dir.path().join("missing.json")),
        Err(ChaseError::Io(_))
    ));
    Ok(())
}

#[test]
fn test_generated_level_starts() -> ChaseResult<()> {
    let layout = generate_layout(&GenerationConfig::new(99))?;
    let mut session = LevelSession::from_layout(layout, SessionConfig::without_cinematics(), 99)?;
    assert_eq!(session.agents().len(), 2);
    assert_eq!(session.keys_required(), 3);

    for _ in 0..500 {
        session.advance(0.02);
        let cells: Vec<_> = session.agents().iter().map(|agent| agent.cell()).collect();
        for (i, cell) in cells.iter().enumerate() {
            assert!(!session.layout().walls.contains(cell));
            assert!(!cells[i + 1..].contains(cell), "two enemies share {}", cell);
        }
    }
    Ok(())
}
