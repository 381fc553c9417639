//! Performance tests for path finding and the session tick

use std::time::Instant;
use tilechase::{
    generate_layout, Cell, ChaseResult, GenerationConfig, GridIndex, LevelSession, PathFinder,
    SessionConfig, SpatialQueries,
};

#[test]
fn test_path_search_performance() -> ChaseResult<()> {
    // A large maze with loops gives the search plenty of branches
    let config = GenerationConfig {
        loop_chance: 0.15,
        ..GenerationConfig::new(7).with_size(101, 101)
    };
    let layout = generate_layout(&config)?;
    let mut level = layout.build_level(GridIndex::unit());
    level.open_gates();
    let finder = PathFinder::new().with_bounds(level.search_bounds());

    let goal = layout.goals[0];
    let start = layout.player;

    let start_time = Instant::now();
    let iterations = 50;
    let mut hops = 0;

    for _ in 0..iterations {
        let path = finder.find(start, goal, |cell, direction| {
            level.is_wall_at(cell.step(direction))
        });
        hops = path.hop_count();
    }

    let elapsed = start_time.elapsed();
    let avg_search_time = elapsed / iterations;

    println!("Average search time: {:?} ({} hops)", avg_search_time, hops);
    assert!(hops >= layout.player.manhattan_distance(goal) as usize);

    // Debug builds are slow; this only catches accidental blowups
    assert!(
        avg_search_time.as_millis() < 100,
        "Path search too slow: {:?}",
        avg_search_time
    );

    Ok(())
}

#[test]
fn test_unreachable_search_stays_bounded() -> ChaseResult<()> {
    let layout = generate_layout(&GenerationConfig::new(3).with_size(61, 61))?;
    let level = layout.build_level(GridIndex::unit());
    let finder = PathFinder::new().with_bounds(level.search_bounds());

    // Goal inside the outer wall ring can never be reached
    let goal = Cell::new(0, 0);
    let start_time = Instant::now();
    let path = finder.find(layout.player, goal, |cell, direction| {
        level.is_wall_at(cell.step(direction))
    });
    let elapsed = start_time.elapsed();

    println!("Exhaustive search time: {:?}", elapsed);
    assert!(!path.is_found());
    assert!(
        elapsed.as_millis() < 200,
        "Exhaustive search too slow: {:?}",
        elapsed
    );

    Ok(())
}

#[test]
fn test_session_tick_performance() -> ChaseResult<()> {
    let config = GenerationConfig {
        enemy_count: 8,
        ..GenerationConfig::new(12345).with_size(41, 31)
    };
    let layout = generate_layout(&config)?;
    let mut session = LevelSession::from_layout(layout, SessionConfig::default(), 12345)?;

    let start = Instant::now();
    let iterations = 2000;

    for _ in 0..iterations {
        session.advance(0.02);
        if session.is_over() {
            session.restart()?;
        }
    }

    let elapsed = start.elapsed();
    let avg_tick_time = elapsed / iterations;

    println!("Average tick time: {:?}", avg_tick_time);
    println!(
        "Theoretical max TPS: {:.1}",
        1.0 / avg_tick_time.as_secs_f64()
    );

    // Must fit comfortably inside a 50 Hz frame
    assert!(
        avg_tick_time.as_millis() < 10,
        "Session tick too slow: {:?}",
        avg_tick_time
    );

    Ok(())
}
