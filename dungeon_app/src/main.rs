//! Dungeon culling demo
//!
//! Builds a small in-memory dungeon, walks an observer down its corridor,
//! and logs what the culling pipeline decides each frame: cells culled,
//! cells drawn, batches formed, and what happens when a door closes.

use std::time::Instant;

use culling_engine::prelude::*;

/// Two rooms joined by a corridor with a door at each end.
struct Dungeon {
    world: GridWorld,
    door_west: GridCoordinate,
    door_east: GridCoordinate,
    targets: Vec<GridCoordinate>,
}

impl Dungeon {
    fn build() -> Self {
        let mut world = GridWorld::new();

        // West room
        world.hollow_box(
            GridCoordinate::new(0, 0, 0),
            GridCoordinate::new(12, 5, 12),
            GridWorld::STONE,
        );
        // East room
        world.hollow_box(
            GridCoordinate::new(20, 0, 0),
            GridCoordinate::new(32, 5, 12),
            GridWorld::STONE,
        );
        // Corridor between them
        world.hollow_box(
            GridCoordinate::new(12, 1, 5),
            GridCoordinate::new(20, 4, 8),
            GridWorld::STONE,
        );
        let door_west = GridCoordinate::new(12, 2, 6);
        let door_east = GridCoordinate::new(20, 2, 6);
        world.set_door(door_west, true);
        world.set_door(door_east, true);

        // A few target cells spread across both rooms
        let targets = vec![
            GridCoordinate::new(3, 2, 3),
            GridCoordinate::new(10, 2, 10),
            GridCoordinate::new(23, 2, 3),
            GridCoordinate::new(30, 2, 10),
        ];

        Self {
            world,
            door_west,
            door_east,
            targets,
        }
    }
}

fn frame_matrices(observer: Point3) -> (Mat4, Mat4) {
    let projection = Mat4::new_perspective(
        16.0 / 9.0,
        std::f32::consts::FRAC_PI_3,
        0.1,
        200.0,
    );
    let view = Mat4::look_at_rh(
        &observer,
        &Point3::new(observer.x + 1.0, observer.y, observer.z),
        &Vec3::new(0.0, 1.0, 0.0),
    );
    (projection, view)
}

fn run_frame(
    engine: &CullingEngine,
    dungeon: &GridWorld,
    targets: &[GridCoordinate],
    observer_pos: Point3,
    observer: ObserverKey,
    frame_ms: f32,
) -> (usize, usize) {
    let (projection, view) = frame_matrices(observer_pos);
    engine.begin_frame(dungeon, &projection, &view, frame_ms);

    let mut drawn = 0;
    let mut culled = 0;
    for &target in targets {
        if engine.should_render(dungeon, target, observer_pos, observer) {
            drawn += 1;
        } else {
            culled += 1;
        }
    }
    (drawn, culled)
}

fn main() {
    culling_engine::foundation::logging::init();
    log::info!("building dungeon world");

    let mut dungeon = Dungeon::build();
    let engine = CullingEngine::new(CullingConfig::default());

    let mut observer_pos = Point3::new(2.5, 2.5, 6.5);
    let observer = engine.register_observer(GridCoordinate::containing(observer_pos));

    let mut timer = Timer::new();
    let start = Instant::now();

    // Walk the observer east through the west room for a few simulated
    // seconds, then slam the corridor doors and keep walking.
    let mut doors_closed = false;
    for frame in 0..240u32 {
        timer.update();
        dungeon.world.advance_ticks(1);
        observer_pos.x += 0.05;

        if frame == 120 && !doors_closed {
            doors_closed = true;
            dungeon.world.set_door_open(dungeon.door_west, false);
            dungeon.world.set_door_open(dungeon.door_east, false);
            engine.clear_region_cache();
            log::info!("frame {frame}: corridor doors closed");
        }

        let (drawn, culled) = run_frame(
            &engine,
            &dungeon.world,
            &dungeon.targets,
            observer_pos,
            observer,
            timer.delta_millis(),
        );

        if frame % 60 == 0 {
            let stats = engine.stats_snapshot();
            let outdoors = dungeon
                .world
                .can_see_sky(GridCoordinate::containing(observer_pos));
            log::info!(
                "frame {frame}: drawn {drawn}, culled {culled}, rooms {}, groups {}, \
                 cached regions {}, batch efficiency {:.2}, outdoors {outdoors}",
                stats.room_count,
                stats.group_count,
                stats.cached_regions,
                stats.batches.efficiency(),
            );
        }
    }

    let submission = engine.collect_submission(observer_pos);
    log::info!(
        "final submission: {} batches, {} individual cells, {:.1}s elapsed, {:.1} fps average",
        submission.batches.len(),
        submission.individual.len(),
        start.elapsed().as_secs_f32(),
        timer.average_fps(),
    );

    engine.clear_all();
    log::info!("engine torn down");
}
