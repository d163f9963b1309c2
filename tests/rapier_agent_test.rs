//! Agents driven through the rapier world: KCC movement, ray probes and kinematic platforms.
//!
//! Run with: cargo test --test rapier_agent_test -- --nocapture

use nalgebra::{Point3, Vector3};
use std::cell::RefCell;
use std::rc::Rc;

use agent_locomotion::config::AgentConfig;
use agent_locomotion::game::input::ManualInput;
use agent_locomotion::game::physics::{PhysicsWorld, RapierCharacter, SharedPhysicsWorld};
use agent_locomotion::game::{EventLog, Intent, LocomotionAgent, LocomotionEvent};

const DT: f32 = 1.0 / 60.0;
const PLATFORM_ID: u64 = 1;

fn level() -> SharedPhysicsWorld {
    let mut world = PhysicsWorld::new();
    // Floor top at y = 0
    world.add_static_box(Point3::new(0.0, -0.5, 0.0), Vector3::new(100.0, 0.5, 100.0));
    // Platform top at y = 0.5, well away from the spawn
    world.add_movable_platform(PLATFORM_ID, Point3::new(-20.0, 0.25, 0.0), Vector3::new(3.0, 0.25, 3.0));
    world.update_queries();
    Rc::new(RefCell::new(world))
}

fn spawn_agent(world: &SharedPhysicsWorld, position: Point3<f32>) -> (LocomotionAgent, ManualInput, EventLog) {
    let input = ManualInput::new();
    let character = RapierCharacter::spawn(world, 100, position);
    let mut agent = LocomotionAgent::builder(AgentConfig::default())
        .input(input.clone())
        .ground_probe(character.clone())
        .move_primitive(character)
        .build()
        .expect("collaborators provided");
    let log = EventLog::new();
    agent.subscribe(log.clone());
    (agent, input, log)
}

#[test]
fn test_walk_forward_on_floor() {
    let world = level();
    let (mut agent, input, log) = spawn_agent(&world, Point3::new(0.0, 0.95, 0.0));
    input.set(Intent::moving(0.0, 1.0));

    for _ in 0..60 {
        agent.tick(DT);
        world.borrow_mut().step(DT);
    }

    let p = agent.position();
    println!("after 1s walk: {:?}", p);
    assert!((p.z - 3.0).abs() < 0.2, "walked z={}", p.z);
    assert!(p.x.abs() < 0.05);
    assert!(p.y > 0.8 && p.y < 1.1, "stayed on floor, y={}", p.y);
    assert!(agent.state().grounded);
    assert_eq!(log.events(), vec![LocomotionEvent::StartMove]);
}

#[test]
fn test_jump_and_land_on_floor() {
    let world = level();
    let (mut agent, input, log) = spawn_agent(&world, Point3::new(0.0, 0.95, 0.0));

    // Settle first so the probe reports ground.
    for _ in 0..5 {
        agent.tick(DT);
        world.borrow_mut().step(DT);
    }
    assert!(agent.state().grounded);

    input.set(Intent::idle().with_jump());
    agent.tick(DT);
    world.borrow_mut().step(DT);
    input.set(Intent::idle());

    let mut apex = 0.0_f32;
    for _ in 0..180 {
        agent.tick(DT);
        world.borrow_mut().step(DT);
        apex = apex.max(agent.position().y);
    }

    println!("apex={apex}");
    assert!(apex > 1.5, "jump should lift the capsule, apex={apex}");
    assert_eq!(log.count(LocomotionEvent::Jump), 1);
    assert_eq!(log.count(LocomotionEvent::Land), 1);
    assert!(agent.state().can_jump_again);
}

#[test]
fn test_platform_carries_standing_agent() {
    let world = level();
    let (mut agent, _input, _log) = spawn_agent(&world, Point3::new(-20.0, 1.45, 0.0));

    for _ in 0..3 {
        agent.tick(DT);
        world.borrow_mut().step(DT);
    }
    let start = agent.position();

    let mut platform_x = -20.0_f32;
    for _ in 0..60 {
        platform_x += 1.0 * DT;
        world
            .borrow_mut()
            .move_platform(PLATFORM_ID, Point3::new(platform_x, 0.25, 0.0), DT);
        agent.tick(DT);
        world.borrow_mut().step(DT);
    }

    let end = agent.position();
    println!("platform carry: {:?} -> {:?}", start, end);
    assert_eq!(agent.state().platform.surface, Some(PLATFORM_ID));
    assert!((end.x - start.x - 1.0).abs() < 0.15, "carried dx={}", end.x - start.x);
}

#[test]
fn test_fall_into_void_recovers_to_spawn() {
    let world: SharedPhysicsWorld = Rc::new(RefCell::new(PhysicsWorld::new()));
    let config = AgentConfig::from_toml_str(
        r#"
        [recovery]
        floor_y = -5.0
        check_interval = 0.5
        spawn_position = [0.0, 10.0, 0.0]
        "#,
    )
    .unwrap();
    let input = ManualInput::new();
    let character = RapierCharacter::spawn(&world, 7, Point3::new(0.0, 0.0, 0.0));
    let mut agent = LocomotionAgent::builder(config)
        .input(input)
        .ground_probe(character.clone())
        .move_primitive(character)
        .build()
        .unwrap();

    for _ in 0..120 {
        agent.tick(DT);
        world.borrow_mut().step(DT);
        if agent.watchdog().recoveries() > 0 {
            break;
        }
    }

    assert_eq!(agent.watchdog().recoveries(), 1);
    assert_eq!(agent.position(), Point3::new(0.0, 10.0, 0.0));
}
