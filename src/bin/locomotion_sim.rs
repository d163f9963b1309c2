//! Locomotion simulator CLI - run scripted agents through a rapier test level

use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::{Point3, Vector3};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use agent_locomotion::config::AgentConfig;
use agent_locomotion::game::constants::movement::TIMESTEP;
use agent_locomotion::game::input::ScriptedInput;
use agent_locomotion::game::physics::{PhysicsWorld, RapierCharacter, SharedPhysicsWorld};
use agent_locomotion::game::{Intent, LocomotionAgent, LocomotionEvent, LookOptions, TargetHandle};

const PLATFORM_ID: u64 = 1;
const AGENT_ID: u64 = 100;

#[derive(Parser)]
#[command(name = "locomotion-sim")]
#[command(about = "Agent locomotion simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted scenario at a fixed 60 Hz timestep
    Run {
        /// Agent TOML config (defaults are used when omitted)
        #[arg(short, long, env = "LOCOMOTION_CONFIG")]
        config: Option<PathBuf>,
        /// Scenario to play
        #[arg(short, long, value_enum, default_value_t = Scenario::Walk)]
        scenario: Scenario,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "180")]
        ticks: u32,
        /// Print one JSON state line per tick
        #[arg(long)]
        json: bool,
    },
    /// Validate a config file and print the effective values
    CheckConfig {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Walk forward, then sprint
    Walk,
    /// Sprint and jump over open ground
    Jump,
    /// Stand on a platform sliding along +X
    Platform,
    /// Idle while turning toward a fixed point
    Look,
    /// Spawn past the floor edge and fall until the watchdog recovers the agent
    Fall,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            scenario,
            ticks,
            json,
        } => run_scenario(config, scenario, ticks, json),
        Commands::CheckConfig { path } => check_config(path),
    }
}

fn load_config(path: Option<PathBuf>) -> AgentConfig {
    match path {
        Some(path) => match AgentConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => AgentConfig::default(),
    }
}

fn check_config(path: PathBuf) {
    let config = load_config(Some(path)).validated();
    match toml::to_string_pretty(&config) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn script_for(scenario: Scenario) -> ScriptedInput {
    match scenario {
        Scenario::Walk => ScriptedInput::new()
            .then(Intent::moving(0.0, 1.0), 1.0)
            .then(Intent::moving(0.0, 1.0).with_sprint(), 1.0),
        Scenario::Jump => ScriptedInput::new()
            .then(Intent::moving(0.0, 1.0).with_sprint(), 0.5)
            .then(Intent::moving(0.0, 1.0).with_sprint().with_jump(), 0.25)
            .then(Intent::moving(0.0, 1.0).with_sprint(), 1.5),
        Scenario::Platform | Scenario::Look | Scenario::Fall => ScriptedInput::new(),
    }
}

fn build_level(world: &mut PhysicsWorld) {
    // Floor top at y = 0
    world.add_static_box(Point3::new(0.0, -0.5, 0.0), Vector3::new(100.0, 0.5, 100.0));
    // Platform top at y = 0.5
    world.add_movable_platform(PLATFORM_ID, Point3::new(-20.0, 0.25, 0.0), Vector3::new(2.0, 0.25, 2.0));
    world.update_queries();
}

fn run_scenario(config_path: Option<PathBuf>, scenario: Scenario, ticks: u32, json: bool) {
    let config = load_config(config_path);

    let world: SharedPhysicsWorld = Rc::new(RefCell::new(PhysicsWorld::new()));
    build_level(&mut world.borrow_mut());

    let spawn = match scenario {
        Scenario::Platform => Point3::new(-20.0, 1.45, 0.0),
        Scenario::Fall => Point3::new(150.0, 0.95, 0.0),
        _ => Point3::new(0.0, 0.95, 0.0),
    };
    let character = RapierCharacter::spawn(&world, AGENT_ID, spawn);

    let mut agent = match LocomotionAgent::builder(config)
        .input(script_for(scenario))
        .ground_probe(character.clone())
        .move_primitive(character)
        .build()
    {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    agent.subscribe(|event: &LocomotionEvent| {
        tracing::info!(?event, "locomotion event");
    });

    if let Scenario::Look = scenario {
        let target = TargetHandle::point(Point3::new(10.0, 5.0, 0.0));
        if let Err(e) = agent.look_at_until_within_degrees(target, 0.5, LookOptions::default()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let mut platform_x = -20.0_f32;
    for tick in 0..ticks {
        if let Scenario::Platform = scenario {
            platform_x += 2.0 * TIMESTEP;
            world
                .borrow_mut()
                .move_platform(PLATFORM_ID, Point3::new(platform_x, 0.25, 0.0), TIMESTEP);
        }

        agent.tick(TIMESTEP);
        world.borrow_mut().step(TIMESTEP);

        if json {
            match serde_json::to_string(&agent.state()) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(tick, "failed to serialize state: {}", e),
            }
        }
    }

    let state = agent.state();
    tracing::info!(
        ticks,
        x = state.position.x,
        y = state.position.y,
        z = state.position.z,
        yaw = state.yaw,
        pitch = state.pitch,
        "simulation finished"
    );
    if !json {
        println!(
            "position=({:.3}, {:.3}, {:.3}) yaw={:.2} pitch={:.2} grounded={}",
            state.position.x, state.position.y, state.position.z, state.yaw, state.pitch, state.grounded
        );
    }
}
