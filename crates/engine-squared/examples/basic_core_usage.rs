//! Basic core usage — falling balls on a fixed timestep, landing events and
//! a clean shutdown.
//!
//! Run with `RUST_LOG=info cargo run --example basic_core_usage`. With the
//! default `diagnostics` feature, start `engine-squared-telemetry` first to
//! watch the frame live.

use engine_squared::prelude::*;

#[derive(Debug)]
struct Velocity(Vec3);

#[derive(Clone, Debug)]
struct Landed {
    entity: Entity,
}

#[derive(Default)]
struct Stats {
    landed: u32,
    spawned: u32,
}

const GRAVITY: f32 = -9.81;
const TIME_LIMIT_SECS: f32 = 10.0;

fn main() -> Result<(), EngineError> {
    #[cfg(feature = "diagnostics")]
    init_logger();
    #[cfg(not(feature = "diagnostics"))]
    env_logger::init();

    let mut core = Core::new();
    core.add_plugins((EventPlugin, ObjectPlugin));
    #[cfg(feature = "diagnostics")]
    core.add_plugin(DiagnosticsPlugin);

    core.register_resource(Stats::default());
    core.resource_mut::<EventManager>()
        .register_scheduled_callback::<Landed, Update>(on_landed);

    core.systems::<Startup>().add(spawn_balls);
    core.systems::<FixedTimeUpdate>().add(fall);
    core.register_systems((detect_landing, enforce_time_limit));
    core.systems::<Shutdown>().add(report);

    core.run_core()
}

fn spawn_balls(core: &mut Core) {
    for (i, height) in [2.0, 5.0, 10.0].into_iter().enumerate() {
        let ball = Entity::create(core);
        ball.add_component(core, Transform::from_xyz(i as f32 * 2.0, height, 0.0));
        ball.add_component(core, Velocity(Vec3::ZERO));
        ball.add_component(core, shape::sphere(0.5, 16, 8));
        core.resource_mut::<Stats>().spawned += 1;
    }
}

fn fall(core: &mut Core) {
    let dt = core.scheduler::<FixedTimeUpdate>().tick_rate().as_secs_f32();
    core.registry_mut()
        .query::<(&mut Transform, &mut Velocity)>(|_, (transform, velocity)| {
            velocity.0.y += GRAVITY * dt;
            transform.position += velocity.0 * dt;
        });
}

fn detect_landing(core: &mut Core) {
    let mut landed = Vec::new();
    core.registry_mut()
        .query::<(&mut Transform, &Velocity)>(|entity, (transform, _)| {
            if transform.position.y <= 0.0 {
                transform.position.y = 0.0;
                landed.push(entity);
            }
        });

    for entity in landed {
        entity.remove_component::<Velocity>(core);
        core.resource_mut::<EventManager>()
            .push_event(Landed { entity });
    }
}

fn on_landed(core: &mut Core, event: &Landed) {
    let elapsed = core.resource::<Time>().elapsed_secs();
    log::info!("Ball {} landed after {elapsed:.2}s", event.entity);

    let stats = core.resource_mut::<Stats>();
    stats.landed += 1;
    if stats.landed == stats.spawned {
        core.stop();
    }
}

fn enforce_time_limit(core: &mut Core) -> Result<(), String> {
    let elapsed = core.resource::<Time>().elapsed_secs();
    if elapsed > TIME_LIMIT_SECS {
        core.stop();
        return Err(format!("balls still falling after {elapsed:.1}s"));
    }
    Ok(())
}

fn report(core: &mut Core) {
    let stats = core.resource::<Stats>();
    let time = core.resource::<Time>();
    log::info!(
        "{}/{} balls landed in {} frames ({:.0} fps)",
        stats.landed,
        stats.spawned,
        time.frame_count(),
        time.fps()
    );
}
