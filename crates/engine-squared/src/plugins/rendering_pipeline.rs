//! # Rendering Pipeline — Frame Stages
//!
//! Marker schedulers that give renderer plugins fixed places to hook into.
//! [`RenderingPipelinePlugin`] chains them around the core schedulers:
//!
//! ```text
//! Init → Setup → Startup → PreUpdate → [FixedTimeUpdate, RelativeTimeUpdate]
//!      → Update → Preparation → Extraction → PipelineCreation → Batching
//!      → PipelineExecution → Submission → Presentation → Shutdown
//! ```
//!
//! `Init` and `Setup` run once, like `Startup`. The rest run every frame.

use crate::core::Core;
use crate::plugin::Plugin;
use crate::scheduler::{
    FixedTimeUpdate, RelativeTimeUpdate, Scheduler, Shutdown, Startup, Update, run_once,
};

macro_rules! once_schedulers {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            done: bool,
        }

        impl Scheduler for $name {
            fn prepare(&mut self, _: &mut Core) -> usize {
                run_once(&mut self.done)
            }
        }
    )+};
}

macro_rules! frame_schedulers {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name;

        impl Scheduler for $name {
            fn prepare(&mut self, _: &mut Core) -> usize {
                1
            }
        }
    )+};
}

once_schedulers! {
    /// Creates the window and GPU context.
    Init,
    /// Loads pipeline-wide resources.
    Setup,
}

frame_schedulers! {
    /// Input polling and other work that must precede simulation.
    PreUpdate,
    Preparation,
    /// Copies render data out of the simulation.
    Extraction,
    PipelineCreation,
    Batching,
    PipelineExecution,
    Submission,
    /// Presents the frame; per-frame input state is cleared here.
    Presentation,
}

/// Registers the pipeline schedulers and their ordering.
#[derive(Default)]
pub struct RenderingPipelinePlugin;

impl Plugin for RenderingPipelinePlugin {
    fn bind(&self, core: &mut Core) {
        core.register_scheduler(Init::default());
        core.register_scheduler(Setup::default());
        core.register_scheduler(PreUpdate);
        core.register_scheduler(Preparation);
        core.register_scheduler(Extraction);
        core.register_scheduler(PipelineCreation);
        core.register_scheduler(Batching);
        core.register_scheduler(PipelineExecution);
        core.register_scheduler(Submission);
        core.register_scheduler(Presentation);

        core.set_scheduler_before::<Init, Setup>();
        core.set_scheduler_before::<Setup, Startup>();
        core.set_scheduler_before::<Startup, PreUpdate>();
        core.set_scheduler_before::<PreUpdate, FixedTimeUpdate>();
        core.set_scheduler_before::<PreUpdate, RelativeTimeUpdate>();
        core.set_scheduler_before::<FixedTimeUpdate, Update>();
        core.set_scheduler_before::<RelativeTimeUpdate, Update>();
        core.set_scheduler_before::<PreUpdate, Update>();
        core.set_scheduler_before::<Update, Preparation>();
        core.set_scheduler_before::<Preparation, Extraction>();
        core.set_scheduler_before::<Extraction, PipelineCreation>();
        core.set_scheduler_before::<PipelineCreation, Batching>();
        core.set_scheduler_before::<Batching, PipelineExecution>();
        core.set_scheduler_before::<PipelineExecution, Submission>();
        core.set_scheduler_before::<Submission, Presentation>();
        core.set_scheduler_before::<Presentation, Shutdown>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_chained() {
        let mut core = Core::new();
        core.add_plugin(RenderingPipelinePlugin);
        assert_eq!(
            core.scheduler_order().unwrap(),
            vec![
                "Init",
                "Setup",
                "Startup",
                "PreUpdate",
                "FixedTimeUpdate",
                "RelativeTimeUpdate",
                "Update",
                "Preparation",
                "Extraction",
                "PipelineCreation",
                "Batching",
                "PipelineExecution",
                "Submission",
                "Presentation",
                "Shutdown",
            ]
        );
    }

    #[test]
    fn init_and_setup_run_once() {
        #[derive(Default)]
        struct Runs(Vec<&'static str>);

        let mut core = Core::new();
        core.add_plugin(RenderingPipelinePlugin);
        core.register_resource(Runs::default());
        core.systems::<Init>()
            .add(|core: &mut Core| core.resource_mut::<Runs>().0.push("init"));
        core.systems::<Setup>()
            .add(|core: &mut Core| core.resource_mut::<Runs>().0.push("setup"));
        core.systems::<Presentation>()
            .add(|core: &mut Core| core.resource_mut::<Runs>().0.push("present"));

        core.run_systems().unwrap();
        core.run_systems().unwrap();
        assert_eq!(
            core.resource::<Runs>().0,
            ["init", "setup", "present", "present"]
        );
    }
}
