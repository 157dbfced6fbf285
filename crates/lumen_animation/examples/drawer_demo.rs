//! Drawer Demo
//!
//! Drives a drawer controller, a repeating spinner and a fling against a
//! simulated 60 fps frame clock, printing the values frame by frame.
//!
//! Run with: RUST_LOG=lumen_animation=debug cargo run -p lumen_animation --example drawer_demo

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_animation::{
    Animatable, Animation, AnimationController, AnimationScheduler, Cubic, CurveTween,
    CurvedAnimation, FlingOptions, MotionTokens, RepeatOptions, Tween,
};

const FRAME: Duration = Duration::from_micros(16_667);
const TOKENS: &str = include_str!("motion.toml");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let tokens = MotionTokens::from_toml_str(TOKENS).context("loading motion tokens")?;
    let scheduler = AnimationScheduler::new();

    let drawer_config = tokens
        .controller("drawer")
        .context("missing `drawer` controller token")?;
    let drawer = AnimationController::from_config(drawer_config, &scheduler);

    // Width in logical pixels, eased on the way out
    let eased: Rc<dyn Animation<f64>> =
        Rc::new(CurvedAnimation::new(Rc::new(drawer.clone()), Cubic::FAST_OUT_SLOW_IN));
    let width = Tween::new(0.0_f32, 320.0).animate(eased);

    drawer.add_status_listener(|status| tracing::info!(%status, "drawer status"));

    println!("-- open drawer");
    drawer.forward(None).when_complete(|| println!("drawer open"));
    run_frames(&scheduler, |frame| {
        println!("{frame:>3}: width = {:6.1}", width.value());
    });

    println!("-- close drawer");
    drawer.reverse(None);
    run_frames(&scheduler, |frame| {
        println!("{frame:>3}: width = {:6.1}", width.value());
    });

    let spinner_config = tokens
        .controller("spinner")
        .context("missing `spinner` controller token")?;
    let spinner = AnimationController::from_config(spinner_config, &scheduler);
    let angle = Tween::new(0.0_f64, 360.0).chain(CurveTween::new(Cubic::EASE_IN_OUT));

    println!("-- spin for 30 frames");
    let spin = spinner.repeat_with(RepeatOptions {
        reverse: true,
        ..RepeatOptions::default()
    });
    for frame in 0..30 {
        scheduler.advance(FRAME);
        println!("{frame:>3}: angle = {:6.1}", angle.evaluate(&spinner));
    }
    spinner.stop();
    println!("spinner canceled: {}", spin.is_canceled());

    println!("-- fling drawer open");
    let settle = tokens
        .spring("settle")
        .context("missing `settle` spring token")?;
    drawer.fling_with(
        3.0,
        FlingOptions {
            spring: Some(settle),
            ..FlingOptions::default()
        },
    );
    run_frames(&scheduler, |frame| {
        println!(
            "{frame:>3}: value = {:.3} velocity = {:7.3}",
            drawer.value(),
            drawer.velocity()
        );
    });

    drawer.dispose();
    spinner.dispose();
    Ok(())
}

/// Advance the clock until every ticker has finished
fn run_frames(scheduler: &AnimationScheduler, mut on_frame: impl FnMut(u64)) {
    let mut frame = 0;
    while scheduler.advance(FRAME) {
        on_frame(frame);
        frame += 1;
    }
    on_frame(frame);
}
