//! Kaleido headless driver
//!
//! Runs the engine against a fake display clock and a fake tilt sensor and
//! logs what a renderer would receive. Set `RUST_LOG=info` (or `debug`) to see it.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::f32::consts::TAU;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::JoinHandle;
    use std::time::Duration;

    use glam::Vec2;
    use kaleido::{
        Configuration, Engine, EngineEvent, GravityHandle, InterfaceOrientation, SensorSource,
        WorldGeometry,
    };

    /// Display refresh rate of the fake host
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Simulated run length in frames
    const FRAMES: u32 = 300;

    /// Sensor that slowly rocks the device from side to side on its own thread
    #[derive(Default)]
    struct RockingSensor {
        running: Arc<AtomicBool>,
        worker: Option<JoinHandle<()>>,
    }

    impl SensorSource for RockingSensor {
        fn subscribe(&mut self, gravity: GravityHandle, orientation: InterfaceOrientation) {
            self.running.store(true, Ordering::Release);
            let running = Arc::clone(&self.running);
            self.worker = Some(std::thread::spawn(move || {
                let mut phase = 0.0_f32;
                while running.load(Ordering::Acquire) {
                    // Device acceleration in g: mostly down, tilting left and right
                    let tilt = 0.6 * phase.sin();
                    gravity.set(orientation.screen_gravity(Vec2::new(tilt, -1.0)));
                    phase = (phase + 0.05) % TAU;
                    std::thread::sleep(Duration::from_millis(10));
                }
            }));
            log::info!("Tilt sensor subscribed ({orientation:?})");
        }

        fn unsubscribe(&mut self) {
            self.running.store(false, Ordering::Release);
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    log::warn!("Tilt sensor thread panicked");
                }
            }
            log::info!("Tilt sensor unsubscribed");
        }
    }

    pub fn run() -> Result<(), kaleido::ConfigError> {
        let mut config = Configuration::default();
        config.set_num_regions(6)?;
        config.set_num_items_per_region(12)?;
        log::debug!("Configuration:\n{}", config.to_json()?);

        let mut engine = Engine::new(config);

        let updates = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&updates);
        engine.subscribe(move |event| match event {
            EngineEvent::StateUpdated => counter.set(counter.get() + 1),
            EngineEvent::Regenerated { particles } => {
                log::info!("Renderer notified: {particles} new particles");
            }
        });

        let viewport = WorldGeometry::fit_to_viewport(800.0, 600.0);
        engine.set_world_geometry(viewport.center, viewport.radius);
        engine.set_sensor(Box::new(RockingSensor::default()));
        engine.start();

        for frame in 0..FRAMES {
            engine.tick(FRAME_DT);

            // Halfway through, bump elasticity above 1 for gain bounces
            if frame == FRAMES / 2 {
                engine.update_configuration(|c| c.set_item_elasticity(1.15))?;
            }
            std::thread::sleep(Duration::from_secs_f32(FRAME_DT / 4.0));
        }

        engine.stop();

        log::info!("{} state updates over {FRAMES} frames", updates.get());
        if let Some(snapshot) = engine.render_snapshot() {
            let instances = engine.projected_instances();
            log::info!(
                "{} particles -> {} draw instances",
                snapshot.particles.len(),
                instances.len()
            );
            match serde_json::to_string(&snapshot) {
                Ok(json) => log::debug!("Final snapshot: {json}"),
                Err(e) => log::warn!("Could not serialize snapshot: {e}"),
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Kaleido (headless) starting...");

    if let Err(e) = headless::run() {
        log::error!("Kaleido failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by the host page; there is nothing to run here
}
