//! Immersive gallery demo
//!
//! Builds a ring of exhibit panels, wires the engine runtime onto a
//! headless render backend, and scripts a short immersive session: enter,
//! walk, turn, boost, point at an exhibit, grab it, release it. Frame
//! pacing comes from the backend's frame pump, standing in for the headset
//! compositor. Run with `RUST_LOG=info` to watch the session unfold; pass
//! a `.toml` or `.ron` path to override the default configuration.

mod ring;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ring::place_ring;
use xr_engine::prelude::*;

/// Simulated frame interval, roughly 60 Hz
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Length of the scripted session in frames
const TOTAL_FRAMES: u32 = 120;

/// Exhibit titles placed around the gallery ring
const EXHIBIT_TITLES: [&str; 8] = [
    "Nebula", "Tides", "Orrery", "Glacier", "Aurora", "Canopy", "Dunes", "Reef",
];

fn main() -> Result<(), RuntimeError> {
    xr_engine::foundation::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => RuntimeConfig::load_from_file(&path)?,
        None => RuntimeConfig {
            grabbable: true,
            ..RuntimeConfig::default()
        },
    };

    let backend = HeadlessBackend::new(1280, 720);
    let pump = backend.frame_pump();
    let backend = Rc::new(RefCell::new(backend));
    let backend_dyn: Rc<RefCell<dyn RenderBackend>> = backend.clone();

    let mut runtime = RuntimeBuilder::new(config)
        .with_pick_filter(Box::new(|_key, node: &Node| {
            node.name.starts_with("exhibit-")
        }))
        .build(backend_dyn)?;

    populate_gallery(&runtime);
    runtime.init()?;
    runtime.handle_resize(1280, 720);

    // One frame before the session begins, like a desktop preview
    runtime.render();

    runtime.start();
    for frame in 0..TOTAL_FRAMES {
        script_frame(&runtime, &backend, frame);
        pump.fire();
        report(&runtime, frame);
        std::thread::sleep(FRAME_INTERVAL);
    }
    runtime.stop();

    log::info!("gallery demo finished");
    Ok(())
}

/// Insert the exhibit panels on a ring around the viewer
fn populate_gallery(runtime: &Runtime) {
    let scene = runtime.scene();
    let mut scene = scene.borrow_mut();
    let positions = place_ring(1, 1.6, 0.5, 0.9, EXHIBIT_TITLES.len());
    for (i, position) in positions.into_iter().enumerate() {
        scene.insert(
            Node::new(NodeKind::Mesh, format!("exhibit-{i}"))
                .with_position(position)
                .with_radius(0.4),
        );
        log::debug!("placed exhibit {i} ({})", EXHIBIT_TITLES[i]);
    }
}

/// Drive the scripted session for one frame
fn script_frame(runtime: &Runtime, backend: &Rc<RefCell<HeadlessBackend>>, frame: u32) {
    match frame {
        // Waiting room: no session yet, locomotion reports red
        0..=9 => {}

        // Enter the immersive session with both controllers tracked
        10 => {
            backend.borrow_mut().begin_session(XrSession {
                input_sources: vec![
                    InputSource::new(Handedness::Left).with_gamepad(Gamepad::default()),
                    InputSource::new(Handedness::Right).with_gamepad(Gamepad::default()),
                ],
            });
            set_gamepad(backend, Handedness::Left, 0.0, 0.0, GamepadButtons::empty());
            set_gamepad(backend, Handedness::Right, 0.0, 0.0, GamepadButtons::empty());
        }

        // Walk forward on the left stick
        11..=39 => set_gamepad(backend, Handedness::Left, 0.0, -1.0, GamepadButtons::empty()),

        // Rest: input present, nothing past the dead-zone
        40..=49 => set_gamepad(backend, Handedness::Left, 0.0, 0.0, GamepadButtons::empty()),

        // Turn on the right stick, with a speed boost held partway
        50..=69 => {
            let buttons = if (60..=64).contains(&frame) {
                GamepadButtons::BUTTON_1
            } else {
                GamepadButtons::empty()
            };
            set_gamepad(backend, Handedness::Right, 0.6, 0.0, buttons);
            set_gamepad(backend, Handedness::Left, 0.0, -0.5, GamepadButtons::empty());
        }

        // Settle, then aim the controller at the first exhibit
        70..=TOTAL_FRAMES => {
            set_gamepad(backend, Handedness::Left, 0.0, 0.0, GamepadButtons::empty());
            set_gamepad(backend, Handedness::Right, 0.0, 0.0, GamepadButtons::empty());
            // Hold the pose steady once something is held so the grabbed
            // exhibit rides a stable hand
            if runtime.selected().is_none() {
                aim_controller_at(runtime, backend, "exhibit-0");
            }
            if frame == 75 {
                set_selecting(backend, true);
                log::info!("select gesture started");
            }
            if frame == 100 {
                set_selecting(backend, false);
                log::info!("select gesture ended");
            }
        }

        _ => {}
    }
}

/// Write one hand's stick and button state into the session
fn set_gamepad(
    backend: &Rc<RefCell<HeadlessBackend>>,
    hand: Handedness,
    x: f32,
    y: f32,
    buttons: GamepadButtons,
) {
    let mut backend = backend.borrow_mut();
    let Some(session) = backend.session_mut() else {
        return;
    };
    if let Some(source) = session.source_mut(hand) {
        source.gamepad = Some(Gamepad {
            axes: vec![0.0, 0.0, x, y],
            buttons,
        });
    }
}

/// Flip the right controller's select input
fn set_selecting(backend: &Rc<RefCell<HeadlessBackend>>, selecting: bool) {
    let mut backend = backend.borrow_mut();
    let Some(session) = backend.session_mut() else {
        return;
    };
    if let Some(source) = session.source_mut(Handedness::Right) {
        source.selecting = selecting;
    }
}

/// Pose the tracked controller so its ray passes through the named exhibit
fn aim_controller_at(
    runtime: &Runtime,
    backend: &Rc<RefCell<HeadlessBackend>>,
    target_name: &str,
) {
    let scene = runtime.scene();
    let scene = scene.borrow();

    let Some(&target) = scene
        .children(scene.root())
        .iter()
        .find(|&&key| scene.get(key).is_some_and(|node| node.name == target_name))
    else {
        return;
    };
    let (Some(target_world), Some(rig_node)) = (
        scene.world_position(target),
        scene.get(runtime.camera_rig()),
    ) else {
        return;
    };

    // Controller poses are rig-local: bring the target into rig space and
    // point the hand's -Z at it from shoulder height
    let rig_rotation = rig_node.transform.rotation;
    let local_target = rig_rotation.inverse() * (target_world.coords - rig_node.transform.position);
    let hand_position = Vec3::new(0.2, 1.4, -0.2);
    let aim = (local_target - hand_position).normalize();
    let rotation =
        Quat::rotation_between(&-Vec3::z(), &aim).unwrap_or_else(Quat::identity);

    backend
        .borrow_mut()
        .set_controller_pose(1, Transform::from_position_rotation(hand_position, rotation));
}

/// Log the observable state every few frames
fn report(runtime: &Runtime, frame: u32) {
    if frame % 10 != 0 {
        return;
    }
    let scene = runtime.scene();
    let scene = scene.borrow();
    let rig = scene
        .get(runtime.camera_rig())
        .map(|node| node.transform.position);
    log::info!(
        "frame {frame}: status {:?}, rig {:?}, intersected {:?}, selected {:?}",
        runtime.locomotion_status(),
        rig,
        runtime.intersected(),
        runtime.selected(),
    );
}
