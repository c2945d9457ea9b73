//! Two fixed cameras track a robot across a synthetic field.
//!
//! The cameras localize themselves against a corner-marker board, then fuse
//! their views of the robot's top marker every tick. Run with
//! `RUST_LOG=debug` for solver chatter.

use std::sync::Arc;

use anyhow::Result;
use tagtrack::{ObjectTracker, StaticBoard, TopTracker, TrackedCamera, TrackedObject};
use tagtrack_core::synthetic::{default_camera, looking_at, project_detection};
use tagtrack_core::{CameraObservations, Iso3, Pt3, Real, Tick, Vec3, TICKS_PER_SECOND};

const BOARD_IDS: [u32; 4] = [20, 21, 22, 23];
const ROBOT_ID: u32 = 5;
const ROBOT_HEIGHT: Real = 0.43;

/// Exact detections of the board and the robot as seen from one mast.
fn observe(name: &str, eye: Pt3, world_from_robot: &Iso3) -> CameraObservations {
    let cam = default_camera();
    let world_from_cam = looking_at(&eye, &Pt3::origin());
    let lens_from_world = world_from_cam.inverse();

    let mut markers = vec![
        (BOARD_IDS[0], 0.1, Iso3::translation(1.0, 0.7, 0.0)),
        (BOARD_IDS[1], 0.1, Iso3::translation(-1.0, 0.7, 0.0)),
        (BOARD_IDS[2], 0.1, Iso3::translation(-1.0, -0.7, 0.0)),
        (BOARD_IDS[3], 0.1, Iso3::translation(1.0, -0.7, 0.0)),
    ];
    markers.push((ROBOT_ID, 0.07, world_from_robot * Iso3::translation(0.0, 0.0, ROBOT_HEIGHT)));

    let detections = markers
        .into_iter()
        .filter_map(|(id, side, world_from_marker)| {
            project_detection(&cam, &lens_from_world, &world_from_marker, id, side)
        })
        .collect();
    CameraObservations::mono(name, cam, detections)
}

fn main() -> Result<()> {
    env_logger::init();

    let board: Arc<dyn TrackedObject> =
        Arc::new(StaticBoard::corner_layout("field", Iso3::identity(), 1.0, 0.7, 0.1, BOARD_IDS));
    let robot = Arc::new(TopTracker::robot("robot_blue", ROBOT_ID, 0.07, ROBOT_HEIGHT));
    let robot_dyn: Arc<dyn TrackedObject> = robot.clone();
    let mirrors = [
        Arc::new(TrackedCamera::new("cam_left")),
        Arc::new(TrackedCamera::new("cam_right")),
    ];

    let mut tracker = ObjectTracker::default();
    tracker.register_object(&board)?;
    tracker.register_object(&robot_dyn)?;
    for mirror in &mirrors {
        let m: Arc<dyn TrackedObject> = mirror.clone();
        tracker.register_object(&m)?;
    }

    let eyes = [Pt3::new(-1.5, -1.2, 2.0), Pt3::new(1.5, -1.2, 2.0)];

    println!("tick    truth (x, y, yaw)          estimate (x, y, yaw)");
    let mut last_tick: Tick = 0;
    for step in 0..8u64 {
        last_tick = (step + 1) * TICKS_PER_SECOND / 10;
        // The robot drives a gentle arc.
        let s = step as Real;
        let truth = Iso3::new(
            Vec3::new(-0.6 + 0.15 * s, -0.1 + 0.04 * s, 0.0),
            Vec3::new(0.0, 0.0, 0.3 + 0.08 * s),
        );

        let mut views = [
            observe("cam_left", eyes[0], &truth),
            observe("cam_right", eyes[1], &truth),
        ];
        for view in views.iter_mut() {
            tracker.solve_camera_pose(view);
        }
        for (mirror, view) in mirrors.iter().zip(views.iter()) {
            mirror.set_pose(&view.world_from_camera, last_tick);
        }
        tracker.solve_object_poses(&mut views, last_tick);

        let est = robot.pose();
        println!(
            "{:>4} ms  ({:+.3}, {:+.3}, {:+.3})   ({:+.3}, {:+.3}, {:+.3})",
            last_tick / (TICKS_PER_SECOND / 1000),
            truth.translation.vector.x,
            truth.translation.vector.y,
            truth.rotation.scaled_axis().z,
            est.translation.vector.x,
            est.translation.vector.y,
            est.rotation.scaled_axis().z,
        );
    }

    let snapshot = tracker.snapshot(last_tick);
    println!("\nScene snapshot:\n{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
