//! End-to-end tests driving a worker thread through its command channel.

use nalgebra::Point3;
use point_cloud_measure::render::settings::{Color, ViewMode};
use point_cloud_measure::worker::capture::CapturePolicy;
use point_cloud_measure::worker::command::{Command, WorkerResult};
use point_cloud_measure::worker::handle::WorkerHandle;
use point_cloud_measure::worker::WorkerConfig;
use std::io::Write;
use std::time::Duration;

/// Two points with distance 5, convenient to pick apart:
/// after loading and switching to the front view the camera sits at
/// (1.5, -5.5, 0) looking along +y, with one point projected into the left
/// and one into the right half of the viewport.
fn cloud_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
    file.write_all(b"0 0 0\n3 4 0\n").unwrap();
    file
}

fn spawn_worker() -> WorkerHandle {
    let _ = pretty_env_logger::try_init();
    WorkerHandle::spawn(WorkerConfig {
        // no heartbeat frames, the result sequence must be deterministic
        capture_policy: CapturePolicy::after_mutation_only(),
        ..WorkerConfig::default()
    })
}

fn recv(worker: &WorkerHandle) -> WorkerResult {
    worker
        .results()
        .recv_timeout(Duration::from_secs(5))
        .expect("no result within 5 seconds")
}

fn load(worker: &WorkerHandle, file: &tempfile::NamedTempFile) {
    worker.send(Command::LoadFile {
        path: file.path().to_path_buf(),
        extension: "xyz".to_string(),
    });
}

fn assert_point_eq(actual: Point3<f64>, expected: Point3<f64>) {
    assert!(
        (actual - expected).norm() < 1e-9,
        "{actual} != {expected}"
    );
}

#[test]
fn test_load_emits_status_then_frame() {
    let file = cloud_file();
    let worker = spawn_worker();
    load(&worker, &file);

    match recv(&worker) {
        WorkerResult::Status { message } => assert!(message.contains("2 points"), "{message}"),
        other => panic!("expected status, got {other:?}"),
    }
    match recv(&worker) {
        WorkerResult::Frame { png } => assert!(!png.is_empty()),
        other => panic!("expected frame, got {other:?}"),
    }

    // nothing else is pending: no heartbeat, no further commands
    std::thread::sleep(Duration::from_millis(200));
    assert!(worker.try_receive().is_none());
    worker.join();
}

#[test]
fn test_unknown_extension_reports_error_and_worker_survives() {
    let mut file = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
    file.write_all(b"solid nope").unwrap();
    let worker = spawn_worker();
    worker.send(Command::LoadFile {
        path: file.path().to_path_buf(),
        extension: "stl".to_string(),
    });

    match recv(&worker) {
        WorkerResult::Error { message } => {
            assert!(message.contains("unsupported"), "{message}")
        }
        other => panic!("expected error, got {other:?}"),
    }

    // the worker keeps running and can still load a good file
    let cloud = cloud_file();
    load(&worker, &cloud);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    worker.join();
}

#[test]
fn test_pick_without_point_set_is_ignored() {
    let worker = spawn_worker();
    worker.send(Command::PickPoint { x: 0.5, y: 0.5 });

    // the pick produces nothing; the next load result is first on the wire
    let file = cloud_file();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    worker.join();
}

#[test]
fn test_pick_measure_and_selection_overflow() {
    let file = cloud_file();
    let worker = spawn_worker();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));

    worker.send(Command::SetViewMode {
        mode: ViewMode::Arcball,
    });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));

    // first pick, left half of the viewport -> origin point
    worker.send(Command::PickPoint { x: 0.25, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    match recv(&worker) {
        WorkerResult::PointPicked {
            point,
            selection_count,
        } => {
            assert_point_eq(point, Point3::new(0.0, 0.0, 0.0));
            assert_eq!(selection_count, 1);
        }
        other => panic!("expected pick, got {other:?}"),
    }

    // second pick completes the pair and yields the measurement
    worker.send(Command::PickPoint { x: 0.75, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    match recv(&worker) {
        WorkerResult::PointPicked {
            point,
            selection_count,
        } => {
            assert_point_eq(point, Point3::new(3.0, 4.0, 0.0));
            assert_eq!(selection_count, 2);
        }
        other => panic!("expected pick, got {other:?}"),
    }
    match recv(&worker) {
        WorkerResult::Measurement {
            distance,
            point_1,
            point_2,
        } => {
            assert!((distance - 5.0).abs() < 1e-6, "distance was {distance}");
            assert_point_eq(point_1, Point3::new(0.0, 0.0, 0.0));
            assert_point_eq(point_2, Point3::new(3.0, 4.0, 0.0));
        }
        other => panic!("expected measurement, got {other:?}"),
    }

    // third pick clears the pair first, no new measurement
    worker.send(Command::PickPoint { x: 0.25, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    match recv(&worker) {
        WorkerResult::PointPicked {
            selection_count, ..
        } => assert_eq!(selection_count, 1),
        other => panic!("expected pick, got {other:?}"),
    }
    std::thread::sleep(Duration::from_millis(200));
    assert!(worker.try_receive().is_none());
    worker.join();
}

#[test]
fn test_clear_markers_resets_selection() {
    let file = cloud_file();
    let worker = spawn_worker();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    worker.send(Command::SetViewMode {
        mode: ViewMode::Arcball,
    });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));

    worker.send(Command::PickPoint { x: 0.25, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    assert!(matches!(recv(&worker), WorkerResult::PointPicked { .. }));

    worker.send(Command::ClearMarkers);
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    match recv(&worker) {
        WorkerResult::Status { message } => assert!(message.contains("cleared"), "{message}"),
        other => panic!("expected status, got {other:?}"),
    }

    // the next pick starts a fresh selection
    worker.send(Command::PickPoint { x: 0.75, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    match recv(&worker) {
        WorkerResult::PointPicked {
            selection_count, ..
        } => assert_eq!(selection_count, 1),
        other => panic!("expected pick, got {other:?}"),
    }
    worker.join();
}

#[test]
fn test_invalid_arguments_report_errors() {
    let file = cloud_file();
    let worker = spawn_worker();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));

    worker.send(Command::SetPointSize { size: -1.0 });
    assert!(matches!(recv(&worker), WorkerResult::Error { .. }));
    worker.send(Command::SetBackgroundColor {
        color: Color::rgb(1.5, 0.0, 0.0),
    });
    assert!(matches!(recv(&worker), WorkerResult::Error { .. }));
    worker.send(Command::Zoom { factor: 0.0 });
    assert!(matches!(recv(&worker), WorkerResult::Error { .. }));
    worker.send(Command::PickPoint { x: 2.0, y: 0.5 });
    assert!(matches!(recv(&worker), WorkerResult::Error { .. }));

    // scene state survived, mutators still render
    worker.send(Command::Rotate { dx: 10.0, dy: 0.0 });
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    worker.join();
}

#[test]
fn test_mutators_emit_one_frame_each() {
    let file = cloud_file();
    let worker = spawn_worker();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));

    worker.send(Command::SetBackgroundColor {
        color: Color::BLACK,
    });
    worker.send(Command::SetPointSize { size: 5.0 });
    worker.send(Command::SetPointColor { color: Color::RED });
    worker.send(Command::SetLighting {
        profile: point_cloud_measure::render::settings::LightingProfile::Night,
    });
    worker.send(Command::Zoom { factor: 2.0 });
    for _ in 0..5 {
        assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    }
    std::thread::sleep(Duration::from_millis(200));
    assert!(worker.try_receive().is_none());
    worker.join();
}

#[test]
fn test_idle_worker_stays_quiet_until_a_load() {
    // default config: the 1 s heartbeat is enabled, but with no point set
    // there is nothing to capture and nothing must arrive
    let _ = pretty_env_logger::try_init();
    let worker = WorkerHandle::spawn(WorkerConfig::default());
    assert!(worker
        .results()
        .recv_timeout(Duration::from_millis(1500))
        .is_err());
    assert!(worker.is_alive());

    let file = cloud_file();
    load(&worker, &file);
    assert!(matches!(recv(&worker), WorkerResult::Status { .. }));
    assert!(matches!(recv(&worker), WorkerResult::Frame { .. }));
    worker.join();
}

#[test]
fn test_quit_is_idempotent() {
    let worker = spawn_worker();
    worker.send(Command::Quit);
    worker.send(Command::Quit);
    worker.join();
}

#[test]
fn test_dropping_the_handle_stops_the_worker() {
    let worker = spawn_worker();
    let results = worker.results().clone();
    drop(worker);
    // the channel closes once the worker thread has terminated
    assert!(results
        .recv_timeout(Duration::from_secs(5))
        .is_err());
}
