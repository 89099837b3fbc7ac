//! End-to-end session scenarios.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::{pairs, reopen};
use crate::config::AppConfig;
use crate::error::Error;
use crate::format::{AnnotationStore, LoadOutcome};
use crate::model::{ImagePair, OffsetVector, PixelCoord, ValidationError};
use crate::state::{
    AnnotationSession, CursorState, ImageSide, ImageStatus, Navigation, PreconditionError,
};

fn session_at(path: &Path) -> AnnotationSession {
    AnnotationSession::new(AnnotationStore::new(path), OffsetVector::default())
}

fn show_images(session: &mut AnnotationSession) {
    let loaded = ImageStatus::Loaded {
        width: 640,
        height: 480,
    };
    session.report_image(ImageSide::Rgb, loaded.clone());
    session.report_image(ImageSide::Depth, loaded);
}

fn depth_points(session: &AnnotationSession) -> Vec<PixelCoord> {
    session.points().iter().map(|p| p.depth()).collect()
}

#[test]
fn test_annotate_navigate_and_return() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);

    session.on_load_dataset(pairs(3)).unwrap();
    show_images(&mut session);
    assert_eq!(session.offset(), OffsetVector::new(36, -8).unwrap());

    session.on_rgb_tap(100, 100).unwrap();
    let second = session.on_rgb_tap(150, 120).unwrap();
    assert_eq!(second.ordinal(), 2);
    assert_eq!(
        depth_points(&session),
        vec![PixelCoord::new(136, 92), PixelCoord::new(186, 112)]
    );

    assert_eq!(
        session.on_next().unwrap(),
        Navigation::Moved { from: 0, to: 1 }
    );
    assert!(session.points().is_empty());

    let store = reopen(&path);
    let record = store.get(&pairs(3)[0].identity()).unwrap();
    assert_eq!(record.rgb_points, vec![[100, 100], [150, 120]]);
    assert_eq!(record.depth_points, vec![[136, 92], [186, 112]]);

    session.on_previous().unwrap();
    assert_eq!(
        depth_points(&session),
        vec![PixelCoord::new(136, 92), PixelCoord::new(186, 112)]
    );
}

#[test]
fn test_taps_need_loaded_images() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    session.on_load_dataset(pairs(2)).unwrap();

    let err = session.on_rgb_tap(1, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::ImageNotLoaded {
            side: ImageSide::Rgb
        })
    ));

    session.report_image(
        ImageSide::Rgb,
        ImageStatus::Loaded {
            width: 10,
            height: 10,
        },
    );
    let err = session.on_rgb_tap(1, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::ImageNotLoaded {
            side: ImageSide::Depth
        })
    ));
    assert!(session.points().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_navigation_resets_image_status() {
    let dir = TempDir::new().unwrap();
    let mut session = session_at(&dir.path().join("annotations.json"));
    session.on_load_dataset(pairs(2)).unwrap();
    show_images(&mut session);

    session.on_next().unwrap();
    assert_eq!(session.image_status(ImageSide::Rgb), &ImageStatus::Pending);
    assert!(session.on_rgb_tap(5, 5).is_err());

    show_images(&mut session);
    assert!(session.on_rgb_tap(5, 5).is_ok());

    // Staying at the boundary keeps the images.
    assert_eq!(session.on_next().unwrap(), Navigation::Stayed);
    assert!(session.image_status(ImageSide::Depth).is_loaded());
}

#[test]
fn test_tap_outside_image() {
    let dir = TempDir::new().unwrap();
    let mut session = session_at(&dir.path().join("annotations.json"));
    session.on_load_dataset(pairs(1)).unwrap();
    show_images(&mut session);

    for (x, y) in [(-1, 0), (0, -1), (640, 0), (0, 480)] {
        let err = session.on_rgb_tap(x, y).unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition(PreconditionError::OutOfBounds { .. })
        ));
    }
    assert!(session.on_rgb_tap(639, 479).is_ok());
    assert_eq!(session.points().len(), 1);
}

#[test]
fn test_failed_image_does_not_block_navigation() {
    let dir = TempDir::new().unwrap();
    let mut session = session_at(&dir.path().join("annotations.json"));
    session.on_load_dataset(pairs(2)).unwrap();

    session.report_image(
        ImageSide::Depth,
        ImageStatus::Failed {
            reason: "truncated file".to_string(),
        },
    );
    assert!(session.on_rgb_tap(1, 1).is_err());
    assert!(session.on_next().unwrap().moved());
    assert_eq!(session.state(), CursorState::Positioned(1));
}

#[test]
fn test_invalid_offset_leaves_state_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    session.on_load_dataset(pairs(1)).unwrap();
    show_images(&mut session);
    session.on_rgb_tap(10, 10).unwrap();
    let before = session.points().clone();

    let err = session.on_offset_input(101, 0).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::OutOfRange { value: 101, .. })
    ));
    let err = session.on_offset_text("12", "abc").unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NotAnInteger { .. })
    ));

    assert_eq!(session.offset(), OffsetVector::new(36, -8).unwrap());
    assert_eq!(session.points(), &before);
}

#[test]
fn test_offset_change_rederives_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    session.on_load_dataset(pairs(1)).unwrap();
    show_images(&mut session);
    session.on_rgb_tap(100, 100).unwrap();
    session.on_rgb_tap(150, 120).unwrap();

    session.on_offset_text(" 0 ", "10").unwrap();
    assert_eq!(
        depth_points(&session),
        vec![PixelCoord::new(100, 110), PixelCoord::new(150, 130)]
    );

    let store = reopen(&path);
    let record = store.get(&pairs(1)[0].identity()).unwrap();
    assert_eq!(record.depth_points, vec![[100, 110], [150, 130]]);

    let applied = session.on_offset_slider(250.7, -3.9).unwrap();
    assert_eq!(applied, OffsetVector::new(100, -3).unwrap());
}

#[test]
fn test_clear_differs_from_never_annotated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    session.on_load_dataset(pairs(2)).unwrap();
    show_images(&mut session);
    session.on_rgb_tap(3, 3).unwrap();
    session.on_next().unwrap();
    show_images(&mut session);
    session.on_rgb_tap(4, 4).unwrap();

    session.on_previous().unwrap();
    session.on_clear().unwrap();

    let store = reopen(&path);
    assert!(!store.contains(&pairs(2)[0].identity()));
    assert!(store.contains(&pairs(2)[1].identity()));

    session.on_next().unwrap();
    assert_eq!(session.points().len(), 1);
    session.on_previous().unwrap();
    assert!(session.points().is_empty());
}

#[test]
fn test_standalone_session_does_not_persist() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    show_images(&mut session);

    session.on_rgb_tap(10, 10).unwrap();
    session.on_offset_input(0, 0).unwrap();
    assert_eq!(depth_points(&session), vec![PixelCoord::new(10, 10)]);
    assert!(matches!(session.on_next(), Err(Error::NoDataset)));
    assert!(!path.exists());

    session.on_load_dataset(pairs(1)).unwrap();
    assert!(session.points().is_empty());
}

#[test]
fn test_failed_save_rolls_back_tap() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let mut session = session_at(&blocker.join("annotations.json"));
    session.on_load_dataset(pairs(1)).unwrap();
    show_images(&mut session);

    let err = session.on_rgb_tap(10, 10).unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(session.points().is_empty());
}

#[test]
fn test_corrupt_store_recovered_via_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    fs::write(&path, b"{ this is not json").unwrap();

    let mut config = AppConfig::new();
    config.preferences.store_path = path.clone();
    config.preferences.overlay_alpha = 0.25;

    let (mut session, outcome) = AnnotationSession::from_config(&config).unwrap();
    assert!(matches!(outcome, LoadOutcome::Recovered(_)));
    assert!((session.overlay_alpha() - 0.25).abs() < f32::EPSILON);

    session.on_load_dataset(pairs(1)).unwrap();
    show_images(&mut session);
    session.on_rgb_tap(1, 2).unwrap();

    let store = reopen(&path);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_overlay_request_tracks_offset() {
    let dir = TempDir::new().unwrap();
    let mut session = session_at(&dir.path().join("annotations.json"));
    session.set_overlay_alpha(2.0);
    session.on_offset_input(-5, 7).unwrap();

    let base = 1u8;
    let depth = 2u8;
    match session.overlay_request(&base, Some(&depth)).resolve() {
        crate::overlay::OverlayPlan::Blend { shift, alpha, .. } => {
            assert_eq!(shift, OffsetVector::new(-5, 7).unwrap());
            assert_eq!(alpha, 1.0);
        }
        other => panic!("Expected a blend plan, got {:?}", other),
    }
}

#[test]
fn test_pairs_with_same_file_names_stay_separate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotations.json");
    let mut session = session_at(&path);
    let scenes = vec![
        ImagePair::new("scene_a/rgb/0001.png", "scene_a/depth/0001.png"),
        ImagePair::new("scene_b/rgb/0001.png", "scene_b/depth/0001.png"),
    ];

    session.on_load_dataset(scenes.clone()).unwrap();
    show_images(&mut session);
    session.on_rgb_tap(100, 100).unwrap();

    session.on_next().unwrap();
    assert!(session.points().is_empty());
    show_images(&mut session);
    session.on_rgb_tap(5, 6).unwrap();

    session.on_previous().unwrap();
    let rgb: Vec<_> = session.points().iter().map(|p| p.rgb()).collect();
    assert_eq!(rgb, vec![PixelCoord::new(100, 100)]);

    let store = reopen(&path);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&scenes[1].identity()).unwrap().rgb_points, vec![[5, 6]]);
}

#[test]
fn test_reloading_dataset_in_new_session_restores_points() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::new();
    config.preferences.store_path = dir.path().join("annotations.json");

    {
        let (mut first, outcome) = AnnotationSession::from_config(&config).unwrap();
        assert_eq!(outcome, LoadOutcome::Missing);
        first.on_load_dataset(pairs(2)).unwrap();
        show_images(&mut first);
        first.on_rgb_tap(100, 100).unwrap();
        first.on_rgb_tap(150, 120).unwrap();
        first.on_next().unwrap();
        show_images(&mut first);
        first.on_rgb_tap(7, 9).unwrap();
    }

    let (mut second, outcome) = AnnotationSession::from_config(&config).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { records: 2 });
    second.on_load_dataset(pairs(2)).unwrap();

    let restored: Vec<_> = second
        .points()
        .iter()
        .map(|p| (p.ordinal(), p.rgb(), p.depth()))
        .collect();
    assert_eq!(
        restored,
        vec![
            (1, PixelCoord::new(100, 100), PixelCoord::new(136, 92)),
            (2, PixelCoord::new(150, 120), PixelCoord::new(186, 112)),
        ]
    );

    second.on_next().unwrap();
    let restored: Vec<_> = second
        .points()
        .iter()
        .map(|p| (p.ordinal(), p.rgb(), p.depth()))
        .collect();
    assert_eq!(
        restored,
        vec![(1, PixelCoord::new(7, 9), PixelCoord::new(43, 1))]
    );
}
