//! Loading, saving and history through the editing session.

use pollster::block_on;

use super::MemoryBackend;
use crate::backend::BackendError;
use crate::config::ProjectConfig;
use crate::format::encode_payload;
use crate::mask::MaskViewMode;
use crate::session::{EditingSession, LoadOutcome, SessionError};

const WHOLE: (f64, f64, f64, f64) = (0.0, 0.0, 100.0, 100.0);

fn session(width: u32, height: u32) -> EditingSession {
    EditingSession::new(&ProjectConfig::new(width, height), "tile")
}

#[test]
fn test_missing_mask_starts_empty() {
    let backend = MemoryBackend::new();
    let mut s = session(4, 4);
    assert_eq!(block_on(s.load_mask(&backend)), LoadOutcome::Fresh);

    assert!(s.is_loaded());
    assert!(s.model().mask.iter().all(|&v| v == 0));
    assert!(s.model().user_mask.iter().all(|&v| v == 0));
    assert_eq!(s.history().len(), 1);
    assert!(!s.history().can_undo());
    assert!(!s.history().can_redo());
}

#[test]
fn test_load_restores_stored_mask() {
    let payload = encode_payload(&[0, 1, 2, 1], &[1, 0, 0, 1]).expect("same length");
    let backend = MemoryBackend::with_mask("tile", payload);
    let mut s = session(2, 2);
    assert_eq!(block_on(s.load_mask(&backend)), LoadOutcome::Loaded);
    assert_eq!(s.model().mask, [0, 1, 2, 1]);
    assert_eq!(s.model().user_mask, [1, 0, 0, 1]);
    assert_eq!(s.drawn_pixels().per_class, [1, 1, 0]);
}

#[test]
fn test_corrupt_payload_recovers_empty() {
    // Payload of a 3x3 mask for a 2x2 image
    let payload = encode_payload(&[1; 9], &[1; 9]).expect("same length");
    let backend = MemoryBackend::with_mask("tile", payload);
    let mut s = session(2, 2);
    let outcome = block_on(s.load_mask(&backend));
    assert!(matches!(outcome, LoadOutcome::Recovered(_)));
    assert_eq!(s.model().mask, [0, 0, 0, 0]);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn test_transport_error_recovers_empty() {
    let backend = MemoryBackend::new();
    *backend.load_error.borrow_mut() = Some(BackendError::Transport("offline".to_string()));
    let mut s = session(2, 2);
    let outcome = block_on(s.load_mask(&backend));
    assert_eq!(
        outcome,
        LoadOutcome::Recovered("Transport error: offline".to_string())
    );
    assert!(s.is_loaded());
}

#[test]
fn test_save_payload_layout() {
    let backend = MemoryBackend::new();
    let mut s = session(2, 2);
    block_on(s.load_mask(&backend));
    s.set_class(1).expect("class 1");
    s.draw((0.4, 0.4), WHOLE).expect("brush covers the mask");

    block_on(s.save_mask(&backend)).expect("save succeeds");
    let stored = backend.stored("tile").expect("payload stored");
    assert_eq!(stored.len(), 10);
    assert_eq!(stored, [254, 1, 1, 1, 1, 1, 1, 1, 1, 254]);
}

#[test]
fn test_save_sends_snapshot() {
    let backend = MemoryBackend::new();
    let mut s = session(4, 4);
    block_on(s.load_mask(&backend));
    s.set_class(1).expect("class 1");
    s.draw((1.0, 1.0), WHOLE);
    block_on(s.save_mask(&backend)).expect("save succeeds");
    let saved = backend.stored("tile").expect("payload stored");

    s.set_class(2).expect("class 2");
    s.draw((3.0, 3.0), WHOLE);
    assert_eq!(backend.stored("tile"), Some(saved.clone()));
    assert_eq!(saved.iter().filter(|&&b| b == 2).count(), 0);
}

#[test]
fn test_save_before_load_is_rejected() {
    let backend = MemoryBackend::new();
    let s = session(2, 2);
    assert!(matches!(
        block_on(s.save_mask(&backend)),
        Err(SessionError::NotLoaded)
    ));
    assert!(backend.stored("tile").is_none());
}

#[test]
fn test_save_error_is_reported() {
    let backend = MemoryBackend::new();
    *backend.save_error.borrow_mut() = Some(super::server_error());
    let mut s = session(2, 2);
    block_on(s.load_mask(&backend));
    let result = block_on(s.save_mask(&backend));
    assert!(matches!(result, Err(SessionError::Backend(e)) if e.is_server_error()));
}

#[test]
fn test_history_is_bounded() {
    let backend = MemoryBackend::new();
    let mut config = ProjectConfig::new(16, 16);
    config.history.max_epochs = 3;
    let mut s = EditingSession::new(&config, "tile");
    block_on(s.load_mask(&backend));
    s.set_class(1).expect("class 1");
    for i in 0..5 {
        s.draw((f64::from(i) * 3.0 + 1.0, 1.0), WHOLE);
    }
    assert_eq!(s.history().len(), 3);
    assert!(s.undo());
    assert!(s.undo());
    assert!(!s.undo());
    // The two oldest strokes were evicted with their snapshots
    assert_eq!(s.drawn_pixels().total, 27);
}

#[test]
fn test_new_stroke_drops_redo() {
    let backend = MemoryBackend::new();
    let mut s = session(8, 8);
    block_on(s.load_mask(&backend));
    s.set_class(1).expect("class 1");
    s.draw((1.0, 1.0), WHOLE);
    s.draw((5.0, 5.0), WHOLE);
    assert!(s.undo());
    assert!(s.history().can_redo());

    s.draw((1.0, 5.0), WHOLE);
    assert!(!s.history().can_redo());
    assert!(!s.redo());
    assert_eq!(s.history().len(), 3);
}

#[test]
fn test_mode_switch_repaints_raster() {
    let backend = MemoryBackend::new();
    let mut s = session(4, 4);
    block_on(s.load_mask(&backend));
    s.set_class(1).expect("class 1");
    s.draw((1.0, 1.0), WHOLE);
    let cloud = s.classes()[1].clone();

    s.set_mask_mode(MaskViewMode::User);
    assert_eq!(s.raster().image().get_pixel(1, 1).0, cloud.user_display_colour());
    assert_eq!(s.raster().image().get_pixel(3, 3).0[3], 0);

    s.set_mask_mode(MaskViewMode::Final);
    assert_eq!(s.raster().image().get_pixel(1, 1).0, cloud.colour);
}
