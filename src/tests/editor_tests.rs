//! Key and pointer flows through the editor.

use pollster::block_on;
use rmat_view::{View, ViewGroup, ViewKind};

use super::{MemoryBackend, server_error};
use crate::config::ProjectConfig;
use crate::editor::{BUTTON_LEFT, Editor, NOT_ENOUGH_PIXELS, Navigation, Notice, PointerEvent};
use crate::keybindings::{Command, KeyCode};
use crate::mask::MaskViewMode;
use crate::model::ToolKind;

/// 20x20 image in one 100 px port, mask loaded from `backend`.
fn editor(backend: &MemoryBackend) -> Editor {
    let mut editor = Editor::new(ProjectConfig::new(20, 20), "tile");
    editor.resize(100, 300);
    assert!(block_on(editor.load(backend)).is_none());
    editor
}

fn click(editor: &mut Editor, position: (f64, f64)) {
    editor.handle_pointer(PointerEvent::Down {
        port: 0,
        position,
        buttons: BUTTON_LEFT,
    });
}

#[test]
fn test_save_key_stores_mask() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    click(&mut e, (52.0, 52.0));

    let response = block_on(e.handle_key(KeyCode::S, &backend));
    assert_eq!(response.command, Some(Command::Save));
    assert_eq!(response.notice, Some(Notice::Info("Mask saved".to_string())));
    assert_eq!(backend.stored("tile").map(|p| p.len()), Some(802));
}

#[test]
fn test_save_and_next_navigates_only_on_success() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);

    let response = block_on(e.handle_key(KeyCode::Enter, &backend));
    assert_eq!(response.navigate, Some(Navigation::Next));
    assert!(response.notice.is_none());

    *backend.save_error.borrow_mut() = Some(server_error());
    let response = block_on(e.handle_key(KeyCode::Backspace, &backend));
    assert!(response.navigate.is_none());
    assert!(matches!(response.notice, Some(Notice::Error(_))));
}

#[test]
fn test_navigation_before_load_skips_save() {
    let backend = MemoryBackend::new();
    let mut e = Editor::new(ProjectConfig::new(20, 20), "tile");
    e.resize(100, 300);

    let response = block_on(e.handle_key(KeyCode::Backspace, &backend));
    assert_eq!(response.navigate, Some(Navigation::Previous));
    assert!(response.notice.is_none());
    assert!(backend.stored("tile").is_none());
}

#[test]
fn test_predict_without_pixels_warns() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    let response = block_on(e.handle_key(KeyCode::A, &backend));
    assert_eq!(
        response.notice,
        Some(Notice::Warning(NOT_ENOUGH_PIXELS.to_string()))
    );
    assert!(backend.requests.borrow().is_empty());
}

#[test]
fn test_undo_redo_keys() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    click(&mut e, (52.0, 52.0));
    assert_eq!(e.session().drawn_pixels().total, 9);

    block_on(e.handle_key(KeyCode::U, &backend));
    assert_eq!(e.session().drawn_pixels().total, 0);
    block_on(e.handle_key(KeyCode::R, &backend));
    assert_eq!(e.session().drawn_pixels().total, 9);
}

#[test]
fn test_eraser_and_reset_keys() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    block_on(e.handle_key(KeyCode::Key2, &backend));
    click(&mut e, (52.0, 52.0));

    block_on(e.handle_key(KeyCode::E, &backend));
    assert_eq!(e.session().tool().kind, ToolKind::Eraser);
    click(&mut e, (52.0, 52.0));
    assert_eq!(e.session().drawn_pixels().total, 0);
    // Erasing keeps the label
    assert_eq!(e.session().model().mask[10 * 20 + 10], 1);

    let response = block_on(e.handle_key(KeyCode::N, &backend));
    assert_eq!(response.notice, Some(Notice::Info("Mask reset".to_string())));
    assert!(e.session().model().mask.iter().all(|&v| v == 0));
    assert!(!e.session().history().can_undo());
}

#[test]
fn test_mask_view_keys() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    block_on(e.handle_key(KeyCode::H, &backend));
    assert_eq!(e.session().mode(), MaskViewMode::Errors);
    block_on(e.handle_key(KeyCode::G, &backend));
    assert_eq!(e.session().mode(), MaskViewMode::User);

    block_on(e.handle_key(KeyCode::Space, &backend));
    assert!(!e.session().mask_visible());
    block_on(e.handle_key(KeyCode::F, &backend));
    assert_eq!(e.session().mode(), MaskViewMode::Final);
    assert!(e.session().mask_visible());
}

#[test]
fn test_drawn_pixels_reach_mask_layer() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    block_on(e.handle_key(KeyCode::Key2, &backend));
    click(&mut e, (52.0, 52.0));

    let port = e.views().port(0).expect("one port");
    let canvas = port
        .layers()
        .iter()
        .find_map(|l| match l.kind() {
            rmat_view::LayerKind::Mask => l.canvas(),
            _ => None,
        })
        .expect("mask canvas");
    let cloud = e.session().classes()[1].colour;
    assert_eq!(canvas.get_pixel(52, 52).0, cloud);
    assert_eq!(canvas.get_pixel(5, 5).0[3], 0);
}

#[test]
fn test_open_image_loads_its_mask() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    click(&mut e, (52.0, 52.0));
    block_on(e.handle_key(KeyCode::S, &backend));

    assert!(block_on(e.open_image("other", &backend)).is_none());
    assert_eq!(e.session().image_id(), "other");
    assert_eq!(e.session().drawn_pixels().total, 0);

    assert!(block_on(e.open_image("tile", &backend)).is_none());
    assert_eq!(e.session().drawn_pixels().total, 9);
}

#[test]
fn test_unbound_key_does_nothing() {
    let backend = MemoryBackend::new();
    let mut e = editor(&backend);
    let response = block_on(e.handle_key(KeyCode::Escape, &backend));
    assert_eq!(response, Default::default());
}

#[test]
fn test_view_group_edits_are_saved() {
    let path = std::env::temp_dir()
        .join(format!("rmat-editor-groups-{}", std::process::id()))
        .join(ProjectConfig::default_filename());

    let mut config = ProjectConfig::new(20, 20);
    config.views.push(View::new("NIR", ViewKind::Image));
    let mut e = Editor::new(config, "tile");
    e.set_config_path(path.clone());
    e.resize(200, 300);

    assert!(e.add_view("NIR", None).is_none());
    assert_eq!(e.views().ports().len(), 2);
    let saved = ProjectConfig::load_from(&path).expect("saved config");
    assert_eq!(saved.view_groups[0].views, ["RGB", "NIR"]);
    assert_eq!(saved.view_groups, e.config().view_groups);

    assert!(e.remove_view(0).is_none());
    let saved = ProjectConfig::load_from(&path).expect("saved config");
    assert_eq!(saved.view_groups[0].views, ["NIR"]);

    assert!(matches!(e.add_view("SWIR", None), Some(Notice::Error(_))));
    let saved = ProjectConfig::load_from(&path).expect("saved config");
    assert_eq!(saved.view_groups[0].views, ["NIR"]);

    if let Some(parent) = path.parent() {
        let _ = std::fs::remove_dir_all(parent);
    }
}

#[test]
fn test_next_group_key_syncs_config() {
    let backend = MemoryBackend::new();
    let mut config = ProjectConfig::new(20, 20);
    config.views.push(View::new("NIR", ViewKind::Image));
    config
        .view_groups
        .push(ViewGroup::new("infrared", vec!["NIR".into()]));
    let mut e = Editor::new(config, "tile");
    e.resize(100, 300);

    let response = block_on(e.handle_key(KeyCode::Tab, &backend));
    assert!(response.notice.is_none());
    assert_eq!(e.views().current_group(), "infrared");
    assert_eq!(e.views().port(0).map(|p| p.view.name.as_str()), Some("NIR"));
    assert_eq!(e.config().view_groups, e.views().groups());
}
