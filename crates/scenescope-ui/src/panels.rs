//! UI panel builders.

use std::any::Any;

use egui::{CollapsingHeader, Context, SidePanel, Ui, Window};
use scenescope_core::{Context as SceneContext, StructureType};

/// Structures per category up to which their panels start expanded.
const OPEN_BY_DEFAULT_LIMIT: usize = 2;

/// Actions requested from the main panel this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainPanelActions {
    /// "Reset view" was clicked.
    pub reset_view: bool,
    /// "Screenshot" was clicked.
    pub screenshot: bool,
}

/// Returns the structures panel header for a category.
pub fn category_header(ty: StructureType, count: usize) -> String {
    format!("Category: {ty} ({count})")
}

/// Returns the selection panel heading for a picked structure.
pub fn selection_header(ty: StructureType, name: &str) -> String {
    format!("{ty}: {name}")
}

/// Builds the left panel: main controls followed by the structures panel.
pub fn build_left_panel(
    ctx: &Context,
    scene: &mut SceneContext,
    frame_time_ms: f32,
) -> MainPanelActions {
    let mut actions = MainPanelActions::default();
    SidePanel::left("scenescope_main_panel")
        .default_width(305.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading(scene.options.program_name.clone());
            ui.separator();
            actions = build_main_section(ui, scene, frame_time_ms);
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                build_structures_section(ui, scene);
            });
        });
    actions
}

/// Builds the main controls: background color, view reset, screenshot,
/// frame timing and debug options.
pub fn build_main_section(
    ui: &mut Ui,
    scene: &mut SceneContext,
    frame_time_ms: f32,
) -> MainPanelActions {
    let mut actions = MainPanelActions::default();

    let mut bg = scene.options.background_color.to_array();
    ui.horizontal(|ui| {
        ui.label("Background:");
        if ui.color_edit_button_rgb(&mut bg).changed() {
            scene.options.background_color = glam::Vec3::from_array(bg);
        }
    });

    ui.horizontal(|ui| {
        actions.reset_view = ui.button("Reset view").clicked();
        actions.screenshot = ui.button("Screenshot").clicked();
    });

    let fps = if frame_time_ms > 0.0 {
        1000.0 / frame_time_ms
    } else {
        0.0
    };
    ui.label(format!("{frame_time_ms:.1} ms/frame ({fps:.1} fps)"));

    CollapsingHeader::new("Debug")
        .default_open(false)
        .show(ui, |ui| {
            ui.checkbox(&mut scene.options.debug_draw_pick_buffer, "Show pick buffer");
        });

    actions
}

/// Builds one collapsing header per non-empty category.
///
/// The first structure of a category contributes the category's shared UI;
/// each structure then gets its own header with an enable toggle and its UI.
pub fn build_structures_section(ui: &mut Ui, scene: &mut SceneContext) {
    let counts: Vec<(StructureType, usize)> = scene.category_counts().collect();
    if counts.is_empty() {
        ui.label("No structures registered");
        return;
    }

    for (ty, count) in counts {
        CollapsingHeader::new(category_header(ty, count))
            .id_salt(ty)
            .default_open(true)
            .show(ui, |ui| {
                let structures = scene.category_mut(ty);
                if let Some(first) = structures.first_mut() {
                    first.build_shared_ui(ui as &mut dyn Any);
                }
                for structure in structures.iter_mut() {
                    let name = structure.name().to_string();
                    CollapsingHeader::new(&name)
                        .id_salt(("structure", &name))
                        .default_open(count <= OPEN_BY_DEFAULT_LIMIT)
                        .show(ui, |ui| {
                            let mut enabled = structure.is_enabled();
                            if ui.checkbox(&mut enabled, "Enabled").changed() {
                                structure.set_enabled(enabled);
                            }
                            ui.separator();
                            structure.build_ui(ui as &mut dyn Any);
                        });
                }
            });
    }
}

/// Builds the selection panel on the right side.
/// Only shows if there is an active selection.
pub fn build_selection_panel(ctx: &Context, scene: &SceneContext) {
    let Some(selection) = scene.selection() else {
        return;
    };
    let Ok(structure) = scene.structure(&selection.structure_name) else {
        return;
    };

    SidePanel::right("selection_panel")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("Selection");
            ui.label(selection_header(
                selection.structure_type,
                &selection.structure_name,
            ));
            ui.separator();
            structure.build_pick_ui(ui as &mut dyn Any, selection.local_index);
        });
}

/// Shows the user callback in its own window.
pub fn build_user_window(ctx: &Context, title: &str, callback: impl FnOnce(&mut Ui)) {
    Window::new(title)
        .default_pos([320.0, 10.0])
        .resizable(true)
        .show(ctx, callback);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        assert_eq!(
            category_header(StructureType::PointCloud, 2),
            "Category: Point Cloud (2)"
        );
        assert_eq!(
            selection_header(StructureType::SurfaceMesh, "bunny"),
            "Surface Mesh: bunny"
        );
    }
}
