//! Structure-specific UI builders.
//!
//! Builders take plain values so structures can call them without the UI
//! crate knowing structure types. Each returns true if anything changed.

use egui::Ui;

/// Downcasts the UI handle structures receive as `&mut dyn Any`.
pub fn as_egui(ui: &mut dyn std::any::Any) -> Option<&mut Ui> {
    ui.downcast_mut::<Ui>()
}

fn color_row(ui: &mut Ui, label: &str, color: &mut [f32; 3]) -> bool {
    ui.label(label);
    let changed = ui.color_edit_button_rgb(color).changed();
    ui.end_row();
    changed
}

/// Builds UI for a point cloud.
pub fn build_point_cloud_ui(
    ui: &mut Ui,
    num_points: usize,
    point_radius: &mut f32,
    base_color: &mut [f32; 3],
) -> bool {
    let mut changed = false;

    ui.label(format!("{num_points} points"));

    egui::Grid::new("point_cloud_props")
        .num_columns(2)
        .show(ui, |ui| {
            changed |= color_row(ui, "Color:", base_color);

            ui.label("Radius:");
            if ui
                .add(
                    egui::DragValue::new(point_radius)
                        .speed(0.001)
                        .range(0.0005..=0.5),
                )
                .changed()
            {
                changed = true;
            }
            ui.end_row();
        });

    changed
}

/// Builds UI for a surface mesh.
pub fn build_surface_mesh_ui(
    ui: &mut Ui,
    num_vertices: usize,
    num_faces: usize,
    surface_color: &mut [f32; 3],
    show_edges: &mut bool,
    edge_color: &mut [f32; 3],
) -> bool {
    let mut changed = false;

    ui.label(format!("{num_vertices} verts, {num_faces} faces"));

    egui::Grid::new("surface_mesh_props")
        .num_columns(2)
        .show(ui, |ui| {
            changed |= color_row(ui, "Color:", surface_color);

            ui.label("Edges:");
            changed |= ui.checkbox(show_edges, "").changed();
            ui.end_row();

            if *show_edges {
                changed |= color_row(ui, "Edge color:", edge_color);
            }
        });

    changed
}

/// Builds UI for a camera view.
pub fn build_camera_view_ui(
    ui: &mut Ui,
    widget_color: &mut [f32; 3],
    widget_focal_length: &mut f32,
) -> bool {
    let mut changed = false;

    egui::Grid::new("camera_view_props")
        .num_columns(2)
        .show(ui, |ui| {
            changed |= color_row(ui, "Color:", widget_color);

            ui.label("Frustum length:");
            if ui
                .add(
                    egui::DragValue::new(widget_focal_length)
                        .speed(0.001)
                        .range(0.001..=1.0),
                )
                .changed()
            {
                changed = true;
            }
            ui.end_row();
        });

    changed
}

/// Builds UI for a ray set.
pub fn build_ray_set_ui(ui: &mut Ui, num_rays: usize, color: &mut [f32; 3]) -> bool {
    let mut changed = false;

    ui.label(format!("{num_rays} rays"));

    egui::Grid::new("ray_set_props")
        .num_columns(2)
        .show(ui, |ui| {
            changed |= color_row(ui, "Color:", color);
        });

    changed
}

/// Builds a two-column table describing one picked element.
pub fn build_element_info(ui: &mut Ui, title: &str, rows: &[(&str, String)]) {
    ui.label(title);
    egui::Grid::new("pick_element_info")
        .num_columns(2)
        .show(ui, |ui| {
            for (key, value) in rows {
                ui.label(*key);
                ui.label(value);
                ui.end_row();
            }
        });
}

/// Formats a vector for display.
pub fn format_vec3(v: glam::Vec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}
