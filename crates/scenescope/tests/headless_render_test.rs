//! Headless rendering and picking integration tests.
//!
//! These tests require a GPU adapter (real or software fallback). Without
//! one the off-screen renderer cannot be created and the tests return early
//! with a message. Adapters that cannot render the pick buffer format skip
//! the picking checks the same way.

use scenescope::*;

/// Helper: check that a pixel buffer is not uniform.
fn has_nontrivial_content(image: &RgbaImage) -> bool {
    let mut pixels = image.pixels();
    let Some(first) = pixels.next() else {
        return false;
    };
    pixels.any(|px| px != first)
}

/// All headless tests are combined into a single test function because only
/// one scenescope handle may be alive per process.
#[test]
fn headless_render_tests() {
    let mut viewer = Scenescope::init().expect("init failed");
    viewer.set_offscreen_size(800, 600);

    // Three points on the view diagonal, the middle one at the scene center
    let points = vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ];
    viewer.register_point_cloud("cloud", points, false).unwrap();
    viewer
        .get_point_cloud_mut("cloud")
        .unwrap()
        .set_point_radius(0.05);

    if let Err(e) = viewer.render_image() {
        eprintln!("Skipping headless tests: no GPU adapter available ({e})");
        return;
    }

    // --- Test 1: Clicking the center selects the middle point ---
    let selection = match viewer.pick_at(400, 300) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("Skipping headless pick tests: {e}");
            assert!(matches!(e, ScenescopeError::GpuResource(_)));
            return;
        }
    };
    let selection = selection.expect("center pixel should hit a point");
    assert_eq!(selection.structure_name, "cloud");
    assert_eq!(selection.structure_type, StructureType::PointCloud);
    assert_eq!(selection.local_index, 1);
    assert!(!selection.is_double_click);
    assert_eq!(viewer.current_selection(), Some(&selection));
    assert_eq!(viewer.offscreen_pick_buffer_size(), Some((800, 600)));

    // --- Test 2: Clicking the background clears the selection ---
    assert_eq!(viewer.pick_at(0, 0).unwrap(), None);
    assert!(viewer.current_selection().is_none());

    // --- Test 3: A query outside the viewport errors and keeps selection ---
    viewer.pick_at(400, 300).unwrap();
    assert!(viewer.pick_at(5000, 5000).is_err());
    assert!(viewer.current_selection().is_some());

    // --- Test 4: Resizing reallocates the pick buffer before readback ---
    viewer.set_offscreen_size(1600, 1200);
    let selection = viewer.pick_at(800, 600).unwrap();
    assert_eq!(viewer.offscreen_pick_buffer_size(), Some((1600, 1200)));
    assert_eq!(selection.map(|s| s.local_index), Some(1));

    // --- Test 5: Rendered image shows the scene ---
    {
        let image = viewer.render_image().unwrap().expect("render failed");
        assert_eq!(image.dimensions(), (1600, 1200));
        assert!(has_nontrivial_content(&image));
    }

    // --- Test 6: Surface mesh faces are pickable ---
    {
        viewer.remove_all_structures();
        viewer
            .register_surface_mesh(
                "quad",
                vec![
                    Vec3::new(-1.0, -1.0, 0.0),
                    Vec3::new(1.0, -1.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::new(-1.0, 1.0, 0.0),
                ],
                vec![vec![0, 1, 2, 3]],
                false,
            )
            .unwrap();
        let selection = viewer.pick_at(800, 600).unwrap().expect("face hit");
        let mesh = viewer.get_surface_mesh("quad").unwrap();
        assert_eq!(
            mesh.pick_element(selection.local_index),
            Some(MeshElement::Face(0))
        );
    }

    // --- Test 7: Empty scene renders uniform background ---
    {
        viewer.remove_all_structures();
        let image = viewer.render_image().unwrap().expect("render failed");
        assert!(!has_nontrivial_content(&image));
        assert_eq!(viewer.pick_at(800, 600).unwrap(), None);
    }

    // --- Test 8: The off-screen camera follows the scene extent ---
    {
        let far_away = vec![
            Vec3::new(49.0, 49.0, 50.0),
            Vec3::new(50.0, 50.0, 50.0),
            Vec3::new(51.0, 51.0, 50.0),
        ];
        viewer.register_point_cloud("far", far_away, false).unwrap();
        viewer.get_point_cloud_mut("far").unwrap().set_point_radius(0.05);
        let selection = viewer.pick_at(800, 600).unwrap().expect("reframed hit");
        assert_eq!(selection.structure_name, "far");
        assert_eq!(selection.local_index, 1);
        viewer.remove_all_structures();
    }

    // --- Test 9: Screenshots are written to disk ---
    {
        viewer
            .register_point_cloud("cloud", vec![Vec3::ZERO, Vec3::ONE], false)
            .unwrap();
        let path = std::env::temp_dir().join("scenescope_headless_test.png");
        viewer.screenshot_to(&path).unwrap();
        let written = image::open(&path).expect("screenshot should decode");
        assert_eq!((written.width(), written.height()), (1600, 1200));
        let _ = std::fs::remove_file(&path);
    }
}
