//! Basic integration tests for scenescope.
//!
//! Note: only one scenescope handle may be alive per process, so all tests
//! that hold one are combined into a single test function.
//!
//! Tests that require a window (show()) are marked #[ignore]
//! and should be run manually with: cargo test -- --ignored

use scenescope::*;

fn triangle() -> (Vec<Vec3>, Vec<Vec<u32>>) {
    (
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2]],
    )
}

/// Main integration test that runs all basic tests in sequence.
#[test]
fn test_basics() {
    let mut viewer = Scenescope::init().expect("init failed");
    assert!(is_initialized());

    // Test 1: A second handle is refused while the first lives
    {
        assert!(matches!(
            Scenescope::init(),
            Err(ScenescopeError::DoubleInitialization)
        ));
    }

    // Test 2: Registering a point cloud grows the extent
    {
        let points = vec![
            Vec3::new(-1.5, 0.0, 2.0),
            Vec3::new(3.0, 4.0, -2.0),
            Vec3::new(0.5, -0.25, 0.0),
        ];
        viewer
            .register_point_cloud("cloud1", points.clone(), false)
            .unwrap();

        let extent = *viewer.current_extent();
        assert!(extent.length_scale > 0.0);
        let (min, max) = extent.bounding_box;
        for p in &points {
            assert!(min.cmple(*p).all() && p.cmple(max).all());
        }
        assert_eq!(min, Vec3::new(-1.5, -0.25, -2.0));
        assert_eq!(max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(viewer.get_point_cloud("cloud1").unwrap().num_points(), 3);

        viewer.remove_structure("cloud1").unwrap();
        assert_eq!(*viewer.current_extent(), SceneExtent::default());
        assert!(!viewer.name_in_use("cloud1"));
    }

    // Test 3: Names are unique across structure types
    {
        viewer
            .register_point_cloud("shared", vec![Vec3::ZERO], false)
            .unwrap();
        let (verts, faces) = triangle();
        let err = viewer
            .register_surface_mesh("shared", verts.clone(), faces.clone(), false)
            .unwrap_err();
        assert!(matches!(err, ScenescopeError::NameCollision(ref n) if n == "shared"));

        // Replacing swaps the type under the same name
        viewer
            .register_surface_mesh("shared", verts, faces, true)
            .unwrap();
        assert!(viewer.get_point_cloud("shared").is_err());
        assert_eq!(viewer.get_surface_mesh("shared").unwrap().num_faces(), 1);
        viewer.remove_all_structures();
    }

    // Test 4: Lookups of missing names
    {
        assert!(matches!(
            viewer.get_ray_set("nope"),
            Err(ScenescopeError::NotFound(_))
        ));
        assert!(matches!(
            viewer.remove_structure("nope"),
            Err(ScenescopeError::NotFound(_))
        ));
    }

    // Test 5: Invalid geometry is rejected
    {
        let err = viewer
            .register_surface_mesh("bad", vec![Vec3::ZERO], vec![vec![0, 1, 2]], false)
            .unwrap_err();
        assert!(matches!(err, ScenescopeError::InvalidGeometry(_)));
        assert!(!viewer.name_in_use("bad"));

        let rays = vec![vec![RayPoint::infinite(Vec3::X)]];
        assert!(viewer.register_ray_set("bad rays", rays, false).is_err());
    }

    // Test 6: Selection follows pick indices and removal
    {
        viewer
            .register_point_cloud("a", vec![Vec3::ZERO, Vec3::X], false)
            .unwrap();
        viewer
            .register_point_cloud("b", vec![Vec3::Y, Vec3::Z, Vec3::ONE], false)
            .unwrap();
        let range = viewer.get_point_cloud("b").unwrap().pick_range().unwrap();

        let selection = viewer
            .context_mut()
            .apply_pick_index(range.start + 2, true)
            .cloned()
            .unwrap();
        assert_eq!(selection.structure_name, "b");
        assert_eq!(selection.structure_type, StructureType::PointCloud);
        assert_eq!(selection.local_index, 2);
        assert!(selection.is_double_click);

        // Background clears
        assert!(viewer.context_mut().apply_pick_index(0, false).is_none());
        assert!(viewer.current_selection().is_none());

        // Removing the selected structure clears the selection
        viewer.context_mut().apply_pick_index(range.start, false);
        assert!(viewer.current_selection().is_some());
        viewer.remove_structure("b").unwrap();
        assert!(viewer.current_selection().is_none());

        // Removing another structure keeps it
        let range = viewer.get_point_cloud("a").unwrap().pick_range().unwrap();
        viewer.context_mut().apply_pick_index(range.start + 1, false);
        viewer
            .register_camera_view("cam", CameraParameters::default(), false)
            .unwrap();
        viewer.remove_structure("cam").unwrap();
        assert_eq!(viewer.current_selection().unwrap().structure_name, "a");

        viewer.clear_selection();
        assert!(viewer.current_selection().is_none());
        viewer.remove_all_structures();
    }

    // Test 7: Edits through `update` refresh the extent
    {
        viewer
            .register_point_cloud("moving", vec![Vec3::ZERO, Vec3::ONE], false)
            .unwrap();
        let count = viewer
            .update::<PointCloud, _>("moving", |pc| {
                pc.update_points(vec![Vec3::ZERO, Vec3::splat(10.0), Vec3::X]);
                pc.num_points()
            })
            .unwrap();
        assert_eq!(count, Some(3));
        assert_eq!(viewer.current_extent().bounding_box.1, Vec3::splat(10.0));
        viewer.remove_all_structures();
    }

    // Test 8: Permissive mode logs instead of failing
    {
        viewer.options_mut().error_on_failure = false;
        viewer
            .register_point_cloud("dup", vec![Vec3::ZERO], false)
            .unwrap();
        assert!(viewer
            .register_point_cloud("dup", vec![Vec3::ONE], false)
            .is_ok());
        assert_eq!(viewer.get_point_cloud("dup").unwrap().points(), &[Vec3::ZERO]);
        assert!(viewer.remove_structure("missing").is_ok());

        // Getters still report, there is nothing to hand back
        assert!(viewer.get_point_cloud("missing").is_err());

        viewer.options_mut().error_on_failure = true;
        viewer.remove_all_structures();
    }

    // Test 9: Refused registrations leave the palette untouched
    {
        viewer
            .register_point_cloud("p0", vec![Vec3::ZERO], false)
            .unwrap();
        let first = viewer.get_point_cloud("p0").unwrap().base_color();

        assert!(viewer
            .register_point_cloud("p0", vec![Vec3::ONE], false)
            .is_err());
        assert!(viewer
            .register_surface_mesh("bad", vec![Vec3::ZERO], vec![vec![0, 1, 2]], false)
            .is_err());
        let (verts, faces) = triangle();
        assert!(viewer
            .register_surface_mesh("p0", verts, faces, false)
            .is_err());
        let rays = vec![vec![RayPoint::infinite(Vec3::X)]];
        assert!(viewer.register_ray_set("bad rays", rays, false).is_err());

        // Five accepted draws cycle the palette back to the first color
        for name in ["p1", "p2", "p3", "p4"] {
            viewer
                .register_point_cloud(name, vec![Vec3::ZERO], false)
                .unwrap();
            assert_ne!(viewer.get_point_cloud(name).unwrap().base_color(), first);
        }
        viewer
            .register_point_cloud("p5", vec![Vec3::ZERO], false)
            .unwrap();
        assert_eq!(viewer.get_point_cloud("p5").unwrap().base_color(), first);
        viewer.remove_all_structures();
    }

    // Test 10: Shutdown frees the slot
    {
        viewer.shutdown();
        assert!(!is_initialized());
        let again = Scenescope::init().expect("re-init after shutdown");
        assert!(is_initialized());
        drop(again);
        assert!(!is_initialized());
    }
}

/// Opens the viewer window; run manually.
#[test]
#[ignore = "requires a display"]
fn test_show_window() {
    let mut viewer = Scenescope::init().expect("init failed");
    let (verts, faces) = triangle();
    viewer
        .register_surface_mesh("mesh", verts, faces, false)
        .unwrap();
    viewer
        .register_point_cloud("points", vec![Vec3::ZERO, Vec3::ONE], false)
        .unwrap();
    viewer.set_user_callback(|ui| {
        ui.label("hello from the user callback");
    });
    viewer.show().unwrap();
}
