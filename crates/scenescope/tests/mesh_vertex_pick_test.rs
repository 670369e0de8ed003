//! Mesh vertices stay pickable where they sit on their own faces.
//!
//! Needs a GPU adapter; returns early with a message without one.

use scenescope::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Device pixel under the world point `p`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_of(camera: &Camera, p: Vec3) -> (u32, u32) {
    let clip = camera.view_projection_matrix() * p.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    let x = (ndc.x * 0.5 + 0.5) * WIDTH as f32;
    let y = (0.5 - ndc.y * 0.5) * HEIGHT as f32;
    (x as u32, y as u32)
}

#[test]
fn test_vertex_sprites_win_over_their_faces() {
    let options = Options {
        point_radius: 0.05,
        ..Options::default()
    };
    let mut ctx = Context::new(options);
    let corner = Vec3::new(-1.0, -1.0, 0.0);
    let quad = SurfaceMesh::new(
        "quad",
        vec![
            corner,
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2, 3]],
    )
    .unwrap();
    ctx.register_structure(Box::new(quad), false).unwrap();

    let mut renderer = match HeadlessRenderer::new(&mut ctx, WIDTH, HEIGHT) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Skipping vertex pick test: no GPU adapter available ({e})");
            return;
        }
    };

    // A point on the face, inside the vertex sprite around the corner
    let radius = 0.75 * ctx.options.point_radius * ctx.extent().length_scale;
    let inside = corner + Vec3::new(0.4 * radius, 0.4 * radius, 0.0);
    let (x, y) = pixel_of(renderer.camera(), inside);

    let selection = match renderer.pick(&mut ctx, x, y, false) {
        Ok(selection) => selection.expect("corner should hit the mesh"),
        Err(e) => {
            eprintln!("Skipping vertex pick test: {e}");
            return;
        }
    };
    let mesh = ctx.get_as::<SurfaceMesh>("quad").unwrap();
    assert_eq!(
        mesh.pick_element(selection.local_index),
        Some(MeshElement::Vertex(0))
    );

    // The middle of the face is still the face
    let (x, y) = pixel_of(renderer.camera(), Vec3::ZERO);
    let selection = renderer.pick(&mut ctx, x, y, false).unwrap().expect("face hit");
    let mesh = ctx.get_as::<SurfaceMesh>("quad").unwrap();
    assert_eq!(
        mesh.pick_element(selection.local_index),
        Some(MeshElement::Face(0))
    );
}
