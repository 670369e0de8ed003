//! scenescope: an interactive 3D viewer for geometric data.
//!
//! Register point clouds, surface meshes, camera views and ray sets with a
//! [`Scenescope`] handle, open the viewer with [`Scenescope::show`], and click
//! any point, vertex, face, camera or ray to inspect it. Selection works by
//! rendering every pickable element into an off-screen buffer in a colour
//! that encodes its index.
//!
//! # Quick Start
//!
//! ```no_run
//! use scenescope::*;
//!
//! fn main() -> Result<()> {
//!     let mut viewer = Scenescope::init()?;
//!
//!     let points = vec![
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(1.0, 0.0, 0.0),
//!         Vec3::new(0.0, 1.0, 0.0),
//!     ];
//!     viewer.register_point_cloud("my points", points, false)?;
//!
//!     viewer.show()?;
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Operations return [`ScenescopeError`]. With
//! [`Options::error_on_failure`] set to `false`, mutating operations log the
//! error as a warning and return `Ok` without effect instead.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

mod app;
mod headless;
mod init;
mod interaction;
mod picking;

use std::path::{Path, PathBuf};

use scenescope_render::{save_image, RenderError, ScreenshotCounter};
use winit::event_loop::EventLoop;
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;

pub use headless::HeadlessRenderer;
pub use init::is_initialized;
pub use interaction::{PointerAction, PointerButton, PointerTracker};

// Re-export core types
pub use scenescope_core::{
    color_to_index, index_to_color, Context, Mat4, Options, PickRange, PickState, Result,
    SceneExtent, ScenescopeError, Selection, Structure, StructureType, Vec2, Vec3, Vec4,
};

// Re-export structures
pub use scenescope_structures::{
    CameraParameters, CameraView, MeshElement, PointCloud, RayPoint, RaySet, SurfaceMesh,
};

pub use image::RgbaImage;
pub use scenescope_render::Camera;

/// Off-screen viewport used for code-driven pick queries and screenshots
/// until [`Scenescope::set_offscreen_size`] is called.
const DEFAULT_OFFSCREEN_SIZE: (u32, u32) = (1280, 720);

/// The viewer session.
///
/// Owns every registered structure, the scene extent, the selection and the
/// options. At most one handle is alive per process; see
/// [`Scenescope::init`].
pub struct Scenescope {
    ctx: Context,
    user_callback: Option<Box<dyn FnMut(&mut egui::Ui)>>,
    screenshots: ScreenshotCounter,
    offscreen: Option<HeadlessRenderer>,
    offscreen_size: Option<(u32, u32)>,
    /// Extent the off-screen camera was last framed on.
    offscreen_extent: Option<SceneExtent>,
    /// Camera left by the last `show`, reused by the next window and by
    /// off-screen renders.
    view_camera: Option<Camera>,
    event_loop: Option<EventLoop<()>>,
    _guard: init::InstanceGuard,
}

impl Scenescope {
    /// Returns the options.
    pub fn options(&self) -> &Options {
        &self.ctx.options
    }

    /// Returns the options for modification.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.ctx.options
    }

    /// Returns the session context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Returns the session context for direct manipulation.
    ///
    /// Errors from the context are not routed through the permissive policy.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    // ---- registration ----

    /// Registers a structure built by the caller.
    pub fn register_structure(
        &mut self,
        structure: Box<dyn Structure>,
        replace_if_present: bool,
    ) -> Result<()> {
        let result = self.ctx.register_structure(structure, replace_if_present);
        self.ctx.report(result).map(|_| ())
    }

    /// Registers a point cloud.
    pub fn register_point_cloud(
        &mut self,
        name: impl Into<String>,
        points: Vec<Vec3>,
        replace_if_present: bool,
    ) -> Result<()> {
        let name = name.into();
        let Some(color) = self.palette_color_for(&name, replace_if_present)? else {
            return Ok(());
        };
        let mut cloud = PointCloud::new(name, points);
        cloud
            .set_base_color(color)
            .set_point_radius(self.ctx.options.point_radius);
        self.register_structure(Box::new(cloud), replace_if_present)
    }

    /// Registers a polygonal surface mesh.
    pub fn register_surface_mesh(
        &mut self,
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        faces: Vec<Vec<u32>>,
        replace_if_present: bool,
    ) -> Result<()> {
        let result = SurfaceMesh::new(name, vertices, faces);
        let Some(mut mesh) = self.ctx.report(result)? else {
            return Ok(());
        };
        let Some(color) = self.palette_color_for(mesh.name(), replace_if_present)? else {
            return Ok(());
        };
        mesh.set_surface_color(color);
        self.register_structure(Box::new(mesh), replace_if_present)
    }

    /// Registers a camera view.
    pub fn register_camera_view(
        &mut self,
        name: impl Into<String>,
        params: CameraParameters,
        replace_if_present: bool,
    ) -> Result<()> {
        let view = CameraView::new(name, params);
        self.register_structure(Box::new(view), replace_if_present)
    }

    /// Registers a ray set.
    pub fn register_ray_set(
        &mut self,
        name: impl Into<String>,
        rays: Vec<Vec<RayPoint>>,
        replace_if_present: bool,
    ) -> Result<()> {
        let result = RaySet::new(name, rays);
        let Some(mut set) = self.ctx.report(result)? else {
            return Ok(());
        };
        let Some(color) = self.palette_color_for(set.name(), replace_if_present)? else {
            return Ok(());
        };
        set.set_color(color);
        self.register_structure(Box::new(set), replace_if_present)
    }

    /// Draws the palette color for a structure about to be registered as
    /// `name`, or `None` if the registration would be refused. A refused
    /// registration leaves the palette where it was.
    fn palette_color_for(
        &mut self,
        name: &str,
        replace_if_present: bool,
    ) -> Result<Option<Vec3>> {
        let free = self
            .ctx
            .check_name_in_use(name, !replace_if_present)
            .map(|_| ());
        Ok(self.ctx.report(free)?.map(|()| self.ctx.next_palette_color()))
    }

    // ---- lookup ----

    /// Returns whether a structure of any type uses `name`.
    pub fn name_in_use(&self, name: &str) -> bool {
        self.ctx.name_in_use(name)
    }

    /// Gets a structure by name, downcast to its concrete type.
    ///
    /// A missing name (or one registered with another type) is
    /// [`ScenescopeError::NotFound`] regardless of the error policy, since
    /// there is nothing to return.
    pub fn get<T: Structure>(&self, name: &str) -> Result<&T> {
        self.ctx.get_as(name)
    }

    /// Mutable counterpart of [`Scenescope::get`].
    ///
    /// Geometry edits made through this reference do not update the extent
    /// or pick ranges; use [`Scenescope::update`] for those.
    pub fn get_mut<T: Structure>(&mut self, name: &str) -> Result<&mut T> {
        self.ctx.get_as_mut(name)
    }

    pub fn get_point_cloud(&self, name: &str) -> Result<&PointCloud> {
        self.get(name)
    }

    pub fn get_point_cloud_mut(&mut self, name: &str) -> Result<&mut PointCloud> {
        self.get_mut(name)
    }

    pub fn get_surface_mesh(&self, name: &str) -> Result<&SurfaceMesh> {
        self.get(name)
    }

    pub fn get_surface_mesh_mut(&mut self, name: &str) -> Result<&mut SurfaceMesh> {
        self.get_mut(name)
    }

    pub fn get_camera_view(&self, name: &str) -> Result<&CameraView> {
        self.get(name)
    }

    pub fn get_camera_view_mut(&mut self, name: &str) -> Result<&mut CameraView> {
        self.get_mut(name)
    }

    pub fn get_ray_set(&self, name: &str) -> Result<&RaySet> {
        self.get(name)
    }

    pub fn get_ray_set_mut(&mut self, name: &str) -> Result<&mut RaySet> {
        self.get_mut(name)
    }

    /// Edits a structure, then refreshes the extent and its pick range.
    ///
    /// Returns `Ok(None)` if the edit failed in permissive mode.
    pub fn update<T: Structure, R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>> {
        let result = self.ctx.with_structure_mut(name, f);
        self.ctx.report(result)
    }

    // ---- removal ----

    /// Removes a structure, clearing the selection if it pointed at it.
    pub fn remove_structure(&mut self, name: &str) -> Result<()> {
        let result = self.ctx.remove_structure(name);
        self.ctx.report(result).map(|_| ())
    }

    /// Removes every structure and resets the extent and selection.
    pub fn remove_all_structures(&mut self) {
        self.ctx.remove_all_structures();
    }

    // ---- scene state ----

    /// Returns the scene extent: bounding box, length scale and center.
    pub fn current_extent(&self) -> &SceneExtent {
        self.ctx.extent()
    }

    /// Returns the current selection.
    pub fn current_selection(&self) -> Option<&Selection> {
        self.ctx.selection()
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.ctx.clear_selection();
    }

    /// Sets the callback drawn in its own window every frame.
    pub fn set_user_callback(&mut self, callback: impl FnMut(&mut egui::Ui) + 'static) {
        self.user_callback = Some(Box::new(callback));
    }

    /// Removes the user callback.
    pub fn clear_user_callback(&mut self) {
        self.user_callback = None;
    }

    // ---- display ----

    /// Opens the viewer window and blocks until it is closed.
    ///
    /// Can be called repeatedly; the camera carries over between calls.
    pub fn show(&mut self) -> Result<()> {
        let _ = env_logger::try_init();
        let result = self.run_window();
        self.ctx.report(result).map(|_| ())
    }

    fn run_window(&mut self) -> Result<()> {
        let mut event_loop = match self.event_loop.take() {
            Some(event_loop) => event_loop,
            None => EventLoop::new().map_err(|err| {
                ScenescopeError::GpuResource(format!("failed to create event loop: {err}"))
            })?,
        };

        // The window uses its own device.
        self.offscreen = None;

        let mut app = app::App::new(
            &mut self.ctx,
            self.user_callback.as_deref_mut(),
            &mut self.screenshots,
            self.view_camera.take(),
        );
        let run = event_loop.run_app_on_demand(&mut app);
        let (camera, fatal) = app.finish();
        self.event_loop = Some(event_loop);
        self.view_camera = camera;

        run.map_err(|err| ScenescopeError::GpuResource(format!("event loop error: {err}")))?;
        fatal.map_or(Ok(()), Err)
    }

    // ---- off-screen rendering ----

    /// Sets the size of the off-screen viewport used by
    /// [`Scenescope::pick_at`] and screenshots.
    pub fn set_offscreen_size(&mut self, width: u32, height: u32) {
        self.offscreen_size = Some((width, height));
        if let Some(renderer) = &mut self.offscreen {
            renderer.resize(width, height);
        }
    }

    /// Returns the off-screen pick buffer size, once a query allocated it.
    pub fn offscreen_pick_buffer_size(&self) -> Option<(u32, u32)> {
        self.offscreen.as_ref().and_then(HeadlessRenderer::pick_buffer_size)
    }

    /// Returns the off-screen renderer, creating it on first use, together
    /// with the context it draws.
    ///
    /// Without a camera left by [`Scenescope::show`], the camera is reframed
    /// whenever the scene extent changed since the last query.
    fn offscreen(&mut self) -> Result<(&mut HeadlessRenderer, &mut Context)> {
        let mut renderer = match self.offscreen.take() {
            Some(renderer) => renderer,
            None => {
                let (width, height) = self.offscreen_size.unwrap_or(DEFAULT_OFFSCREEN_SIZE);
                let mut renderer = HeadlessRenderer::new(&mut self.ctx, width, height)?;
                if let Some(camera) = &self.view_camera {
                    let aspect_ratio = renderer.camera().aspect_ratio;
                    *renderer.camera_mut() = Camera {
                        aspect_ratio,
                        ..camera.clone()
                    };
                }
                self.offscreen_extent = Some(*self.ctx.extent());
                renderer
            }
        };
        let extent = *self.ctx.extent();
        if self.view_camera.is_none() && self.offscreen_extent != Some(extent) {
            log::debug!("scene extent changed, reframing the off-screen camera");
            renderer.frame_scene(&self.ctx);
            self.offscreen_extent = Some(extent);
        }
        Ok((self.offscreen.insert(renderer), &mut self.ctx))
    }

    /// Runs a pick query at device pixel `(x, y)` of the off-screen viewport.
    ///
    /// On success the selection is updated and returned; background clears
    /// it. On error the selection is unchanged.
    pub fn pick_at(&mut self, x: u32, y: u32) -> Result<Option<Selection>> {
        let result = self
            .offscreen()
            .and_then(|(renderer, ctx)| renderer.pick(ctx, x, y, false));
        Ok(self.ctx.report(result)?.flatten())
    }

    /// Renders the scene without UI.
    pub fn render_image(&mut self) -> Result<Option<RgbaImage>> {
        let result = self.render_offscreen();
        self.ctx.report(result)
    }

    fn render_offscreen(&mut self) -> Result<RgbaImage> {
        let (renderer, ctx) = self.offscreen()?;
        renderer.render(ctx)
    }

    /// Writes a screenshot to `screenshot_NNNNNN.png` in the working
    /// directory and returns its path.
    pub fn screenshot(&mut self) -> Result<Option<PathBuf>> {
        let path = self.screenshots.next_path();
        let result = self.write_screenshot(&path).map(|()| path);
        self.ctx.report(result)
    }

    /// Writes a screenshot to `path`; the extension picks PNG or JPEG.
    pub fn screenshot_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let result = self.write_screenshot(path.as_ref());
        self.ctx.report(result).map(|_| ())
    }

    fn write_screenshot(&mut self, path: &Path) -> Result<()> {
        let image = self.render_offscreen()?;
        save_image(path, &image).map_err(RenderError::from)?;
        if self.ctx.options.logs_info() {
            log::info!("saved screenshot to {}", path.display());
        }
        Ok(())
    }
}
