//! Render context and frame scope
//!
//! `RenderContext` owns the state, the texture arena and the span unit.
//! `Frame` borrows it together with a draw region (and optional depth buffer)
//! and is the only way to draw; dropping it releases the region.

use std::ops::AddAssign;
use std::path::Path;

use crate::config::ContextConfig;
use crate::coprocessor::{Coprocessor, MmioCoprocessor, RunFlags, RunMemory, SoftCoprocessor};
use crate::error::{RasterError, Result};
use crate::texture::{loader, FilterMode, SourceImage, Texture, TextureArena, TextureHandle};
use super::classify::{classify_quad, classify_triangle};
use super::edges::{EdgePlan, EdgeVertex};
use super::math::Attrs;
use super::span::{setup_span, SpanSetup};
use super::sprite::{rotated_corners, RowBlit};
use super::surface::{DepthBuffer, DrawRegion};
use super::types::{Color, Quad, RenderState, Scissor, ShadingMode, Sprite, Triangle, Vertex};

/// Work done for one or more primitives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Scanlines walked inside the scissor
    pub scanlines: u32,
    /// Runs issued to the span unit
    pub runs: u32,
}

impl AddAssign for DrawStats {
    fn add_assign(&mut self, other: DrawStats) {
        self.scanlines += other.scanlines;
        self.runs += other.runs;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Drawn(DrawStats),
    /// Entirely outside the scissor; nothing was written
    Culled,
}

/// Result of a batch call. Failed primitives are skipped, not fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub drawn: usize,
    pub culled: usize,
    pub skipped: usize,
    pub stats: DrawStats,
}

impl BatchStats {
    fn record(&mut self, result: Result<Outcome>, index: usize, kind: &str) {
        match result {
            Ok(Outcome::Drawn(stats)) => {
                self.drawn += 1;
                self.stats += stats;
            }
            Ok(Outcome::Culled) => self.culled += 1,
            Err(err) => {
                tracing::warn!(index, kind, error = %err, "skipping primitive");
                self.skipped += 1;
            }
        }
    }
}

pub struct RenderContext {
    state: RenderState,
    scissor: Option<Scissor>,
    textures: TextureArena,
    checkerboard: Texture,
    coprocessor: Box<dyn Coprocessor>,
}

impl RenderContext {
    /// Create a context on the hardware span unit if one is mapped, falling
    /// back to software emulation unless the config requires hardware.
    pub fn new(config: &ContextConfig, hardware: Option<MmioCoprocessor>) -> Result<Self> {
        let coprocessor: Box<dyn Coprocessor> = match hardware {
            Some(unit) => {
                tracing::debug!("using memory-mapped span unit");
                Box::new(unit)
            }
            None if config.require_hardware => return Err(RasterError::CoprocessorUnavailable),
            None => {
                tracing::warn!("span unit unavailable, using software emulation");
                Box::new(SoftCoprocessor::new())
            }
        };
        let ctx = Self::with_coprocessor(config, coprocessor)?;
        tracing::debug!(max_textures = config.max_textures, "render context created");
        Ok(ctx)
    }

    pub fn with_coprocessor(config: &ContextConfig, coprocessor: Box<dyn Coprocessor>) -> Result<Self> {
        if let Some(scissor) = &config.scissor {
            scissor.validate()?;
        }
        Ok(Self {
            state: config.state,
            scissor: config.scissor,
            textures: TextureArena::new(config.max_textures),
            checkerboard: Texture::checkerboard(),
            coprocessor,
        })
    }

    pub fn is_hardware(&self) -> bool {
        self.coprocessor.is_hardware()
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn set_state(&mut self, state: RenderState) {
        self.state = state;
    }

    pub fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    /// Set the clip rectangle used by subsequent frames
    pub fn set_scissor(&mut self, scissor: Scissor) -> Result<()> {
        scissor.validate()?;
        self.scissor = Some(scissor);
        Ok(())
    }

    /// Clip to the whole draw region again
    pub fn clear_scissor(&mut self) {
        self.scissor = None;
    }

    pub fn create_texture(&mut self, image: &SourceImage, filter: FilterMode) -> Result<TextureHandle> {
        let texture = Texture::from_source(image, filter)?;
        let handle = self.textures.insert(texture)?;
        tracing::debug!(size = image.width, textures = self.textures.len(), "created texture");
        Ok(handle)
    }

    /// Load a BMP, PNG or DDS file into the arena
    pub fn load_texture<P: AsRef<Path>>(&mut self, path: P, filter: FilterMode) -> Result<TextureHandle> {
        let path = path.as_ref();
        let mut texture = Texture::from_source(&loader::load_source(path)?, filter)?;
        texture.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let handle = self.textures.insert(texture)?;
        tracing::debug!(path = %path.display(), textures = self.textures.len(), "loaded texture");
        Ok(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle)
    }

    pub fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self.textures.remove(handle).ok_or(RasterError::UnknownTexture)?;
        tracing::debug!(name = %texture.name, textures = self.textures.len(), "destroyed texture");
        Ok(())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Start drawing into `target`. A depth buffer at least as large as the
    /// region is required while Z-buffering is enabled.
    pub fn begin_frame<'f>(
        &'f mut self,
        target: DrawRegion<'f>,
        depth: Option<DepthBuffer<'f>>,
    ) -> Result<Frame<'f>> {
        check_depth(&self.state, &target, depth.as_ref())?;

        let full = Scissor { left: 0, top: 0, width: target.width(), height: target.height() };
        let scissor = self.scissor.unwrap_or(full).clamp_to(target.width(), target.height());
        tracing::debug!(width = target.width(), height = target.height(), ?scissor, "frame acquired");

        Ok(Frame { ctx: self, target, depth, scissor, stats: DrawStats::default() })
    }
}

fn check_depth(state: &RenderState, target: &DrawRegion<'_>, depth: Option<&DepthBuffer<'_>>) -> Result<()> {
    if !state.zbuffer {
        return Ok(());
    }
    match depth {
        Some(zbuf) if zbuf.width() >= target.width() && zbuf.height() >= target.height() => Ok(()),
        _ => Err(RasterError::ZBufferMissing),
    }
}

fn run_flags(state: &RenderState, texture: Option<&Texture>) -> RunFlags {
    let bilinear = texture.map_or(false, |t| t.filter == FilterMode::Bilinear);
    let mut flags = RunFlags::empty();
    flags.set(RunFlags::BILINEAR, state.filtering && bilinear);
    flags.set(RunFlags::ZWRITE_INHIBIT, state.zwrite_inhibit);
    flags.set(RunFlags::BLEND, state.blending);
    flags
}

fn edge_vertices<const N: usize>(verts: &[Vertex; N], uv_scale: f32, shading: ShadingMode) -> [EdgeVertex; N] {
    let top_light = verts[0].light;
    verts.map(|v| EdgeVertex {
        attrs: Attrs {
            x: v.x,
            z: v.z,
            u: v.u * uv_scale,
            v: v.v * uv_scale,
            light: match shading {
                ShadingMode::Flat => top_light,
                ShadingMode::Smooth => v.light,
            },
        },
        y: v.y,
    })
}

/// An active draw target. Dropping it ends the frame.
pub struct Frame<'f> {
    ctx: &'f mut RenderContext,
    target: DrawRegion<'f>,
    depth: Option<DepthBuffer<'f>>,
    scissor: Scissor,
    stats: DrawStats,
}

impl<'f> Frame<'f> {
    pub fn state(&self) -> &RenderState {
        &self.ctx.state
    }

    /// Change state mid-frame. Enabling Z without a depth buffer is refused.
    pub fn set_state(&mut self, state: RenderState) -> Result<()> {
        check_depth(&state, &self.target, self.depth.as_ref())?;
        self.ctx.state = state;
        Ok(())
    }

    /// Effective clip rectangle (clamped to the region)
    pub fn scissor(&self) -> Scissor {
        self.scissor
    }

    pub fn set_scissor(&mut self, scissor: Scissor) -> Result<()> {
        self.ctx.set_scissor(scissor)?;
        self.scissor = scissor.clamp_to(self.target.width(), self.target.height());
        Ok(())
    }

    pub fn target(&self) -> &DrawRegion<'f> {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut DrawRegion<'f> {
        &mut self.target
    }

    pub fn depth_buffer_mut(&mut self) -> Option<&mut DepthBuffer<'f>> {
        self.depth.as_mut()
    }

    /// Totals for everything drawn so far in this frame
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Draw a triangle without touching the caller's vertices
    pub fn draw_triangle(&mut self, triangle: &Triangle) -> Result<Outcome> {
        let mut scratch = *triangle;
        self.draw_triangle_in_place(&mut scratch)
    }

    /// Draw a triangle, leaving its vertices snapped and reordered
    pub fn draw_triangle_in_place(&mut self, triangle: &mut Triangle) -> Result<Outcome> {
        let Some(class) = classify_triangle(&mut triangle.verts, &self.scissor)? else {
            tracing::trace!("triangle culled");
            return Ok(Outcome::Culled);
        };
        let (texture, uv_scale) = self.mapping(triangle.texture)?;
        let verts = edge_vertices(&triangle.verts, uv_scale, self.ctx.state.shading);
        let plan = EdgePlan::triangle(class, &verts);
        let stats = self.rasterize(&plan, texture, triangle.color, self.ctx.state.zbuffer)?;
        tracing::trace!(?class, scanlines = stats.scanlines, runs = stats.runs, "triangle");
        Ok(Outcome::Drawn(stats))
    }

    pub fn draw_triangles(&mut self, triangles: &[Triangle]) -> BatchStats {
        let mut batch = BatchStats::default();
        for (index, triangle) in triangles.iter().enumerate() {
            batch.record(self.draw_triangle(triangle), index, "triangle");
        }
        batch
    }

    pub fn draw_quad(&mut self, quad: &Quad) -> Result<Outcome> {
        let mut scratch = *quad;
        self.draw_quad_in_place(&mut scratch)
    }

    /// Draw a quad, leaving its vertices snapped, wound clockwise and rotated
    pub fn draw_quad_in_place(&mut self, quad: &mut Quad) -> Result<Outcome> {
        let Some(class) = classify_quad(&mut quad.verts, &self.scissor)? else {
            tracing::trace!("quad culled");
            return Ok(Outcome::Culled);
        };
        let (texture, uv_scale) = self.mapping(quad.texture)?;
        let verts = edge_vertices(&quad.verts, uv_scale, self.ctx.state.shading);
        let plan = EdgePlan::quad(&verts);
        let stats = self.rasterize(&plan, texture, quad.color, self.ctx.state.zbuffer)?;
        tracing::trace!(?class, scanlines = stats.scanlines, runs = stats.runs, "quad");
        Ok(Outcome::Drawn(stats))
    }

    pub fn draw_quads(&mut self, quads: &[Quad]) -> BatchStats {
        let mut batch = BatchStats::default();
        for (index, quad) in quads.iter().enumerate() {
            batch.record(self.draw_quad(quad), index, "quad");
        }
        batch
    }

    /// Draw a sprite. Sprites ignore the depth buffer and draw at full light.
    pub fn draw_sprite(&mut self, sprite: &Sprite) -> Result<Outcome> {
        if self.ctx.textures.get(sprite.texture).is_none() {
            return Err(RasterError::UnknownTexture);
        }

        if sprite.angle != 0.0 {
            let mut corners = rotated_corners(sprite)?;
            if classify_quad(&mut corners, &self.scissor)?.is_none() {
                return Ok(Outcome::Culled);
            }
            let plan = EdgePlan::quad(&edge_vertices(&corners, 1.0, ShadingMode::Smooth));
            let stats = self.rasterize(&plan, Some(sprite.texture), sprite.color, false)?;
            return Ok(Outcome::Drawn(stats));
        }

        let Some(blit) = RowBlit::plan(sprite, &self.scissor)? else {
            return Ok(Outcome::Culled);
        };
        let ctx = &mut *self.ctx;
        let texture = ctx.textures.get(sprite.texture).ok_or(RasterError::UnknownTexture)?;
        let flags = run_flags(&ctx.state, Some(texture));

        let mut runs = 0;
        for row in 0..blit.height {
            if let Some(cmd) = blit.row(row, &self.target, sprite.color, flags) {
                ctx.coprocessor.run(&cmd, RunMemory { dest: &mut self.target, depth: None, texture });
                runs += 1;
            }
        }
        let stats = DrawStats { scanlines: blit.height as u32, runs };
        self.stats += stats;
        Ok(Outcome::Drawn(stats))
    }

    /// Texture to sample and the factor applied to vertex uv. Untextured
    /// primitives sample the checkerboard's white origin texel.
    fn mapping(&self, handle: Option<TextureHandle>) -> Result<(Option<TextureHandle>, f32)> {
        match handle {
            Some(handle) if self.ctx.state.texturing => {
                let texture = self.ctx.textures.get(handle).ok_or(RasterError::UnknownTexture)?;
                let scale = if self.ctx.state.normalized_uv { texture.size() as f32 } else { 1.0 };
                Ok((Some(handle), scale))
            }
            _ => Ok((None, 0.0)),
        }
    }

    fn rasterize(
        &mut self,
        plan: &EdgePlan,
        handle: Option<TextureHandle>,
        color: Color,
        depth: bool,
    ) -> Result<DrawStats> {
        let ctx = &mut *self.ctx;
        let (texture, sampled) = match handle {
            Some(handle) => (ctx.textures.get(handle).ok_or(RasterError::UnknownTexture)?, true),
            None => (&ctx.checkerboard, false),
        };
        let setup = SpanSetup {
            scissor: self.scissor,
            color,
            flags: run_flags(&ctx.state, sampled.then_some(texture)),
            depth,
        };

        let coprocessor = &mut ctx.coprocessor;
        let target = &mut self.target;
        let zbuf = &mut self.depth;
        let mut runs = 0;
        let scanlines = plan.walk(&setup.scissor, |y, left, right| {
            if let Some(cmd) = setup_span(y, left, right, &setup, &*target, zbuf.as_ref()) {
                coprocessor.run(&cmd, RunMemory { dest: &mut *target, depth: zbuf.as_mut(), texture });
                runs += 1;
            }
        });

        let stats = DrawStats { scanlines, runs };
        self.stats += stats;
        Ok(stats)
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        tracing::debug!(scanlines = self.stats.scanlines, runs = self.stats.runs, "frame released");
    }
}
