//! Viewer: renders a small scene through the software run unit and shows it
//! in a window. Pass a RON context config as the first argument to override
//! the defaults.

use macroquad::prelude::*;
use spanraster::texture::{SourcePixels, FilterMode as TexFilter};
use spanraster::{
    Color as RasterColor, ContextConfig, DepthBuffer, DrawRegion, DrawStats, PixelDepth, Quad,
    RenderContext, SourceImage, Sprite, SrcRect, TextureHandle, Triangle, Vertex, VERSION,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("spanraster viewer v{}", VERSION),
        window_width: WIDTH as i32,
        window_height: HEIGHT as i32,
        window_resizable: true,
        ..Default::default()
    }
}

/// 64x64 test pattern with a transparent corner
fn pattern() -> SourceImage {
    let mut px = Vec::with_capacity(64 * 64 * 4);
    for y in 0..64u32 {
        for x in 0..64u32 {
            let alpha = if x < 16 && y < 16 { 0 } else { 255 };
            px.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, if (x / 8 + y / 8) % 2 == 0 { 220 } else { 60 }, alpha]);
        }
    }
    SourceImage { width: 64, height: 64, pixels: SourcePixels::Rgba32(px) }
}

fn render_scene(
    ctx: &mut RenderContext,
    texture: TextureHandle,
    pixels: &mut [u8],
    depth: &mut [u8],
    time: f32,
) -> spanraster::Result<DrawStats> {
    let region = DrawRegion::packed(pixels, WIDTH, HEIGHT, PixelDepth::Argb8888)?;
    let mut zbuf = DepthBuffer::packed(depth, WIDTH, HEIGHT)?;
    zbuf.clear(DepthBuffer::FAR);

    let mut frame = ctx.begin_frame(region, Some(zbuf))?;
    frame.target_mut().clear(RasterColor::new(16, 16, 32));

    frame.draw_triangle(&Triangle::new(
        Vertex::new(200.0, 50.0, 110.0).with_light(1.0),
        Vertex::new(600.0, 150.0, 50.0).with_light(0.6),
        Vertex::new(400.0, 250.0, 10.0).with_light(0.3),
    ))?;

    let wobble = time.sin() * 20.0;
    frame.draw_quad(
        &Quad::new(
            Vertex::new(60.0 + wobble, 280.0, 30.0).with_uv(0.0, 0.0),
            Vertex::new(260.0, 300.0, 30.0).with_uv(1.0, 0.0),
            Vertex::new(240.0, 450.0, 30.0).with_uv(1.0, 1.0),
            Vertex::new(40.0, 420.0 - wobble, 30.0).with_uv(0.0, 1.0),
        )
        .with_texture(texture),
    )?;

    let mut sprite = Sprite::new(texture, SrcRect::new(0.0, 0.0, 64.0, 64.0), 440.0, 300.0);
    sprite.zoom_x = 2.0;
    sprite.zoom_y = 2.0;
    sprite.angle = time;
    frame.draw_sprite(&sprite)?;

    Ok(frame.stats())
}

/// Argb8888 is stored little-endian (B, G, R, A); the window wants RGBA
fn to_rgba(argb: &[u8], rgba: &mut [u8]) {
    for (src, dst) in argb.chunks_exact(4).zip(rgba.chunks_exact_mut(4)) {
        dst.copy_from_slice(&[src[2], src[1], src[0], 255]);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ContextConfig::load(&path).unwrap_or_else(|err| {
            tracing::warn!(%path, error = %err, "could not load config, using defaults");
            ContextConfig::default()
        }),
        None => ContextConfig::default(),
    };

    let mut ctx = match RenderContext::new(&config, None) {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::error!(error = %err, "could not create render context");
            return;
        }
    };
    let texture = match ctx.create_texture(&pattern(), TexFilter::Bilinear) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "could not create texture");
            return;
        }
    };

    let size = (WIDTH * HEIGHT) as usize;
    let mut pixels = vec![0u8; size * 4];
    let mut depth = vec![0u8; size * DepthBuffer::BYTES_PER_PIXEL];
    let mut rgba = vec![0u8; size * 4];

    let screen = Texture2D::from_rgba8(WIDTH as u16, HEIGHT as u16, &rgba);
    screen.set_filter(FilterMode::Nearest);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let stats = match render_scene(&mut ctx, texture, &mut pixels, &mut depth, get_time() as f32) {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!(error = %err, "frame failed");
                break;
            }
        };
        to_rgba(&pixels, &mut rgba);
        screen.update_from_bytes(WIDTH, HEIGHT, &rgba);

        clear_background(BLACK);
        draw_texture_ex(
            &screen,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        draw_text(
            &format!("{} scanlines, {} runs", stats.scanlines, stats.runs),
            8.0,
            20.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}
