mod common;

use std::rc::Rc;

use common::*;
use gloam::*;

fn depth_texture(ctx: &Context, width: u32, height: u32) -> Rc<Texture> {
    ctx.texture(&TextureInfo {
        debug_name: "depth",
        size: [width, height],
        components: 1,
        dtype: TextureDtype::F4,
        ..Default::default()
    })
    .unwrap()
}

fn framebuffer(ctx: &Context, colors: &[Rc<Texture>], depth: Option<&Rc<Texture>>) -> Rc<Framebuffer> {
    ctx.framebuffer(&FramebufferInfo {
        debug_name: "offscreen",
        color_attachments: colors,
        depth_attachment: depth,
    })
    .unwrap()
}

#[test]
fn attachments_are_wired_up() {
    let (ctx, driver) = bare_context();
    let colors = [rgba_texture(&ctx, 64, 64), rgba_texture(&ctx, 64, 64)];
    let depth = depth_texture(&ctx, 64, 64);
    let fb = framebuffer(&ctx, &colors, Some(&depth));

    assert_eq!(fb.size(), (64, 64));
    assert_eq!(fb.color_attachments().len(), 2);
    assert_eq!(fb.viewport(), Viewport::new(0, 0, 64, 64));
    assert_eq!(
        driver.framebuffer_attachment(fb.handle(), glow::COLOR_ATTACHMENT1),
        Some(colors[1].handle())
    );
    assert_eq!(
        driver.framebuffer_attachment(fb.handle(), glow::DEPTH_ATTACHMENT),
        Some(depth.handle())
    );
    // Construction leaves the window bound.
    assert_eq!(driver.bound_framebuffer(), None);
}

#[test]
fn attachment_sizes_must_agree() {
    let (ctx, driver) = bare_context();
    let colors = [rgba_texture(&ctx, 64, 64), rgba_texture(&ctx, 64, 64)];
    let depth = depth_texture(&ctx, 32, 32);

    let result = ctx.framebuffer(&FramebufferInfo {
        color_attachments: &colors,
        depth_attachment: Some(&depth),
        ..Default::default()
    });
    match result {
        Err(GPUError::AttachmentSizeMismatch { expected, found }) => {
            assert_eq!(expected, (64, 64));
            assert_eq!(found, (32, 32));
        }
        other => panic!("expected AttachmentSizeMismatch, got {other:?}"),
    }
    assert_eq!(driver.live_framebuffers(), 0);
}

#[test]
fn a_color_attachment_is_required() {
    let (ctx, _) = bare_context();
    let depth = depth_texture(&ctx, 8, 8);

    assert!(matches!(
        ctx.framebuffer(&FramebufferInfo {
            depth_attachment: Some(&depth),
            ..Default::default()
        }),
        Err(GPUError::MissingColorAttachment)
    ));
}

#[test]
fn color_attachments_are_capped_by_the_driver() {
    let driver = NullDriver::new();
    driver.set_parameter(glow::MAX_COLOR_ATTACHMENTS, 1);
    let (ctx, _) = context_with(
        driver,
        &ContextInfo {
            load_builtin_programs: false,
            ..Default::default()
        },
    );
    let colors = [rgba_texture(&ctx, 4, 4), rgba_texture(&ctx, 4, 4)];

    assert!(matches!(
        ctx.framebuffer(&FramebufferInfo {
            color_attachments: &colors,
            ..Default::default()
        }),
        Err(GPUError::TooManyColorAttachments { max: 1, got: 2 })
    ));
}

#[test]
fn incomplete_framebuffers_are_reported() {
    let (ctx, driver) = bare_context();
    let empty = rgba_texture(&ctx, 0, 0);

    let result = ctx.framebuffer(&FramebufferInfo {
        color_attachments: &[empty],
        ..Default::default()
    });
    match result {
        Err(GPUError::FramebufferIncomplete(message)) => {
            assert_eq!(message, "Framebuffer incomplete attachment.")
        }
        other => panic!("expected FramebufferIncomplete, got {other:?}"),
    }
    assert_eq!(driver.bound_framebuffer(), None);
    assert_eq!(driver.live_framebuffers(), 0);
}

#[test]
fn activating_twice_binds_once() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 16, 16)], None);
    driver.reset_calls();

    fb.activate();
    fb.activate();

    assert!(fb.is_active());
    assert_eq!(ctx.active_framebuffer(), Some(fb.handle()));
    assert_eq!(driver.call_count("bind_framebuffer"), 1);
    assert_eq!(driver.bound_framebuffer(), Some(fb.handle()));
    assert_eq!(driver.viewport(), [0, 0, 16, 16]);
    assert_eq!(driver.draw_buffers(), vec![glow::COLOR_ATTACHMENT0]);
}

#[test]
fn clear_keeps_the_active_target() {
    let (ctx, driver) = bare_context();
    let f = framebuffer(&ctx, &[rgba_texture(&ctx, 8, 8)], None);
    let depth = depth_texture(&ctx, 8, 8);
    let g = framebuffer(&ctx, &[rgba_texture(&ctx, 8, 8)], Some(&depth));
    g.activate();

    f.clear([255u8, 0, 0], 1.0);

    assert_eq!(ctx.active_framebuffer(), Some(g.handle()));
    assert_eq!(driver.bound_framebuffer(), Some(g.handle()));

    let clear = driver.clears().pop().unwrap();
    assert_eq!(clear.framebuffer, Some(f.handle()));
    assert_eq!(clear.mask, glow::COLOR_BUFFER_BIT);
    assert_eq!(clear.color, [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn clear_includes_depth_when_attached() {
    let (ctx, driver) = bare_context();
    let depth = depth_texture(&ctx, 8, 8);
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 8, 8)], Some(&depth));
    fb.activate();
    driver.reset_calls();

    fb.clear([0.0f32, 0.0, 0.0, 0.0], 0.5);

    let clear = driver.clears().pop().unwrap();
    assert_eq!(clear.mask, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    assert_eq!(clear.depth, 0.5);
    // Already active: nothing to restore.
    assert_eq!(driver.call_count("bind_framebuffer"), 0);
}

#[test]
fn viewport_applies_when_active() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 32, 32)], None);

    fb.set_viewport((16, 16));
    assert_eq!(driver.viewport(), [0, 0, 800, 600]);

    fb.activate();
    assert_eq!(driver.viewport(), [0, 0, 16, 16]);

    fb.set_viewport((4, 4, 8, 8));
    assert_eq!(driver.viewport(), [4, 4, 8, 8]);

    ctx.activate_screen();
    assert_eq!(driver.bound_framebuffer(), None);
    assert_eq!(driver.viewport(), [0, 0, 800, 600]);
}

#[test]
fn depth_mask_applies_when_active() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 4, 4)], None);

    fb.set_depth_mask(false);
    assert!(driver.depth_mask());

    fb.activate();
    assert!(!driver.depth_mask());

    fb.set_depth_mask(true);
    assert!(fb.depth_mask());
    assert!(driver.depth_mask());
}

#[test]
fn dropping_the_active_framebuffer_is_safe() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 4, 4)], None);
    fb.activate();
    let handle = fb.handle();
    drop(fb);

    // The context still tracks it, so the framebuffer stays alive.
    assert_eq!(ctx.active_framebuffer(), Some(handle));
    assert_eq!(driver.live_framebuffers(), 1);

    ctx.activate_screen();
    assert_eq!(ctx.active_framebuffer(), None);
    assert_eq!(driver.live_framebuffers(), 0);
}

#[test]
fn clearing_from_the_window_restores_its_depth_mask() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 8, 8)], None);
    assert!(driver.depth_mask());

    fb.set_depth_mask(false);
    fb.clear([0u8, 0, 0, 255], 1.0);

    assert_eq!(ctx.active_framebuffer(), None);
    assert!(driver.depth_mask());
    assert_eq!(driver.viewport(), [0, 0, 800, 600]);
}

#[test]
fn window_depth_mask_survives_target_switches() {
    let (ctx, driver) = bare_context();
    let fb = framebuffer(&ctx, &[rgba_texture(&ctx, 8, 8)], None);

    ctx.set_screen_depth_mask(false);
    assert!(!ctx.screen_depth_mask());
    assert!(!driver.depth_mask());

    fb.activate();
    assert!(driver.depth_mask());

    ctx.activate_screen();
    assert!(!driver.depth_mask());
}
