mod common;

use std::fs;
use std::path::Path;

use common::*;
use gloam::*;

#[test]
fn reports_version_and_limits() {
    let driver = NullDriver::new();
    driver.set_parameter(glow::MAX_TEXTURE_SIZE, 4096);
    let (ctx, _) = context_with(driver, &ContextInfo::default());

    assert_eq!(ctx.gl_version(), (3, 3));
    assert_eq!(ctx.limits().max_texture_size, 4096);
    assert_eq!(ctx.limits().max_color_attachments, 8);
    assert!(Limits::PARAMETERS
        .iter()
        .any(|(name, _)| *name == "max_vertex_uniform_blocks"));
}

#[test]
fn builtin_programs_are_introspected() {
    let (ctx, _) = context();
    let builtins = ctx.builtins().expect("builtins loaded by default");

    for program in [
        &builtins.line,
        &builtins.line_generic_with_colors,
        &builtins.shape_element_list,
        &builtins.sprite_list,
    ] {
        let projection = program.uniform("Projection").expect("Projection");
        assert_eq!(projection.uniform_type(), UniformType::FloatMat4);
    }

    assert!(builtins.shape_element_list.uniform("Position").is_some());
    assert!(builtins.shape_element_list.uniform("Angle").is_some());
    assert_eq!(
        builtins.sprite_list.uniform("Texture").map(|u| u.uniform_type()),
        Some(UniformType::Sampler2D)
    );
}

#[test]
fn builtins_can_be_skipped() {
    let (ctx, driver) = bare_context();
    assert!(ctx.builtins().is_none());
    assert_eq!(driver.live_programs(), 0);
}

#[test]
fn error_polls_the_driver() {
    let (ctx, driver) = bare_context();
    assert_eq!(ctx.error(), None);

    driver.push_error(glow::INVALID_ENUM);
    assert_eq!(ctx.error(), Some("GL_INVALID_ENUM"));
    assert_eq!(ctx.error(), None);
}

#[test]
fn screen_viewport_follows_window_size() {
    let (ctx, driver) = context_with(
        NullDriver::new(),
        &ContextInfo {
            window_size: [320, 240],
            load_builtin_programs: false,
        },
    );
    assert_eq!(ctx.screen_viewport(), Viewport::new(0, 0, 320, 240));

    ctx.set_screen_viewport((10, 20, 100, 50));
    assert_eq!(driver.viewport(), [10, 20, 100, 50]);
}

#[test]
fn lost_context_refuses_new_resources() {
    let (ctx, _) = bare_context();
    ctx.mark_lost();

    assert!(!ctx.is_alive());
    assert!(matches!(
        ctx.buffer(&BufferInfo {
            reserve: 4,
            ..Default::default()
        }),
        Err(GPUError::ContextLost)
    ));
    assert!(matches!(
        ctx.texture(&TextureInfo::default()),
        Err(GPUError::ContextLost)
    ));
}

#[test]
fn lost_context_issues_no_driver_calls() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vbo = buffer_from_floats(&ctx, &[0.0; 9]);
    let vao = ctx
        .vertex_array(
            &program,
            vec![BufferDescription::new(vbo.clone(), "3f", &["in_vert"], &[], false).unwrap()],
            None,
        )
        .unwrap();
    let texture = rgba_texture(&ctx, 4, 4);
    let fb = ctx
        .framebuffer(&FramebufferInfo {
            color_attachments: &[texture.clone()],
            ..Default::default()
        })
        .unwrap();

    ctx.mark_lost();
    driver.reset_calls();

    program.activate();
    assert!(!program.is_active());
    vao.render(PrimitiveMode::Triangles, 1);
    vao.transform(&vbo, PrimitiveMode::Points);
    fb.activate();
    fb.clear([0u8, 0, 0], 1.0);
    ctx.activate_screen();
    ctx.set_screen_viewport((0, 0, 10, 10));
    ctx.set_screen_depth_mask(false);

    assert!(matches!(vbo.read(None, 0), Err(GPUError::ContextLost)));
    assert!(matches!(vbo.write(&[0u8; 4][..], 0), Err(GPUError::ContextLost)));
    assert!(matches!(
        vbo.copy_from_buffer(&vbo, Some(4), 0, 0),
        Err(GPUError::ContextLost)
    ));
    vbo.orphan(Some(64));
    assert_eq!(vbo.size(), 64);

    assert!(matches!(
        texture.set_filter(Filter::Nearest, Filter::Nearest),
        Err(GPUError::ContextLost)
    ));
    assert!(matches!(
        texture.write(&[0u8; 64][..], 0, None),
        Err(GPUError::ContextLost)
    ));
    texture.set_wrap_x(WrapMode::ClampToEdge);
    texture.set_wrap_y(WrapMode::ClampToEdge);
    texture.build_mipmaps(0, 2);
    texture.bind(1);
    assert!(texture.read(0).is_empty());

    assert_eq!(driver.total_calls(), 0);
    assert!(driver.draw_calls().is_empty());
    assert!(driver.clears().is_empty());
}

#[test]
fn resources_outliving_the_context_skip_deletion() {
    let (ctx, driver) = context();
    let buffer = reserved_buffer(&ctx, 16);
    let texture = rgba_texture(&ctx, 4, 4);
    let programs = driver.live_programs();
    assert_eq!(programs, 4);

    drop(ctx);
    drop(buffer);
    drop(texture);

    assert_eq!(driver.call_count("delete_buffer"), 0);
    assert_eq!(driver.call_count("delete_texture"), 0);
    assert_eq!(driver.call_count("delete_program"), 0);
    assert_eq!(driver.live_buffers(), 1);
    assert_eq!(driver.live_programs(), programs);
}

#[test]
fn resources_are_deleted_on_drop() {
    let (ctx, driver) = bare_context();
    let buffer = reserved_buffer(&ctx, 16);
    let program = colored_program(&ctx);
    assert_eq!(driver.live_buffers(), 1);
    assert_eq!(driver.live_programs(), 1);

    drop(buffer);
    drop(program);

    assert_eq!(driver.live_buffers(), 0);
    assert_eq!(driver.live_programs(), 0);
    assert_eq!(driver.live_shaders(), 0);
}

#[test]
fn load_program_reads_every_stage() {
    let dir = std::env::temp_dir().join(format!("gloam-load-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let vs = dir.join("colored.vs");
    let fs_path = dir.join("colored.fs");
    fs::write(&vs, COLORED_VS).unwrap();
    fs::write(&fs_path, PASSTHROUGH_FS).unwrap();

    let (ctx, _) = bare_context();
    let program = ctx
        .load_program(&ProgramPaths {
            vertex_shader: &vs,
            fragment_shader: Some(fs_path.as_path()),
            ..Default::default()
        })
        .unwrap();
    assert!(program.uniform("Projection").is_some());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn load_program_reports_missing_files() {
    let (ctx, _) = bare_context();
    let missing = Path::new("/nonexistent/gloam/shader.vs");
    let err = ctx
        .load_program(&ProgramPaths {
            vertex_shader: missing,
            ..Default::default()
        })
        .unwrap_err();

    match err {
        GPUError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected an io error, got {other:?}"),
    }
}
