mod common;

use common::*;
use gloam::*;

#[test]
fn vertex_count_follows_the_largest_buffer() {
    let (ctx, _) = bare_context();
    let program = colored_program(&ctx);
    let positions = reserved_buffer(&ctx, 120);
    let colors = reserved_buffer(&ctx, 16 * 4);

    let vao = ctx
        .vertex_array(
            &program,
            vec![
                BufferDescription::new(positions, "3f", &["in_vert"], &[], false).unwrap(),
                BufferDescription::new(colors, "4B", &["in_color"], &["in_color"], false)
                    .unwrap(),
            ],
            None,
        )
        .unwrap();

    assert_eq!(vao.num_vertices(), 16);
    assert_eq!(vao.content().len(), 2);
}

#[test]
fn stride_of_twelve_over_120_bytes_is_ten_vertices() {
    let (ctx, _) = bare_context();
    let program = colored_program(&ctx);
    let vbo = reserved_buffer(&ctx, 120);

    let description = BufferDescription::new(vbo, "3f", &["in_vert"], &[], false).unwrap();
    assert_eq!(description.stride(), 12);

    let vao = ctx.vertex_array(&program, vec![description], None).unwrap();
    assert_eq!(vao.num_vertices(), 10);
}

#[test]
fn interleaved_layout_registers_every_pointer() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vbo = reserved_buffer(&ctx, 16 * 3);

    let vao = ctx
        .vertex_array(
            &program,
            vec![BufferDescription::new(
                vbo.clone(),
                "3f 4B",
                &["in_vert", "in_color"],
                &["in_color"],
                false,
            )
            .unwrap()],
            None,
        )
        .unwrap();
    assert_eq!(vao.num_vertices(), 3);

    let vert = driver.attribute_location(program.handle(), "in_vert").unwrap();
    let color = driver.attribute_location(program.handle(), "in_color").unwrap();
    let pointers = driver.vertex_attributes(vao.handle());
    assert_eq!(pointers.len(), 2);

    let (_, vert_ptr) = pointers.iter().find(|(loc, _)| *loc == vert).unwrap();
    assert_eq!(vert_ptr.buffer, Some(vbo.handle()));
    assert_eq!((vert_ptr.size, vert_ptr.data_type), (3, glow::FLOAT));
    assert_eq!((vert_ptr.stride, vert_ptr.offset), (16, 0));
    assert!(!vert_ptr.normalized);
    assert!(vert_ptr.enabled);

    let (_, color_ptr) = pointers.iter().find(|(loc, _)| *loc == color).unwrap();
    assert_eq!((color_ptr.size, color_ptr.data_type), (4, glow::UNSIGNED_BYTE));
    assert_eq!((color_ptr.stride, color_ptr.offset), (16, 12));
    assert!(color_ptr.normalized);
    assert_eq!(color_ptr.divisor, 0);
}

#[test]
fn instanced_attributes_advance_per_instance() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vertices = reserved_buffer(&ctx, 12 * 4);
    let offsets = reserved_buffer(&ctx, 8 * 100);

    let vao = ctx
        .vertex_array(
            &program,
            vec![
                BufferDescription::new(vertices, "3f", &["in_vert"], &[], false).unwrap(),
                BufferDescription::new(offsets, "2f", &["in_offset"], &[], true).unwrap(),
            ],
            None,
        )
        .unwrap();

    // Per-instance buffers never contribute to the vertex count.
    assert_eq!(vao.num_vertices(), 4);

    let offset = driver.attribute_location(program.handle(), "in_offset").unwrap();
    let pointers = driver.vertex_attributes(vao.handle());
    let (_, ptr) = pointers.iter().find(|(loc, _)| *loc == offset).unwrap();
    assert_eq!(ptr.divisor, 1);
}

#[test]
fn per_instance_description_cannot_come_first() {
    let (ctx, _) = bare_context();
    let program = colored_program(&ctx);
    let vertices = reserved_buffer(&ctx, 48);
    let offsets = reserved_buffer(&ctx, 80);

    let result = ctx.vertex_array(
        &program,
        vec![
            BufferDescription::new(offsets, "2f", &["in_offset"], &[], true).unwrap(),
            BufferDescription::new(vertices, "3f", &["in_vert"], &[], false).unwrap(),
        ],
        None,
    );
    assert!(matches!(result, Err(GPUError::PerInstanceFirst)));
}

#[test]
fn unknown_attributes_are_reported() {
    let (ctx, _) = bare_context();
    let program = colored_program(&ctx);
    let vbo = reserved_buffer(&ctx, 48);

    let result = ctx.vertex_array(
        &program,
        vec![BufferDescription::new(vbo, "3f", &["in_normal"], &[], false).unwrap()],
        None,
    );
    match result {
        Err(GPUError::AttributeNotFound(name)) => assert_eq!(name, "in_normal"),
        other => panic!("expected AttributeNotFound, got {other:?}"),
    }
}

#[test]
fn description_validation() {
    let (ctx, _) = bare_context();
    let vbo = reserved_buffer(&ctx, 48);

    match BufferDescription::new(vbo.clone(), "3f", &["in_vert"], &["in_color"], false) {
        Err(GPUError::NormalizedNotInAttributes(name)) => assert_eq!(name, "in_color"),
        other => panic!("expected NormalizedNotInAttributes, got {other:?}"),
    }
    assert!(matches!(
        BufferDescription::new(vbo.clone(), "3f 4B", &["in_vert"], &[], false),
        Err(GPUError::FormatCountMismatch {
            formats: 2,
            attributes: 1
        })
    ));
    assert!(matches!(
        BufferDescription::new(vbo.clone(), "", &[], &[], false),
        Err(GPUError::EmptyBufferDescription)
    ));
    assert!(matches!(
        BufferDescription::new(vbo, "3x", &["in_vert"], &[], false),
        Err(GPUError::InvalidAttributeFormat(_))
    ));
}

#[test]
fn render_draws_every_vertex() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vbo = buffer_from_floats(&ctx, &[0.0; 9]);

    let vao = ctx
        .vertex_array(
            &program,
            vec![BufferDescription::new(vbo, "3f", &["in_vert"], &[], false).unwrap()],
            None,
        )
        .unwrap();
    vao.render(PrimitiveMode::Triangles, 2);

    let draws = driver.draw_calls();
    assert_eq!(draws.len(), 1);
    let draw = &draws[0];
    assert_eq!(draw.mode, glow::TRIANGLES);
    assert_eq!((draw.first, draw.count, draw.instances), (0, 3, 2));
    assert_eq!(draw.element_type, None);
    assert_eq!(draw.vertex_array, Some(vao.handle()));
    assert_eq!(draw.program, Some(program.handle()));
    assert_eq!(draw.framebuffer, None);
    assert!(program.is_active());
}

#[test]
fn indexed_render_reads_u32_indices() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vbo = buffer_from_floats(&ctx, &[0.0; 12]);
    let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];
    let ibo = ctx
        .buffer(&BufferInfo {
            data: Some(bytemuck::cast_slice(&indices)),
            ..Default::default()
        })
        .unwrap();

    let vao = ctx
        .vertex_array(
            &program,
            vec![BufferDescription::new(vbo, "3f", &["in_vert"], &[], false).unwrap()],
            Some(ibo.clone()),
        )
        .unwrap();
    assert_eq!(driver.element_buffer(vao.handle()), Some(ibo.handle()));

    vao.render(PrimitiveMode::Triangles, 1);
    let draw = driver.draw_calls().pop().unwrap();
    assert_eq!(draw.count, 6);
    assert_eq!(draw.element_type, Some(glow::UNSIGNED_INT));
}

#[test]
fn vertex_arrays_are_deleted_on_drop() {
    let (ctx, driver) = bare_context();
    let program = colored_program(&ctx);
    let vbo = reserved_buffer(&ctx, 12);

    let vao = ctx
        .vertex_array(
            &program,
            vec![BufferDescription::new(vbo, "3f", &["in_vert"], &[], false).unwrap()],
            None,
        )
        .unwrap();
    assert_eq!(driver.live_vertex_arrays(), 1);
    drop(vao);
    assert_eq!(driver.live_vertex_arrays(), 0);
}
