mod common;

use std::rc::Rc;

use common::*;
use gloam::*;

const UNIFORMS_VS: &str = "#version 330
uniform float u_float;
uniform int u_int;
uniform vec2 u_vec2;
uniform vec3 u_vec3;
uniform vec4 u_vec4;
uniform ivec2 u_ivec2;
uniform ivec3 u_ivec3;
uniform ivec4 u_ivec4;
uniform mat2 u_mat2;
uniform mat3 u_mat3;
uniform mat4 u_mat4;
uniform float u_weights[3];
uniform vec2 u_offsets[2];

in vec2 in_pos;
out vec4 v_color;

void main() {
    gl_Position = vec4(in_pos, 0.0, 1.0);
    v_color = vec4(u_float);
}
";

const SAMPLER_FS: &str = "#version 330
uniform sampler2D u_texture;
in vec4 v_color;
out vec4 f_color;

void main() {
    f_color = texture(u_texture, v_color.xy);
}
";

fn uniforms_program(ctx: &Context) -> Rc<Program> {
    ctx.program(&ProgramInfo {
        vertex_shader: UNIFORMS_VS,
        fragment_shader: Some(SAMPLER_FS),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn scalars_and_vectors_round_trip() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    program.set("u_float", 0.5f32).unwrap();
    program.set("u_int", -3).unwrap();
    program.set("u_vec2", [1.0f32, 2.0]).unwrap();
    program.set("u_vec3", [1.0f32, 2.0, 3.0]).unwrap();
    program.set("u_vec4", [1.0f32, 2.0, 3.0, 4.0]).unwrap();
    program.set("u_ivec2", [1, 2]).unwrap();
    program.set("u_ivec3", [1, 2, 3]).unwrap();
    program.set("u_ivec4", [1, 2, 3, 4]).unwrap();

    assert_eq!(program.get("u_float").unwrap(), UniformValue::Float(0.5));
    assert_eq!(program.get("u_int").unwrap(), UniformValue::Int(-3));
    assert_eq!(program.get("u_vec2").unwrap(), UniformValue::Vec2([1.0, 2.0]));
    assert_eq!(
        program.get("u_vec3").unwrap(),
        UniformValue::Vec3([1.0, 2.0, 3.0])
    );
    assert_eq!(
        program.get("u_vec4").unwrap(),
        UniformValue::Vec4([1.0, 2.0, 3.0, 4.0])
    );
    assert_eq!(program.get("u_ivec2").unwrap(), UniformValue::IVec2([1, 2]));
    assert_eq!(program.get("u_ivec3").unwrap(), UniformValue::IVec3([1, 2, 3]));
    assert_eq!(
        program.get("u_ivec4").unwrap(),
        UniformValue::IVec4([1, 2, 3, 4])
    );
}

#[test]
fn matrices_round_trip_column_major() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    let mat3: [f32; 9] = std::array::from_fn(|i| i as f32);
    let mat4 = glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)).to_cols_array();

    program.set("u_mat2", UniformValue::Mat2([1.0, 2.0, 3.0, 4.0])).unwrap();
    program.set("u_mat3", mat3).unwrap();
    program.set("u_mat4", mat4).unwrap();

    assert_eq!(
        program.get("u_mat2").unwrap(),
        UniformValue::Mat2([1.0, 2.0, 3.0, 4.0])
    );
    assert_eq!(program.get("u_mat3").unwrap(), UniformValue::Mat3(mat3));
    assert_eq!(program.get("u_mat4").unwrap(), UniformValue::Mat4(mat4));
}

#[test]
fn four_floats_fill_a_mat2() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    program.set("u_mat2", [1.0f32, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(
        program.get("u_mat2").unwrap(),
        UniformValue::Mat2([1.0, 0.0, 0.0, 1.0])
    );
}

#[test]
fn arrays_are_flat() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    let weights = program.uniform("u_weights").expect("array name without [0]");
    assert_eq!(weights.array_length(), 3);
    assert_eq!(weights.storage_len(), 3);

    program.set("u_weights", vec![0.25f32, 0.5, 0.25]).unwrap();
    program.set("u_offsets", vec![1.0f32, -1.0, 2.0, -2.0]).unwrap();

    assert_eq!(
        program.get("u_weights").unwrap(),
        UniformValue::FloatArray(vec![0.25, 0.5, 0.25])
    );
    assert_eq!(
        program.get("u_offsets").unwrap(),
        UniformValue::FloatArray(vec![1.0, -1.0, 2.0, -2.0])
    );
}

#[test]
fn samplers_take_a_texture_unit() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    let sampler = program.uniform("u_texture").unwrap();
    assert_eq!(sampler.uniform_type(), UniformType::Sampler2D);
    assert_eq!(sampler.gl_type(), glow::SAMPLER_2D);

    program.set("u_texture", 2).unwrap();
    assert_eq!(program.get("u_texture").unwrap(), UniformValue::Int(2));
}

#[test]
fn mismatched_values_are_rejected() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    assert!(matches!(
        program.set("u_vec3", [1.0f32, 2.0]),
        Err(GPUError::UniformValueMismatch {
            expected: 3,
            got: 2,
            ..
        })
    ));
    assert!(matches!(
        program.set("u_int", 1.0f32),
        Err(GPUError::UniformValueMismatch { kind: "int", .. })
    ));
    assert!(matches!(
        program.set("u_weights", vec![1.0f32]),
        Err(GPUError::UniformValueMismatch { expected: 3, .. })
    ));
}

#[test]
fn unknown_names_are_reported() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);

    match program.get("u_missing") {
        Err(GPUError::UniformNotFound(name)) => assert_eq!(name, "u_missing"),
        other => panic!("expected UniformNotFound, got {other:?}"),
    }
    assert!(matches!(
        program.set("u_missing", 1.0f32),
        Err(GPUError::UniformNotFound(_))
    ));
}

#[test]
fn setters_activate_the_program_once() {
    let (ctx, driver) = bare_context();
    let program = uniforms_program(&ctx);
    driver.reset_calls();

    program.set("u_float", 1.0f32).unwrap();
    program.set("u_vec2", [1.0f32, 1.0]).unwrap();
    program.activate();

    assert!(program.is_active());
    assert_eq!(ctx.active_program(), Some(program.handle()));
    assert_eq!(driver.call_count("use_program"), 1);
    assert_eq!(driver.call_count("uniform_f32_slice"), 2);
}

#[test]
fn matrices_use_the_matrix_entry_point() {
    let (ctx, driver) = bare_context();
    let program = uniforms_program(&ctx);
    driver.reset_calls();

    program.set("u_mat4", glam::Mat4::IDENTITY.to_cols_array()).unwrap();
    assert_eq!(driver.call_count("uniform_matrix_f32_slice"), 1);
    assert_eq!(driver.call_count("uniform_f32_slice"), 0);
}

#[test]
fn unsupported_uniform_types_fail_program_creation() {
    let (ctx, driver) = bare_context();
    let vs = "#version 330
uniform bool u_flag;
in vec2 in_pos;
out vec4 v_color;
void main() {
    gl_Position = vec4(in_pos, 0.0, 1.0);
    v_color = vec4(1.0);
}
";
    let err = ctx
        .program(&ProgramInfo {
            vertex_shader: vs,
            fragment_shader: Some(PASSTHROUGH_FS),
            ..Default::default()
        })
        .unwrap_err();

    match err {
        GPUError::UnsupportedUniformType { name, gl_type } => {
            assert_eq!(name, "u_flag");
            assert_eq!(gl_type, glow::BOOL);
        }
        other => panic!("expected UnsupportedUniformType, got {other:?}"),
    }
    assert_eq!(driver.live_programs(), 0);
}

#[test]
fn block_members_are_skipped() {
    let (ctx, _) = bare_context();
    let vs = "#version 330
layout(std140) uniform Globals {
    mat4 view;
    vec4 tint;
};
uniform float u_scale;
in vec2 in_pos;
out vec4 v_color;
void main() {
    gl_Position = view * vec4(in_pos * u_scale, 0.0, 1.0);
    v_color = tint;
}
";
    let program = ctx
        .program(&ProgramInfo {
            vertex_shader: vs,
            fragment_shader: Some(PASSTHROUGH_FS),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(program.skipped_uniforms(), ["view", "tint"]);
    assert_eq!(program.uniforms().count(), 1);
    assert!(program.uniform("u_scale").is_some());
}

#[test]
fn accessors_fail_once_the_context_is_lost() {
    let (ctx, _) = bare_context();
    let program = uniforms_program(&ctx);
    ctx.mark_lost();

    assert!(matches!(program.get("u_float"), Err(GPUError::ContextLost)));
    assert!(matches!(
        program.set("u_float", 1.0f32),
        Err(GPUError::ContextLost)
    ));
}
