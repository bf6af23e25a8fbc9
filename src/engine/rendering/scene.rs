//! ### English
//! Textured-quad program and geometry, set up once per graphics context.
//!
//! ### 中文
//! 带纹理四边形的着色器程序与几何数据，每个图形上下文设置一次。

use glow::HasContext as _;
use tracing::{debug, error, warn};

use crate::engine::error::SceneError;

const VERTEX_SHADER_SOURCE: &str = r#"#version 300 es
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec2 aTexCoords;

out vec2 TexCoords;

void main()
{
    TexCoords = aTexCoords;
    gl_Position = vec4(aPos, 1.0);
}
"#;

const FRAGMENT_SHADER_SOURCE: &str = r#"#version 300 es
precision mediump float;

in vec2 TexCoords;
out vec4 FragColor;

uniform sampler2D Texture1;

void main()
{
    FragColor = texture(Texture1, TexCoords);
}
"#;

const FLOATS_PER_VERTEX: i32 = 5;

/// Position (xyz) + UV for each corner.
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 20] = [
     0.5,  0.5, 0.0,  1.0, 0.0, // top right
     0.5, -0.5, 0.0,  1.0, 1.0, // bottom right
    -0.5, -0.5, 0.0,  0.0, 1.0, // bottom left
    -0.5,  0.5, 0.0,  0.0, 0.0, // top left
];

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

const MAX_DRAINED_GL_ERRORS: usize = 16;

/// ### English
/// GL objects for the single textured quad.
///
/// The program and vertex array stay bound after `new`; `draw_frame` never rebinds them.
///
/// ### 中文
/// 单个带纹理四边形的 GL 对象。
///
/// `new` 之后着色器程序与 VAO 保持绑定；`draw_frame` 不会重新绑定它们。
pub struct SceneRenderer {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: glow::Buffer,
}

impl SceneRenderer {
    /// ### English
    /// Compiles and links the pass-through program, uploads the quad and leaves program + VAO
    /// bound. On compile/link failure the driver log is logged and nothing stays bound.
    ///
    /// Must run with the owning context current.
    ///
    /// ### 中文
    /// 编译并链接直通着色器程序，上传四边形数据，并保持程序与 VAO 绑定。
    /// 编译/链接失败时记录驱动日志，且不保留任何绑定。
    ///
    /// 调用时所属上下文必须为 current。
    pub fn new(gl: &glow::Context) -> Result<Self, SceneError> {
        let program = unsafe { link_program(gl) }.inspect_err(|err| {
            error!(%err, "scene setup aborted");
        })?;

        unsafe {
            let vertex_array = gl.create_vertex_array();
            let vertex_buffer = gl.create_buffer();
            let index_buffer = gl.create_buffer();
            let (vertex_array, vertex_buffer, index_buffer) =
                match (vertex_array, vertex_buffer, index_buffer) {
                    (Ok(vao), Ok(vbo), Ok(ebo)) => (vao, vbo, ebo),
                    (vao, vbo, ebo) => {
                        let reason = [vao.as_ref().err(), vbo.as_ref().err(), ebo.as_ref().err()]
                            .into_iter()
                            .flatten()
                            .next()
                            .cloned()
                            .unwrap_or_default();
                        if let Ok(vao) = vao {
                            gl.delete_vertex_array(vao);
                        }
                        for buffer in [vbo, ebo].into_iter().flatten() {
                            gl.delete_buffer(buffer);
                        }
                        gl.delete_program(program);
                        return Err(SceneError::Create {
                            kind: "vertex storage",
                            reason,
                        });
                    }
                };

            gl.bind_vertex_array(Some(vertex_array));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW,
            );

            let stride = FLOATS_PER_VERTEX * size_of::<f32>() as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                2,
                glow::FLOAT,
                false,
                stride,
                3 * size_of::<f32>() as i32,
            );
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            // Bound for every later frame.
            gl.use_program(Some(program));
            gl.bind_vertex_array(Some(vertex_array));
            gl.clear_color(CLEAR_COLOR[0], CLEAR_COLOR[1], CLEAR_COLOR[2], CLEAR_COLOR[3]);

            if let Some(code) = take_gl_error(gl) {
                warn!(code = %format_args!("{code:#06x}"), "GL error after scene setup");
            }
            debug!("scene ready");

            Ok(Self {
                program,
                vertex_array,
                vertex_buffer,
                index_buffer,
            })
        }
    }

    /// ### English
    /// Clears, samples `texture` on unit 0 and draws the two quad triangles.
    ///
    /// Returns the first pending GL error code, if any; errors never abort rendering.
    ///
    /// ### 中文
    /// 清屏，在纹理单元 0 上采样 `texture`，并绘制四边形的两个三角形。
    ///
    /// 返回首个待处理的 GL 错误码（若有）；错误不会中断渲染。
    pub fn draw_frame(&self, gl: &glow::Context, texture: Option<glow::Texture>) -> Option<u32> {
        unsafe {
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, texture);
            gl.draw_elements(
                glow::TRIANGLES,
                QUAD_INDICES.len() as i32,
                glow::UNSIGNED_INT,
                0,
            );
            // The window config has no depth buffer, so this leaves the frame untouched.
            gl.clear(glow::DEPTH_BUFFER_BIT);
            take_gl_error(gl)
        }
    }

    /// ### English
    /// Deletes the GL objects. Must run while the owning context is still current.
    ///
    /// ### 中文
    /// 删除 GL 对象；必须在所属上下文仍为 current 时调用。
    pub fn delete(self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(None);
            gl.use_program(None);
            gl.delete_buffer(self.vertex_buffer);
            gl.delete_buffer(self.index_buffer);
            gl.delete_vertex_array(self.vertex_array);
            gl.delete_program(self.program);
        }
    }
}

/// ### English
/// Returns the first pending GL error and drains the rest.
///
/// ### 中文
/// 返回首个待处理的 GL 错误，并清空其余错误。
pub(crate) fn take_gl_error(gl: &glow::Context) -> Option<u32> {
    let first = unsafe { gl.get_error() };
    if first == glow::NO_ERROR {
        return None;
    }
    // A lost context can report errors forever, so drain a bounded number.
    for _ in 0..MAX_DRAINED_GL_ERRORS {
        if unsafe { gl.get_error() } == glow::NO_ERROR {
            break;
        }
    }
    Some(first)
}

unsafe fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, SceneError> {
    unsafe {
        let shader = gl
            .create_shader(shader_type)
            .map_err(|reason| SceneError::Create {
                kind: "shader",
                reason,
            })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(SceneError::Compile { stage, log });
        }
        Ok(shader)
    }
}

unsafe fn link_program(gl: &glow::Context) -> Result<glow::Program, SceneError> {
    unsafe {
        let vertex = compile_shader(gl, glow::VERTEX_SHADER, "vertex", VERTEX_SHADER_SOURCE)?;
        let fragment = match compile_shader(
            gl,
            glow::FRAGMENT_SHADER,
            "fragment",
            FRAGMENT_SHADER_SOURCE,
        ) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(SceneError::Create {
                    kind: "program",
                    reason,
                });
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);

        let linked = gl.get_program_link_status(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        if !linked {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(SceneError::Link { log });
        }
        Ok(program)
    }
}
