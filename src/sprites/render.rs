//! GPU pipeline for drawing a sprite set as point sprites.
//!
//! One renderer per sprite set: a shader program, one GL buffer per
//! attribute array sized to the full slot capacity at construction (no
//! mid-session reallocation), and the uploaded glyph texture. Per frame the
//! renderer re-uploads exactly the arrays whose dirty flag is set, then
//! draws the active slot range.

use crate::sprites::attributes::{AttributeArray, SpriteAttributes};
use crate::sprites::texture::GlyphImage;
use glow::HasContext;

const POINT_VERTEX: &str = r#"#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;
layout(location = 2) in float a_size;
layout(location = 3) in float a_date;

uniform vec2 u_viewport;
uniform float u_date_cutoff;

out vec4 v_color;

void main() {
    vec2 ndc = vec2(
        a_position.x / u_viewport.x * 2.0 - 1.0,
        1.0 - a_position.y / u_viewport.y * 2.0);
    gl_Position = vec4(ndc, 0.0, 1.0);
    // Events newer than the playback cutoff collapse to size 0.
    float shown = (u_date_cutoff <= 0.0 || a_date <= u_date_cutoff) ? 1.0 : 0.0;
    gl_PointSize = a_size * shown;
    v_color = a_color;
}
"#;

const POINT_FRAGMENT: &str = r#"#version 330 core
uniform sampler2D u_glyph;
uniform float u_opacity;

in vec4 v_color;
out vec4 frag_color;

void main() {
    vec4 glyph = texture(u_glyph, gl_PointCoord);
    float alpha = glyph.a * v_color.a * u_opacity;
    if (alpha < 0.05) discard;
    frag_color = vec4(glyph.rgb * v_color.rgb, alpha);
}
"#;

const ARROW_VERTEX: &str = r#"#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;
layout(location = 2) in float a_size;
layout(location = 3) in vec3 a_direction;

uniform vec2 u_viewport;

out vec4 v_color;
out vec2 v_rot;

void main() {
    vec2 ndc = vec2(
        a_position.x / u_viewport.x * 2.0 - 1.0,
        1.0 - a_position.y / u_viewport.y * 2.0);
    gl_Position = vec4(ndc, 0.0, 1.0);
    gl_PointSize = a_size;
    v_color = a_color;
    // Screen y grows downward, so north (+y velocity) points up.
    float angle = atan(-a_direction.y, a_direction.x);
    v_rot = vec2(cos(angle), sin(angle));
}
"#;

const ARROW_FRAGMENT: &str = r#"#version 330 core
uniform sampler2D u_glyph;
uniform float u_opacity;

in vec4 v_color;
in vec2 v_rot;
out vec4 frag_color;

void main() {
    vec2 centered = gl_PointCoord - 0.5;
    vec2 rotated = vec2(
        centered.x * v_rot.x + centered.y * v_rot.y,
        -centered.x * v_rot.y + centered.y * v_rot.x);
    vec4 glyph = texture(u_glyph, rotated + 0.5);
    float alpha = glyph.a * v_color.a * u_opacity;
    if (alpha < 0.05) discard;
    frag_color = vec4(glyph.rgb * v_color.rgb, alpha);
}
"#;

/// GL-side resources for one sprite set.
pub struct SpriteRenderer {
    program: glow::Program,
    vao: glow::VertexArray,
    texture: glow::Texture,
    position_buf: glow::Buffer,
    color_buf: glow::Buffer,
    size_buf: glow::Buffer,
    direction_buf: Option<glow::Buffer>,
    date_buf: Option<glow::Buffer>,
    viewport_loc: Option<glow::UniformLocation>,
    opacity_loc: Option<glow::UniformLocation>,
    date_cutoff_loc: Option<glow::UniformLocation>,
    opacity: f32,
    date_cutoff: Option<f32>,
}

impl SpriteRenderer {
    /// Compiles the pipeline and allocates capacity-sized GPU buffers.
    ///
    /// The shader variant follows the buffer layout: directional layouts
    /// get the arrow program, isotropic layouts the point program.
    pub fn new(
        gl: &glow::Context,
        attrs: &SpriteAttributes,
        glyph: &GlyphImage,
    ) -> Result<Self, String> {
        let directional = attrs.direction.is_some();
        let (vertex_src, fragment_src) = if directional {
            (ARROW_VERTEX, ARROW_FRAGMENT)
        } else {
            (POINT_VERTEX, POINT_FRAGMENT)
        };

        unsafe {
            let program = link_program(gl, vertex_src, fragment_src)?;

            let vao = gl
                .create_vertex_array()
                .map_err(|e| format!("Failed to create vertex array: {}", e))?;
            gl.bind_vertex_array(Some(vao));

            let capacity = attrs.capacity();
            let position_buf = create_attribute_buffer(gl, 0, capacity, attrs.position.stride())?;
            let color_buf = create_attribute_buffer(gl, 1, capacity, attrs.color.stride())?;
            let size_buf = create_attribute_buffer(gl, 2, capacity, attrs.size.stride())?;
            let direction_buf = match &attrs.direction {
                Some(direction) => Some(create_attribute_buffer(gl, 3, capacity, direction.stride())?),
                None => None,
            };
            let date_buf = match &attrs.date {
                Some(date) => Some(create_attribute_buffer(gl, 3, capacity, date.stride())?),
                None => None,
            };

            gl.bind_vertex_array(None);

            let texture = upload_glyph(gl, glyph)?;

            let viewport_loc = gl.get_uniform_location(program, "u_viewport");
            let opacity_loc = gl.get_uniform_location(program, "u_opacity");
            let date_cutoff_loc = gl.get_uniform_location(program, "u_date_cutoff");

            gl.use_program(Some(program));
            if let Some(glyph_loc) = gl.get_uniform_location(program, "u_glyph") {
                gl.uniform_1_i32(Some(&glyph_loc), 0);
            }
            gl.use_program(None);

            Ok(Self {
                program,
                vao,
                texture,
                position_buf,
                color_buf,
                size_buf,
                direction_buf,
                date_buf,
                viewport_loc,
                opacity_loc,
                date_cutoff_loc,
                opacity: 1.0,
                date_cutoff: None,
            })
        }
    }

    /// Global opacity multiplier applied in the fragment shader.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Playback cutoff in epoch seconds; isotropic sprites with a newer
    /// event date are hidden by the vertex shader. `None` shows everything.
    pub fn set_date_cutoff(&mut self, cutoff: Option<f32>) {
        self.date_cutoff = cutoff;
    }

    /// Re-uploads every attribute array whose dirty flag is set.
    pub fn upload(&self, gl: &glow::Context, attrs: &mut SpriteAttributes) {
        unsafe {
            upload_if_dirty(gl, self.position_buf, &mut attrs.position);
            upload_if_dirty(gl, self.color_buf, &mut attrs.color);
            upload_if_dirty(gl, self.size_buf, &mut attrs.size);
            if let (Some(buf), Some(direction)) = (self.direction_buf, attrs.direction.as_mut()) {
                upload_if_dirty(gl, buf, direction);
            }
            if let (Some(buf), Some(date)) = (self.date_buf, attrs.date.as_mut()) {
                upload_if_dirty(gl, buf, date);
            }
        }
    }

    /// Draws the first `active_len` slots as point sprites.
    pub fn draw(&self, gl: &glow::Context, active_len: usize, viewport: (f32, f32)) {
        if active_len == 0 {
            return;
        }
        unsafe {
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));

            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.enable(glow::PROGRAM_POINT_SIZE);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));

            gl.uniform_2_f32(self.viewport_loc.as_ref(), viewport.0, viewport.1);
            gl.uniform_1_f32(self.opacity_loc.as_ref(), self.opacity);
            gl.uniform_1_f32(
                self.date_cutoff_loc.as_ref(),
                self.date_cutoff.unwrap_or(0.0),
            );

            gl.draw_arrays(glow::POINTS, 0, active_len as i32);

            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }

    /// Releases all GPU resources.
    ///
    /// Takes the renderer by value so release happens exactly once; a
    /// second destroy is a compile error, not a runtime contract.
    pub fn destroy(self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vao);
            gl.delete_texture(self.texture);
            gl.delete_buffer(self.position_buf);
            gl.delete_buffer(self.color_buf);
            gl.delete_buffer(self.size_buf);
            if let Some(buf) = self.direction_buf {
                gl.delete_buffer(buf);
            }
            if let Some(buf) = self.date_buf {
                gl.delete_buffer(buf);
            }
        }
    }
}

unsafe fn link_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, String> {
    let program = gl
        .create_program()
        .map_err(|e| format!("Failed to create program: {}", e))?;

    let vertex = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let fragment = compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src)?;

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);

    gl.detach_shader(program, vertex);
    gl.detach_shader(program, fragment);
    gl.delete_shader(vertex);
    gl.delete_shader(fragment);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(format!("Failed to link sprite program: {}", log));
    }
    Ok(program)
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    source: &str,
) -> Result<glow::Shader, String> {
    let shader = gl
        .create_shader(kind)
        .map_err(|e| format!("Failed to create shader: {}", e))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(format!("Failed to compile shader: {}", log));
    }
    Ok(shader)
}

/// Allocates a capacity-sized GL buffer and binds it to a vertex attribute.
unsafe fn create_attribute_buffer(
    gl: &glow::Context,
    location: u32,
    capacity: usize,
    stride: usize,
) -> Result<glow::Buffer, String> {
    let buffer = gl
        .create_buffer()
        .map_err(|e| format!("Failed to create attribute buffer: {}", e))?;
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
    gl.buffer_data_size(
        glow::ARRAY_BUFFER,
        (capacity * stride * std::mem::size_of::<f32>()) as i32,
        glow::DYNAMIC_DRAW,
    );
    gl.vertex_attrib_pointer_f32(location, stride as i32, glow::FLOAT, false, 0, 0);
    gl.enable_vertex_attrib_array(location);
    Ok(buffer)
}

unsafe fn upload_if_dirty(gl: &glow::Context, buffer: glow::Buffer, array: &mut AttributeArray) {
    if !array.take_dirty() {
        return;
    }
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
    gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytemuck::cast_slice(array.data()));
}

fn upload_glyph(gl: &glow::Context, glyph: &GlyphImage) -> Result<glow::Texture, String> {
    unsafe {
        let texture = gl
            .create_texture()
            .map_err(|e| format!("Failed to create glyph texture: {}", e))?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            glyph.size() as i32,
            glyph.size() as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(glyph.pixels())),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }
}
