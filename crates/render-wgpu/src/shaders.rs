/// WGSL shader drawing the frame texture as a scaled quad.
///
/// The quad is generated from `vertex_index`; no vertex buffers are bound.
pub const BLIT_SHADER: &str = r#"
struct Uniforms {
    scale: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var frame_tex: texture_2d<f32>;

@group(0) @binding(2)
var frame_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
    );
    let corner = corners[index];

    var out: BlitOutput;
    out.clip_position = vec4<f32>(corner * uniforms.scale.xy, 0.0, 1.0);
    out.uv = vec2<f32>((corner.x + 1.0) * 0.5, (1.0 - corner.y) * 0.5);
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(frame_tex, frame_sampler, in.uv);
}
"#;

/// Vertices drawn per frame.
pub const BLIT_VERTEX_COUNT: u32 = 6;
