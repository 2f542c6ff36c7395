/// Scene pass: per-object meshes, lit (standard) or unlit (basic), with an
/// optional color map. Writes linear color into the HDR target.
pub const SCENE_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    // xyz: direction towards the light, w: intensity
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
    // x: lit, y: textured
    flags: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> object: ObjectUniforms;

@group(2) @binding(0)
var color_map: texture_2d<f32>;
@group(2) @binding(1)
var color_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = object.model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (object.model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var base = object.color.rgb;
    if (object.flags.y > 0.5) {
        base = base * textureSample(color_map, color_sampler, in.uv).rgb;
    }
    if (object.flags.x < 0.5) {
        return vec4<f32>(base, 1.0);
    }
    // Double-sided materials light their back faces with the flipped normal.
    var normal = normalize(in.world_normal);
    if (!front) {
        normal = -normal;
    }
    let diffuse = max(dot(normal, normalize(frame.light_dir.xyz)), 0.0);
    let ambient = 0.05;
    let light = frame.light_color.rgb * frame.light_dir.w * diffuse + vec3<f32>(ambient);
    return vec4<f32>(base * light, 1.0);
}
"#;

/// Bloom chain: bright-pass extract, separable Gaussian blur, additive
/// composite onto the surface. All passes draw one fullscreen triangle.
pub const BLOOM_SHADER: &str = r#"
struct BloomParams {
    threshold: f32,
    strength: f32,
    radius: f32,
    _pad: f32,
    // blur direction in texels of the source
    direction: vec2<f32>,
    texel: vec2<f32>,
};

@group(0) @binding(0)
var source: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;
@group(0) @binding(2)
var<uniform> params: BloomParams;
@group(0) @binding(3)
var bloom: texture_2d<f32>;

struct FullscreenOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let x = f32((index << 1u) & 2u);
    let y = f32(index & 2u);
    var out: FullscreenOutput;
    out.position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_extract(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let c = textureSample(source, source_sampler, in.uv).rgb;
    let luma = dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
    let weight = max(luma - params.threshold, 0.0) / max(luma, 0.0001);
    return vec4<f32>(c * weight, 1.0);
}

@fragment
fn fs_blur(in: FullscreenOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let spread = 1.0 + params.radius * 4.0;
    let step = params.direction * params.texel * spread;
    var sum = textureSample(source, source_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = step * f32(i);
        sum = sum + textureSample(source, source_sampler, in.uv + offset).rgb * weights[i];
        sum = sum + textureSample(source, source_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(sum, 1.0);
}

@fragment
fn fs_composite(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(source, source_sampler, in.uv).rgb;
    let glow = textureSample(bloom, source_sampler, in.uv).rgb;
    return vec4<f32>(scene + glow * params.strength, 1.0);
}
"#;
