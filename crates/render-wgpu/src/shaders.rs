use lumen_common::SurfaceConfig;
use lumen_render::{ProgramSources, ShaderSource};

/// Entry point names shared by every stage source.
pub const COMPUTE_ENTRY: &str = "main";
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const TILE_WIDTH_TOKEN: &str = "{{TILE_WIDTH}}";
const TILE_HEIGHT_TOKEN: &str = "{{TILE_HEIGHT}}";

/// Progressive path tracer over a small signed-distance scene.
///
/// Each dispatch traces one jittered sample per pixel and folds it into the
/// output image with weight `1 / sample_count`.
pub const ACCUMULATE_SHADER: &str = r#"
struct Camera {
    position: vec3<f32>,
    sample_count: f32,
    ray00: vec3<f32>,
    ray01: vec3<f32>,
    ray10: vec3<f32>,
    ray11: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(0) @binding(1)
var output_image: texture_storage_2d<rgba32float, read_write>;

const MAX_STEPS: i32 = 128;
const MAX_DISTANCE: f32 = 60.0;
const HIT_EPSILON: f32 = 0.001;
const BOUNCES: i32 = 3;
const PI: f32 = 3.14159265;

var<private> rng_state: u32;

fn pcg_next() -> u32 {
    rng_state = rng_state * 747796405u + 2891336453u;
    let word = ((rng_state >> ((rng_state >> 28u) + 4u)) ^ rng_state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn random() -> f32 {
    return f32(pcg_next()) / 4294967295.0;
}

fn sd_sphere(p: vec3<f32>, center: vec3<f32>, radius: f32) -> f32 {
    return length(p - center) - radius;
}

// x: distance, y: material id
fn scene_sdf(p: vec3<f32>) -> vec2<f32> {
    var best = vec2<f32>(p.y + 1.0, 0.0);
    let a = sd_sphere(p, vec3<f32>(0.0, 0.0, 0.0), 1.0);
    if (a < best.x) { best = vec2<f32>(a, 1.0); }
    let b = sd_sphere(p, vec3<f32>(-1.8, -0.4, 0.6), 0.6);
    if (b < best.x) { best = vec2<f32>(b, 2.0); }
    let c = sd_sphere(p, vec3<f32>(1.7, -0.5, -0.4), 0.5);
    if (c < best.x) { best = vec2<f32>(c, 3.0); }
    return best;
}

fn scene_normal(p: vec3<f32>) -> vec3<f32> {
    let e = vec2<f32>(HIT_EPSILON, 0.0);
    return normalize(vec3<f32>(
        scene_sdf(p + e.xyy).x - scene_sdf(p - e.xyy).x,
        scene_sdf(p + e.yxy).x - scene_sdf(p - e.yxy).x,
        scene_sdf(p + e.yyx).x - scene_sdf(p - e.yyx).x,
    ));
}

fn albedo(material: f32, p: vec3<f32>) -> vec3<f32> {
    if (material < 0.5) {
        let checker = (i32(floor(p.x)) + i32(floor(p.z))) & 1;
        return select(vec3<f32>(0.8), vec3<f32>(0.35), checker == 1);
    }
    if (material < 1.5) { return vec3<f32>(0.9, 0.3, 0.2); }
    if (material < 2.5) { return vec3<f32>(0.2, 0.6, 0.9); }
    return vec3<f32>(0.9, 0.85, 0.3);
}

fn sky(dir: vec3<f32>) -> vec3<f32> {
    let t = 0.5 * (dir.y + 1.0);
    return mix(vec3<f32>(1.0), vec3<f32>(0.5, 0.7, 1.0), t);
}

// x: distance travelled, y: material id, negative when nothing was hit
fn march(origin: vec3<f32>, dir: vec3<f32>) -> vec2<f32> {
    var t = 0.0;
    for (var i = 0; i < MAX_STEPS; i = i + 1) {
        let hit = scene_sdf(origin + dir * t);
        if (hit.x < HIT_EPSILON) {
            return vec2<f32>(t, hit.y);
        }
        t = t + hit.x;
        if (t > MAX_DISTANCE) {
            break;
        }
    }
    return vec2<f32>(t, -1.0);
}

fn cosine_hemisphere(n: vec3<f32>) -> vec3<f32> {
    let r1 = 2.0 * PI * random();
    let r2 = random();
    let r = sqrt(r2);
    let tangent = normalize(select(vec3<f32>(1.0, 0.0, 0.0), vec3<f32>(0.0, 1.0, 0.0), abs(n.x) > 0.9));
    let u = normalize(cross(tangent, n));
    let v = cross(n, u);
    return normalize(u * cos(r1) * r + v * sin(r1) * r + n * sqrt(1.0 - r2));
}

fn trace(origin_in: vec3<f32>, dir_in: vec3<f32>) -> vec3<f32> {
    var origin = origin_in;
    var dir = dir_in;
    var throughput = vec3<f32>(1.0);
    for (var bounce = 0; bounce < BOUNCES; bounce = bounce + 1) {
        let hit = march(origin, dir);
        if (hit.y < 0.0) {
            return throughput * sky(dir);
        }
        let p = origin + dir * hit.x;
        let n = scene_normal(p);
        throughput = throughput * albedo(hit.y, p);
        origin = p + n * HIT_EPSILON * 4.0;
        dir = cosine_hemisphere(n);
    }
    return vec3<f32>(0.0);
}

@compute @workgroup_size({{TILE_WIDTH}}, {{TILE_HEIGHT}}, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let size = textureDimensions(output_image);
    if (gid.x >= size.x || gid.y >= size.y) {
        return;
    }
    let coord = vec2<i32>(gid.xy);
    rng_state = gid.x * 1973u + gid.y * 9277u + u32(camera.sample_count) * 26699u;

    let u = (f32(gid.x) + random()) / f32(size.x);
    // row 0 is the top of the image, which is the +Y edge of the frustum
    let v = 1.0 - (f32(gid.y) + random()) / f32(size.y);
    let dir = normalize(mix(mix(camera.ray00, camera.ray10, u), mix(camera.ray01, camera.ray11, u), v));

    let radiance = trace(camera.position, dir);
    let previous = textureLoad(output_image, coord).rgb;
    let blended = mix(previous, radiance, 1.0 / max(camera.sample_count, 1.0));
    textureStore(output_image, coord, vec4<f32>(blended, 1.0));
}
"#;

/// Debug kernel that stores the sample counter into every pixel, making the
/// presented image a direct readout of which frame's stores it shows.
pub const COUNTER_FILL_SHADER: &str = r#"
struct Camera {
    position: vec3<f32>,
    sample_count: f32,
    ray00: vec3<f32>,
    ray01: vec3<f32>,
    ray10: vec3<f32>,
    ray11: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(0) @binding(1)
var output_image: texture_storage_2d<rgba32float, read_write>;

@compute @workgroup_size({{TILE_WIDTH}}, {{TILE_HEIGHT}}, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let size = textureDimensions(output_image);
    if (gid.x >= size.x || gid.y >= size.y) {
        return;
    }
    // 1, 2, 3... cycles through a visible grey ramp
    let level = f32(u32(camera.sample_count) % 16u) / 15.0;
    textureStore(output_image, vec2<i32>(gid.xy), vec4<f32>(vec3<f32>(level), camera.sample_count));
}
"#;

/// Full-screen quad vertex stage.
pub const QUAD_VERTEX_SHADER: &str = r#"
struct QuadOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> QuadOutput {
    var out: QuadOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.uv = vec2<f32>(position.x * 0.5 + 0.5, 0.5 - position.y * 0.5);
    return out;
}
"#;

/// Samples the accumulated image onto the quad.
pub const QUAD_FRAGMENT_SHADER: &str = r#"
@group(0) @binding(0)
var tex: texture_2d<f32>;

@group(0) @binding(1)
var tex_sampler: sampler;

struct QuadOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@fragment
fn fs_main(in: QuadOutput) -> @location(0) vec4<f32> {
    let color = textureSample(tex, tex_sampler, in.uv);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

/// Embedded sources, optionally with the counter-fill debug kernel.
pub fn embedded_sources(counter_fill: bool) -> ProgramSources {
    let compute = if counter_fill {
        ShaderSource::Embedded {
            label: "counter_fill",
            code: COUNTER_FILL_SHADER,
        }
    } else {
        ShaderSource::Embedded {
            label: "accumulate",
            code: ACCUMULATE_SHADER,
        }
    };
    ProgramSources {
        compute,
        vertex: ShaderSource::Embedded {
            label: "quad_vs",
            code: QUAD_VERTEX_SHADER,
        },
        fragment: ShaderSource::Embedded {
            label: "quad_fs",
            code: QUAD_FRAGMENT_SHADER,
        },
    }
}

/// Substitute the workgroup size tokens with the configured tile size.
pub fn specialize_compute(code: &str, surface: &SurfaceConfig) -> String {
    code.replace(TILE_WIDTH_TOKEN, &surface.tile_width().to_string())
        .replace(TILE_HEIGHT_TOKEN, &surface.tile_height().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_size_follows_tile() {
        let surface = SurfaceConfig::new(64, 64, 8, 4).unwrap();
        let code = specialize_compute(ACCUMULATE_SHADER, &surface);
        assert!(code.contains("@workgroup_size(8, 4, 1)"));
        assert!(!code.contains("{{"));
    }

    #[test]
    fn kernels_share_uniform_layout() {
        for code in [ACCUMULATE_SHADER, COUNTER_FILL_SHADER] {
            assert!(code.contains("sample_count: f32"));
            assert!(code.contains("texture_storage_2d<rgba32float, read_write>"));
            assert!(code.contains(&format!("fn {COMPUTE_ENTRY}(")));
        }
    }

    #[test]
    fn debug_flag_picks_counter_kernel() {
        let sources = embedded_sources(true);
        assert_eq!(sources.compute.label(), "counter_fill");
        assert_eq!(embedded_sources(false).compute.label(), "accumulate");
        assert!(QUAD_VERTEX_SHADER.contains(VERTEX_ENTRY));
        assert!(QUAD_FRAGMENT_SHADER.contains(FRAGMENT_ENTRY));
    }
}
