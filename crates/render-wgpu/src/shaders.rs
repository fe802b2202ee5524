/// WGSL shader for lit meshes: one rect area light, shaded from its closest
/// point to the fragment, plus a flat ambient term.
pub const MESH_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // xyz = center, w = area
    light_center: vec4<f32>,
    // xyz = half-width vector
    light_right: vec4<f32>,
    // xyz = half-height vector
    light_up: vec4<f32>,
    // xyz = emitting direction
    light_normal: vec4<f32>,
    // rgb = color * intensity
    light_color: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    // x = roughness, y = metalness, z = double-sided
    @location(7) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) params: vec4<f32>,
};

const PI: f32 = 3.14159265;

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    out.params = instance.params;
    return out;
}

fn closest_on_light(p: vec3<f32>) -> vec3<f32> {
    let right = uniforms.light_right.xyz;
    let up = uniforms.light_up.xyz;
    let hw = length(right);
    let hh = length(up);
    let d = p - uniforms.light_center.xyz;
    let x = clamp(dot(d, right / hw), -hw, hw);
    let y = clamp(dot(d, up / hh), -hh, hh);
    return uniforms.light_center.xyz + right / hw * x + up / hh * y;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let double_sided = in.params.z > 0.5;
    if (!front && !double_sided) {
        discard;
    }
    var n = normalize(in.world_normal);
    if (!front) {
        n = -n;
    }

    let roughness = clamp(in.params.x, 0.04, 1.0);
    let metalness = in.params.y;
    let albedo = in.color.rgb;

    let v = normalize(uniforms.camera_pos.xyz - in.world_pos);
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);
    let shininess = 2.0 / (roughness * roughness * roughness * roughness) - 2.0;
    let diffuse = albedo * (1.0 - metalness) / PI;

    // w is 0 when the scene has no area light.
    var direct = vec3<f32>(0.0);
    let area = uniforms.light_center.w;
    if (area > 0.0) {
        let to_light = closest_on_light(in.world_pos) - in.world_pos;
        let dist2 = max(dot(to_light, to_light), 1e-4);
        let l = to_light * inverseSqrt(dist2);
        let h = normalize(l + v);

        let facing = max(dot(-l, uniforms.light_normal.xyz), 0.0);
        let n_dot_l = max(dot(n, l), 0.0);
        let irradiance = uniforms.light_color.rgb * facing * n_dot_l * area / (PI * dist2 + area);
        let spec = f0 * pow(max(dot(n, h), 0.0), shininess) * (shininess + 8.0) / (8.0 * PI);
        direct = (diffuse + spec) * irradiance;
    }

    let lit = direct + albedo * uniforms.ambient.rgb;
    return vec4<f32>(lit, in.color.a);
}
"#;

/// WGSL shader for unlit debug lines such as the area light outline.
pub const LINE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
