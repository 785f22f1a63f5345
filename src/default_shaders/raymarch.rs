pub const VERTEX_SHADER: &str = r#"
#version 330 core

layout(location = 0) in vec3 vPos;

void main()
{
    gl_Position = vec4(vPos, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
#version 330 core

#define fragCoord gl_FragCoord.xy

uniform vec2  iMouse;
uniform float iTime;
uniform vec2  iResolution;

out vec4 fragColor;

float sdSphere(vec3 p, float r)
{
  return length(p) - r;
}


float map_the_world(in vec3 pos)
{
    float displacement = sin(abs(4.0 * cos(iTime)) * pos.x) *
                         sin(abs(4.0 * sin(iTime)) * pos.y) *
                         sin(4.0                   * pos.z) *
                        (0.1 + abs(0.1 * sin(iTime * 2.0)));
    float sphere_0 = sdSphere(pos, 2.5) + displacement;

    return sphere_0;
}


vec3 calculate_normal(in vec3 pos)
{
    const vec3 small_step = vec3(0.001, 0.0, 0.0);

    float gradient_x = map_the_world(pos + small_step.xyy) - map_the_world(pos - small_step.xyy);
    float gradient_y = map_the_world(pos + small_step.yxy) - map_the_world(pos - small_step.yxy);
    float gradient_z = map_the_world(pos + small_step.yyx) - map_the_world(pos - small_step.yyx);

    vec3 normal = vec3(gradient_x, gradient_y, gradient_z);

    return normalize(normal);
}


vec3 ray_march(in vec3 ro, in vec3 rd)
{
    float total_distance_traveled = 0.0;
    const int NUMBER_OF_STEPS = 128;

    const float MINIMUM_HIT_DISTANCE = 0.001;
    const float MAXIMUM_TRACE_DISTANCE = 512.0;
    const float AMBIENT = 0.2;

    for (int i = 0; i < NUMBER_OF_STEPS; ++i)
    {
        vec3 current_position = ro + total_distance_traveled * rd;

        float distance_to_closest = map_the_world(current_position);

        if (distance_to_closest < MINIMUM_HIT_DISTANCE) 
        {
            vec3 normal = calculate_normal(current_position);
            vec3 light_position = vec3(-iMouse.x, iMouse.y, 4.0);
            vec3 direction_to_light = normalize(current_position - light_position);

            float diffuse_intensity = max(AMBIENT, pow(dot(normal, direction_to_light), 16.0));

            return vec3(1.0, 0.0, 0.0) * diffuse_intensity;
        }

        if (total_distance_traveled > MAXIMUM_TRACE_DISTANCE){
            break;
        }
        total_distance_traveled += distance_to_closest;
    }
    return vec3(0.0);
}


void main()
{
    vec2 uv = fragCoord / iResolution.xy * 2.0 - 1.0;
    uv.x *= iResolution.x / iResolution.y;

    vec3 camera_position = vec3(0.0, 0.0, -5.0);
    vec3 ray_origin = camera_position;
    vec3 ray_direction = vec3(uv, 1.0);

    vec3 result = ray_march(ray_origin, ray_direction);

    fragColor = vec4(result, 1.0);
}
"#;
