pub const VERTEX_SHADER_FIRST: &str = r#"
#version 330 core
layout(location = 0) in vec3 vPos;
void main()
{
    gl_Position = vec4(vPos, 1.0);
}
"#;

pub const FRAGMENT_SHADER_FIRST: &str = r#"
#version 330 core
#define fragCoord gl_FragCoord.xy
uniform vec2  iMouse;
uniform float iTime;
uniform vec2  iResolution;
out vec4 fragColor;
void main()
{
    // Set origin to center of the screen
    vec2 uv = fragCoord/iResolution.xy * 2.0 - 1.0;
    // Fix aspect ratio
    uv.x *= iResolution.x / iResolution.y;
    // Time varying pixel color (Copied from ShaderToy default scene)
    vec3 color = 0.5 + 0.5 * cos(iTime + uv.xyx + vec3(0.0, 2.0, 4.0));
    fragColor = vec4(color, 1.0);
}
"#;

pub const VERTEX_SHADER_SECOND: &str = r#"
#version 330 core
layout(location = 0) in vec3 vPos;
layout(location = 1) in vec2 texCoords;

out vec2 texcoords;

void main()
{
    gl_Position = vec4(vPos, 1.0);
    texcoords = texCoords;
}
"#;

pub const FRAGMENT_SHADER_SECOND: &str = r#"
#version 330 core
#define fragCoord gl_FragCoord.xy

out vec4 fragColor;
in vec2 texcoords;

uniform sampler2D tex;

void main()
{
    vec4 color = texture(tex, texcoords * 4.0);
    fragColor = color;
}
"#;
