//! Rewrites OpenGL-flavoured GLSL so it builds for Vulkan.
//!
//! Only declarations change: loose ShaderToy uniforms become one std140
//! block at set 0 and a `sampler2D` becomes a separate texture/sampler pair
//! at set 1. Other statements and comments on the same line are kept. Lines
//! that grow get a trailing `#line` so compiler messages still point into the
//! source as written.

use std::fmt::{self, Write as _};

use shadetoy_types::SHADERTOY_UNIFORMS;

use crate::ShaderKind;

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Vulkan puts the fragment origin in the upper-left corner, GL in the lower-left.
const FRAG_COORD_FLIP: &str =
    "#define gl_FragCoord vec4(gl_FragCoord.x, iResolution.y - gl_FragCoord.y, gl_FragCoord.zw)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptError {
    UnknownUniform {
        line: usize,
        name: String,
    },
    UniformType {
        line: usize,
        name: String,
        expected: &'static str,
        found: String,
    },
    MultipleDeclarators {
        line: usize,
    },
    TooManySamplers {
        line: usize,
        name: String,
    },
    SamplerOutsideFragment {
        line: usize,
        name: String,
    },
    UnterminatedComment {
        line: usize,
    },
    Malformed {
        line: usize,
    },
}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdaptError::UnknownUniform { line, name } => write!(
                f,
                "line {line}: uniform `{name}` is not one of iResolution, iMouse, iTime"
            ),
            AdaptError::UniformType {
                line,
                name,
                expected,
                found,
            } => write!(f, "line {line}: `{name}` must be `{expected}`, found `{found}`"),
            AdaptError::MultipleDeclarators { line } => {
                write!(f, "line {line}: declare one uniform per statement")
            }
            AdaptError::TooManySamplers { line, name } => write!(
                f,
                "line {line}: `{name}` is a second sampler, only one input texture is bound"
            ),
            AdaptError::SamplerOutsideFragment { line, name } => write!(
                f,
                "line {line}: sampler `{name}` is only available in fragment shaders"
            ),
            AdaptError::UnterminatedComment { line } => write!(
                f,
                "line {line}: block comment opened after a uniform declaration"
            ),
            AdaptError::Malformed { line } => write!(f, "line {line}: malformed uniform"),
        }
    }
}

impl std::error::Error for AdaptError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedShader {
    pub source: String,
    pub uses_uniforms: bool,
    pub samples_input: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Declaration<'a> {
    ShaderToy,
    Sampler(&'a str),
}

pub fn adapt(source: &str, kind: ShaderKind) -> Result<AdaptedShader, AdaptError> {
    let mut out = String::with_capacity(source.len() + 256);
    let mut in_comment = false;
    let mut uses_uniforms = false;
    let mut samples_input = false;

    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let line = index + 1;
        let (content, terminator) = split_terminator(raw);
        let (statements, tail) = split_statements(content, &mut in_comment);

        let is_directive = statements
            .first()
            .map_or(false, |s| s.code.trim_start().starts_with('#'));
        if is_directive || !statements.iter().any(Statement::is_loose_uniform) {
            out.push_str(raw);
            continue;
        }

        let mut rewritten = String::with_capacity(content.len() + 128);
        let mut directives = Vec::new();
        for statement in &statements {
            rewritten.push_str(statement.prefix);
            if !statement.is_loose_uniform() {
                rewritten.push_str(statement.text);
                continue;
            }
            match parse_uniform(statement.code.trim(), line)? {
                Declaration::ShaderToy if !uses_uniforms => {
                    uses_uniforms = true;
                    rewritten.push_str(&uniform_block());
                    if kind == ShaderKind::Fragment {
                        directives.push(FRAG_COORD_FLIP.to_owned());
                    }
                }
                Declaration::ShaderToy => {}
                Declaration::Sampler(name) => {
                    if kind != ShaderKind::Fragment {
                        return Err(AdaptError::SamplerOutsideFragment {
                            line,
                            name: name.to_owned(),
                        });
                    }
                    if samples_input {
                        return Err(AdaptError::TooManySamplers {
                            line,
                            name: name.to_owned(),
                        });
                    }
                    samples_input = true;
                    let [declarations, define] = sampler_bindings(name);
                    rewritten.push_str(&declarations);
                    directives.push(define);
                }
            }
        }
        rewritten.push_str(tail);
        out.push_str(&rewritten);

        if !directives.is_empty() {
            if in_comment {
                return Err(AdaptError::UnterminatedComment { line });
            }
            for directive in directives {
                out.push('\n');
                out.push_str(&directive);
            }
            let _ = write!(out, "\n#line {}", line + 1);
        }
        out.push_str(terminator);
    }

    Ok(AdaptedShader {
        source: out,
        uses_uniforms,
        samples_input,
    })
}

fn split_terminator(raw: &str) -> (&str, &str) {
    let content = raw.trim_end_matches(['\n', '\r']);
    (content, &raw[content.len()..])
}

/// One `;`-terminated statement of a line.
#[derive(Debug)]
struct Statement<'a> {
    /// Whitespace and comments before the first token.
    prefix: &'a str,
    /// From the first token through the `;`.
    text: &'a str,
    /// `text` without comments and the `;`.
    code: String,
}

impl Statement<'_> {
    fn is_loose_uniform(&self) -> bool {
        self.code.split_whitespace().next() == Some("uniform") && !self.code.contains('{')
    }
}

/// Splits a line into statements and the unterminated rest. `in_comment`
/// carries an open block comment across lines.
fn split_statements<'a>(
    content: &'a str,
    in_comment: &mut bool,
) -> (Vec<Statement<'a>>, &'a str) {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut code_start = None;
    let mut code = String::new();

    let mut i = 0;
    while let Some(c) = content[i..].chars().next() {
        let rest = &content[i..];
        if *in_comment {
            if rest.starts_with("*/") {
                *in_comment = false;
                i += 2;
            } else {
                i += c.len_utf8();
            }
            continue;
        }
        if rest.starts_with("//") {
            break;
        }
        if rest.starts_with("/*") {
            *in_comment = true;
            code.push(' ');
            i += 2;
            continue;
        }

        if c == ';' {
            let first = code_start.take().unwrap_or(i);
            statements.push(Statement {
                prefix: &content[start..first],
                text: &content[first..=i],
                code: std::mem::take(&mut code),
            });
            start = i + 1;
        } else {
            if code_start.is_none() && !c.is_whitespace() {
                code_start = Some(i);
            }
            code.push(c);
        }
        i += c.len_utf8();
    }

    (statements, &content[start..])
}

fn parse_uniform(statement: &str, line: usize) -> Result<Declaration, AdaptError> {
    if statement.contains(',') {
        return Err(AdaptError::MultipleDeclarators { line });
    }
    let tokens: Vec<&str> = statement
        .split_whitespace()
        .skip(1)
        .skip_while(|token| PRECISION_QUALIFIERS.contains(token))
        .collect();
    let (ty, name) = match tokens.as_slice() {
        [ty, name] => (*ty, *name),
        [_, names @ ..] if !names.is_empty() => {
            return Err(AdaptError::UnknownUniform {
                line,
                name: names.join(" "),
            })
        }
        _ => return Err(AdaptError::Malformed { line }),
    };

    if ty == "sampler2D" {
        if !is_identifier(name) {
            return Err(AdaptError::Malformed { line });
        }
        return Ok(Declaration::Sampler(name));
    }

    match SHADERTOY_UNIFORMS.iter().find(|(known, _)| *known == name) {
        Some((_, expected)) if *expected == ty => Ok(Declaration::ShaderToy),
        Some((_, expected)) => Err(AdaptError::UniformType {
            line,
            name: name.to_owned(),
            expected,
            found: ty.to_owned(),
        }),
        None => Err(AdaptError::UnknownUniform {
            line,
            name: name.to_owned(),
        }),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn uniform_block() -> String {
    let members: String = SHADERTOY_UNIFORMS
        .iter()
        .map(|(name, ty)| format!(" {ty} {name};"))
        .collect();
    format!("layout(set = 0, binding = 0, std140) uniform ShaderToy {{{members} }};")
}

fn sampler_bindings(name: &str) -> [String; 2] {
    [
        format!(
            "layout(set = 1, binding = 0) uniform texture2D {name}_texture; \
             layout(set = 1, binding = 1) uniform sampler {name}_sampler;"
        ),
        format!("#define {name} sampler2D({name}_texture, {name}_sampler)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAG: &str = "
#version 330 core
#define fragCoord gl_FragCoord.xy
uniform vec2  iMouse;
uniform float iTime;
uniform vec2  iResolution;
out vec4 fragColor;
void main()
{
    vec2 uv = fragCoord/iResolution.xy * 2.0 - 1.0;
    fragColor = vec4(uv, 0.5 + 0.5 * sin(iTime), 1.0);
}
";

    const SAMPLING_FRAG: &str = "
#version 330 core
out vec4 fragColor;
in vec2 texcoords;

uniform sampler2D tex;

void main()
{
    fragColor = texture(tex, texcoords * 4.0);
}
";

    /// Logical line of every output line, honouring `#line` directives.
    fn logical_lines(source: &str) -> Vec<(usize, &str)> {
        let mut next = 1;
        let mut lines = Vec::new();
        for text in source.lines() {
            if let Some(n) = text.strip_prefix("#line ") {
                next = n.trim().parse().unwrap();
                continue;
            }
            lines.push((next, text));
            next += 1;
        }
        lines
    }

    fn find_line(source: &str, needle: &str) -> usize {
        logical_lines(source)
            .into_iter()
            .find(|(_, text)| text.contains(needle))
            .map(|(n, _)| n)
            .unwrap()
    }

    #[test]
    fn shadertoy_uniforms_become_one_block() {
        let adapted = adapt(FRAG, ShaderKind::Fragment).unwrap();
        assert!(adapted.uses_uniforms);
        assert!(!adapted.samples_input);
        assert_eq!(adapted.source.matches("uniform ShaderToy").count(), 1);
        assert!(adapted.source.contains(
            "layout(set = 0, binding = 0, std140) uniform ShaderToy \
             { vec2 iResolution; vec2 iMouse; float iTime; };"
        ));
        assert!(!adapted.source.contains("uniform float iTime;"));
        assert!(!adapted.source.contains("uniform vec2  iMouse;"));
    }

    #[test]
    fn source_line_numbers_survive() {
        let adapted = adapt(FRAG, ShaderKind::Fragment).unwrap();
        for needle in ["#version 330 core", "out vec4 fragColor;", "void main()", "fragColor = vec4"] {
            assert_eq!(
                find_line(&adapted.source, needle),
                find_line(FRAG, needle),
                "{needle}"
            );
        }
    }

    #[test]
    fn untouched_lines_are_byte_identical() {
        let adapted = adapt(FRAG, ShaderKind::Fragment).unwrap();
        let body = &FRAG[FRAG.find("out vec4").unwrap()..];
        assert!(adapted.source.ends_with(body));
    }

    #[test]
    fn fragment_coordinates_flip_only_in_fragment_stage() {
        let frag = adapt(FRAG, ShaderKind::Fragment).unwrap();
        assert!(frag.source.contains(FRAG_COORD_FLIP));

        let vert = "#version 330 core\nuniform float iTime;\nvoid main() {}\n";
        let adapted = adapt(vert, ShaderKind::Vertex).unwrap();
        assert!(adapted.uses_uniforms);
        assert!(!adapted.source.contains("gl_FragCoord"));
        assert_eq!(adapted.source.lines().count(), vert.lines().count());
    }

    #[test]
    fn shader_without_uniforms_is_unchanged() {
        let vert = "
#version 330 core
layout(location = 0) in vec3 vPos;
void main()
{
    gl_Position = vec4(vPos, 1.0);
}
";
        let adapted = adapt(vert, ShaderKind::Vertex).unwrap();
        assert_eq!(adapted.source, vert);
        assert!(!adapted.uses_uniforms);
    }

    #[test]
    fn sampler_splits_into_texture_and_sampler() {
        let adapted = adapt(SAMPLING_FRAG, ShaderKind::Fragment).unwrap();
        assert!(adapted.samples_input);
        assert!(!adapted.uses_uniforms);
        assert!(adapted
            .source
            .contains("layout(set = 1, binding = 0) uniform texture2D tex_texture;"));
        assert!(adapted
            .source
            .contains("layout(set = 1, binding = 1) uniform sampler tex_sampler;"));
        assert!(adapted
            .source
            .contains("#define tex sampler2D(tex_texture, tex_sampler)"));
        assert_eq!(
            find_line(&adapted.source, "fragColor = texture"),
            find_line(SAMPLING_FRAG, "fragColor = texture")
        );
    }

    #[test]
    fn comments_are_ignored() {
        let source = "// uniform float nope;\n/*\nuniform vec3 nope;\n*/\nuniform float iTime; // time\nvoid main() {}\n";
        let adapted = adapt(source, ShaderKind::Vertex).unwrap();
        assert!(adapted.uses_uniforms);
        assert!(adapted.source.contains("uniform vec3 nope;"));
        assert!(adapted.source.contains("float iTime; }; // time\n"));
    }

    #[test]
    fn comment_close_before_uniform_is_kept() {
        let source = "/* header\n*/ uniform float iTime;\nvoid main() {}\n";
        let adapted = adapt(source, ShaderKind::Fragment).unwrap();
        assert!(adapted.uses_uniforms);
        assert!(adapted.source.contains("*/ layout(set = 0, binding = 0, std140)"));
        assert_eq!(
            adapted.source.matches("/*").count(),
            adapted.source.matches("*/").count()
        );
        assert_eq!(
            find_line(&adapted.source, "void main()"),
            find_line(source, "void main()")
        );
    }

    #[test]
    fn mixed_line_keeps_other_statements() {
        let source = "out vec4 c; uniform float iTime; in vec2 uv;\nvoid main() {}\n";
        let adapted = adapt(source, ShaderKind::Fragment).unwrap();
        assert!(adapted.uses_uniforms);
        assert!(adapted.source.starts_with("out vec4 c; layout(set = 0"));
        assert!(adapted.source.contains("float iTime; }; in vec2 uv;\n"));
        assert!(!adapted.source.contains("uniform float iTime;"));
        assert_eq!(
            find_line(&adapted.source, "void main()"),
            find_line(source, "void main()")
        );
    }

    #[test]
    fn mixed_line_with_sampler() {
        let source = "in vec2 uv; uniform sampler2D tex;\n";
        let adapted = adapt(source, ShaderKind::Fragment).unwrap();
        assert!(adapted.samples_input);
        assert!(adapted
            .source
            .starts_with("in vec2 uv; layout(set = 1, binding = 0) uniform texture2D tex_texture;"));
    }

    #[test]
    fn layout_qualified_uniforms_pass_through() {
        let source = "layout(set = 2, binding = 0) uniform texture2D extra;\nuniform Block { float x; };\n";
        let adapted = adapt(source, ShaderKind::Fragment).unwrap();
        assert_eq!(adapted.source, source);
    }

    #[test]
    fn precision_qualifier_is_skipped() {
        let adapted = adapt("uniform highp float iTime;\n", ShaderKind::Vertex).unwrap();
        assert!(adapted.uses_uniforms);
    }

    #[test]
    fn several_uniforms_on_one_line() {
        let source = "uniform float iTime; uniform vec2 iMouse;\nvoid main() {}\n";
        let adapted = adapt(source, ShaderKind::Vertex).unwrap();
        assert_eq!(adapted.source.matches("uniform ShaderToy").count(), 1);
        assert!(adapted.source.ends_with("void main() {}\n"));
    }

    #[test]
    fn rejects_unknown_uniform() {
        let err = adapt("\nuniform float iFrame;\n", ShaderKind::Fragment).unwrap_err();
        assert_eq!(
            err,
            AdaptError::UnknownUniform {
                line: 2,
                name: "iFrame".into()
            }
        );
    }

    #[test]
    fn rejects_mismatched_type() {
        let err = adapt("uniform vec3 iResolution;\n", ShaderKind::Fragment).unwrap_err();
        assert_eq!(
            err,
            AdaptError::UniformType {
                line: 1,
                name: "iResolution".into(),
                expected: "vec2",
                found: "vec3".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "line 1: `iResolution` must be `vec2`, found `vec3`"
        );
    }

    #[test]
    fn rejects_multiple_declarators() {
        let err = adapt("uniform vec2 iMouse, iResolution;\n", ShaderKind::Fragment).unwrap_err();
        assert_eq!(err, AdaptError::MultipleDeclarators { line: 1 });
    }

    #[test]
    fn rejects_second_sampler() {
        let source = "uniform sampler2D a;\nuniform sampler2D b;\n";
        let err = adapt(source, ShaderKind::Fragment).unwrap_err();
        assert_eq!(
            err,
            AdaptError::TooManySamplers {
                line: 2,
                name: "b".into()
            }
        );
    }

    #[test]
    fn rejects_sampler_in_vertex_stage() {
        let err = adapt("uniform sampler2D tex;\n", ShaderKind::Vertex).unwrap_err();
        assert!(matches!(err, AdaptError::SamplerOutsideFragment { line: 1, .. }));
    }

    #[test]
    fn rejects_comment_opened_after_declaration() {
        let source = "uniform float iTime; /* open\n*/\n";
        let err = adapt(source, ShaderKind::Fragment).unwrap_err();
        assert_eq!(err, AdaptError::UnterminatedComment { line: 1 });

        // Nothing to append after the vertex declaration.
        let adapted = adapt(source, ShaderKind::Vertex).unwrap();
        assert!(adapted.source.ends_with("}; /* open\n*/\n"));
    }

    #[test]
    fn keeps_crlf_terminators() {
        let adapted = adapt("uniform float iTime;\r\nvoid main() {}\r\n", ShaderKind::Vertex).unwrap();
        assert!(adapted.source.ends_with("};\r\nvoid main() {}\r\n"));
    }
}
