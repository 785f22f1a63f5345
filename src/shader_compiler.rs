pub mod glsl;

use eyre::{eyre, Result, WrapErr};

use crate::ShaderKind;

pub use glsl::{adapt, AdaptError, AdaptedShader};

/// SPIR-V of one stage plus what its interface needs from the renderer.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub spirv: Vec<u32>,
    pub uses_uniforms: bool,
    pub samples_input: bool,
}

pub struct ShaderCompiler {
    compiler: shaderc::Compiler,
    options: shaderc::CompileOptions<'static>,
}

impl ShaderCompiler {
    pub fn new() -> Result<Self> {
        let mut options = shaderc::CompileOptions::new()
            .ok_or_else(|| eyre!("Failed to create shader compiler options"))?;
        options.set_target_env(
            shaderc::TargetEnv::Vulkan,
            shaderc::EnvVersion::Vulkan1_0 as u32,
        );
        // Sources carry `#version 330 core`; Vulkan rules need 450.
        options.set_forced_version_profile(450, shaderc::GlslProfile::None);
        options.set_auto_map_locations(true);

        if cfg!(debug_assertions) {
            options.add_macro_definition("DEBUG", Some("1"));
            options.set_generate_debug_info();
        } else {
            options.add_macro_definition("NDEBUG", Some("1"));
            options.set_optimization_level(shaderc::OptimizationLevel::Performance);
        }

        Ok(Self {
            compiler: shaderc::Compiler::new()
                .ok_or_else(|| eyre!("Failed to create shader compiler"))?,
            options,
        })
    }

    /// Adapts `source` for Vulkan and compiles it. `name` only labels messages.
    pub fn compile(&self, source: &str, name: &str, kind: ShaderKind) -> Result<CompiledShader> {
        let adapted = adapt(source, kind).wrap_err_with(|| format!("In shader {name}"))?;

        let mut options = self
            .options
            .clone()
            .ok_or_else(|| eyre!("Failed to clone shader compiler options"))?;
        match kind {
            ShaderKind::Vertex => options.add_macro_definition("VERTEX_SHADER", Some("1")),
            ShaderKind::Fragment => options.add_macro_definition("FRAGMENT_SHADER", Some("1")),
        }

        let artifact = self
            .compiler
            .compile_into_spirv(&adapted.source, kind.into(), name, "main", Some(&options))
            .map_err(|err| eyre!("{err}"))?;

        if artifact.get_num_warnings() > 0 {
            log::warn!(
                "In shader {name}:\n{}",
                artifact.get_warning_messages()
            );
        }

        Ok(CompiledShader {
            spirv: artifact.as_binary().to_vec(),
            uses_uniforms: adapted.uses_uniforms,
            samples_input: adapted.samples_input,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Demo;

    #[test]
    fn builtin_demos_compile() {
        let compiler = ShaderCompiler::new().unwrap();
        for demo in [Demo::Minimal, Demo::Raymarch, Demo::Multipass] {
            let spec = demo.spec();
            let passes = std::iter::once(spec.scene).chain(spec.composite);
            for pass in passes {
                let vert = compiler
                    .compile(pass.vert, "demo.vert", ShaderKind::Vertex)
                    .unwrap();
                let frag = compiler
                    .compile(pass.frag, "demo.frag", ShaderKind::Fragment)
                    .unwrap();
                assert!(!vert.spirv.is_empty());
                assert!(!frag.spirv.is_empty());
            }
        }
    }

    #[test]
    fn adaptation_error_names_the_shader() {
        let compiler = ShaderCompiler::new().unwrap();
        let err = compiler
            .compile("uniform float iFrame;\n", "broken.frag", ShaderKind::Fragment)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("broken.frag"), "{message}");
        assert!(message.contains("iFrame"), "{message}");
    }

    #[test]
    fn syntax_error_is_reported() {
        let compiler = ShaderCompiler::new().unwrap();
        let source = "#version 330 core\nout vec4 fragColor;\nvoid main() { fragColor = ; }\n";
        assert!(compiler
            .compile(source, "typo.frag", ShaderKind::Fragment)
            .is_err());
    }
}
