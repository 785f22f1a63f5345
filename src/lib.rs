#![allow(clippy::new_without_default)]

mod app;
pub mod clock;
pub mod default_shaders;
pub mod demo;
pub mod input;
pub mod shader_compiler;
pub mod utils;
pub mod watcher;

pub use self::{
    app::App,
    clock::{FrameClock, Timeline},
    demo::{Demo, DemoSpec, PassSources},
    input::{Input, MouseMapping},
    shader_compiler::{CompiledShader, ShaderCompiler},
    watcher::{ShaderSlot, Watcher},
};

pub use shadetoy_types::Uniforms;

pub const SCREENSHOT_FOLDER: &str = "screenshots";

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum ShaderKind {
    Fragment,
    Vertex,
}

impl From<ShaderKind> for shaderc::ShaderKind {
    fn from(value: ShaderKind) -> Self {
        match value {
            ShaderKind::Vertex => shaderc::ShaderKind::Vertex,
            ShaderKind::Fragment => shaderc::ShaderKind::Fragment,
        }
    }
}
