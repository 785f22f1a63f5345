use clap::ValueEnum;
use shadetoy_types::QuadLayout;

use crate::default_shaders::{minimal, multipass, raymarch};
use crate::input::MouseMapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Demo {
    /// ShaderToy's default colour scene.
    #[default]
    Minimal,
    /// Raymarched sphere lit from the mouse position.
    Raymarch,
    /// Colour scene rendered offscreen, then tiled onto the screen.
    Multipass,
}

/// GLSL sources of one quad draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSources {
    pub vert: &'static str,
    pub frag: &'static str,
    pub quad: QuadLayout,
}

#[derive(Debug, Clone, Copy)]
pub struct DemoSpec {
    pub title: &'static str,
    pub scene: PassSources,
    pub composite: Option<PassSources>,
    pub mouse: MouseMapping,
}

impl Demo {
    pub fn spec(self) -> DemoSpec {
        match self {
            Demo::Minimal => DemoSpec {
                title: "PyShadeToy",
                scene: PassSources {
                    vert: minimal::VERTEX_SHADER,
                    frag: minimal::FRAGMENT_SHADER,
                    quad: QuadLayout::Positions,
                },
                composite: None,
                mouse: MouseMapping::Pixels,
            },
            Demo::Raymarch => DemoSpec {
                title: "PyShadeToy",
                scene: PassSources {
                    vert: raymarch::VERTEX_SHADER,
                    frag: raymarch::FRAGMENT_SHADER,
                    quad: QuadLayout::Positions,
                },
                composite: None,
                mouse: MouseMapping::Normalized,
            },
            Demo::Multipass => DemoSpec {
                title: "PyShadeToy",
                scene: PassSources {
                    vert: multipass::VERTEX_SHADER_FIRST,
                    frag: multipass::FRAGMENT_SHADER_FIRST,
                    quad: QuadLayout::Positions,
                },
                composite: Some(PassSources {
                    vert: multipass::VERTEX_SHADER_SECOND,
                    frag: multipass::FRAGMENT_SHADER_SECOND,
                    quad: QuadLayout::PositionsUv,
                }),
                mouse: MouseMapping::Pixels,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Demo::Minimal => "minimal",
            Demo::Raymarch => "raymarch",
            Demo::Multipass => "multipass",
        }
    }
}
