use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use color_eyre::Result;
use eyre::WrapErr;
use shadetoy_types::{QuadLayout, Uniforms};
use shadetoy_wgpu::{PassDescriptor, SurfaceError, WgpuRender};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    default_shaders::create_default_shader,
    demo::{DemoSpec, PassSources},
    utils::{self, print_help, Args},
    CompiledShader, FrameClock, Input, ShaderCompiler, ShaderKind, ShaderSlot, Timeline, Watcher,
};

const TITLE_UPDATE_PERIOD: Duration = Duration::from_millis(250);

struct CompiledPass {
    label: &'static str,
    vert: CompiledShader,
    frag: CompiledShader,
    quad: QuadLayout,
}

impl CompiledPass {
    fn descriptor(&self) -> PassDescriptor<'_> {
        PassDescriptor {
            label: self.label,
            vert: &self.vert.spirv,
            frag: &self.frag.spirv,
            quad: self.quad,
            uses_uniforms: self.vert.uses_uniforms || self.frag.uses_uniforms,
            samples_input: self.frag.samples_input,
        }
    }
}

pub struct App {
    pub render: WgpuRender,
    compiler: ShaderCompiler,
    spec: DemoSpec,
    scene_file: Option<PathBuf>,
    composite_file: Option<PathBuf>,
    watcher: Option<Watcher>,

    pub input: Input,
    clock: FrameClock,
    timeline: Timeline,
    pub uniforms: Uniforms,
    last_title_update: Instant,
}

impl App {
    pub fn new(window: &Window, args: &Args) -> Result<Self> {
        let spec = args.demo.spec();
        let PhysicalSize { width, height } = window.inner_size();
        let mut render = pollster::block_on(WgpuRender::new(window, width, height))?;
        let compiler = ShaderCompiler::new()?;

        let scene_file = args
            .frag
            .as_deref()
            .map(|path| prepare_shader_file(path, spec.scene.frag))
            .transpose()?;
        let composite_file = match (spec.composite, args.post_frag.as_deref()) {
            (Some(composite), Some(path)) => Some(prepare_shader_file(path, composite.frag)?),
            (None, Some(path)) => {
                log::warn!(
                    "Demo {} has a single pass, ignoring {}",
                    args.demo.name(),
                    path.display()
                );
                None
            }
            (_, None) => None,
        };

        let scene_frag = load_source(scene_file.as_deref(), spec.scene.frag)?;
        let scene = compile_pass(&compiler, "Scene", spec.scene, &scene_frag)?;
        let composite = spec
            .composite
            .map(|composite| {
                let frag = load_source(composite_file.as_deref(), composite.frag)?;
                compile_pass(&compiler, "Composite", composite, &frag)
            })
            .transpose()?;
        render.set_passes(
            scene.descriptor(),
            composite.as_ref().map(CompiledPass::descriptor),
        )?;

        let watched: Vec<_> = scene_file
            .iter()
            .map(|path| (path.clone(), ShaderSlot::SceneFragment))
            .chain(
                composite_file
                    .iter()
                    .map(|path| (path.clone(), ShaderSlot::CompositeFragment)),
            )
            .collect();
        let watcher = if watched.is_empty() {
            None
        } else {
            Some(Watcher::new(watched)?)
        };

        println!("{}", render.get_info());
        println!("Demo: {}", args.demo.name());
        print_help();

        let mut uniforms = Uniforms::default();
        uniforms.resolution = [width as f32, height as f32];

        Ok(Self {
            render,
            compiler,
            spec,
            scene_file,
            composite_file,
            watcher,

            input: Input::new(width, height),
            clock: FrameClock::new(Some(args.max_fps)),
            timeline: Timeline::new(),
            uniforms,
            last_title_update: Instant::now(),
        })
    }

    /// Picks up edited shader files. A shader that fails to build is reported
    /// and the running pipeline stays.
    pub fn setup_frame(&mut self) {
        let changed = match &self.watcher {
            Some(watcher) => watcher.poll(),
            None => return,
        };
        for slot in changed {
            match self.reload(slot) {
                Ok(()) => log::info!("Reloaded {slot:?}"),
                Err(err) => log::error!("{err:#}"),
            }
        }
    }

    fn reload(&mut self, slot: ShaderSlot) -> Result<()> {
        match slot {
            ShaderSlot::SceneFragment => {
                let frag = load_source(self.scene_file.as_deref(), self.spec.scene.frag)?;
                let pass = compile_pass(&self.compiler, "Scene", self.spec.scene, &frag)?;
                self.render.rebuild_scene(pass.descriptor())
            }
            ShaderSlot::CompositeFragment => {
                let Some(composite) = self.spec.composite else {
                    return Ok(());
                };
                let frag = load_source(self.composite_file.as_deref(), composite.frag)?;
                let pass = compile_pass(&self.compiler, "Composite", composite, &frag)?;
                self.render.rebuild_composite(pass.descriptor())
            }
        }
    }

    /// Ticks the clock and refreshes the uniforms for the next frame.
    pub fn update(&mut self, window: &Window) {
        self.clock.tick();

        self.uniforms.time = self.timeline.elapsed().as_secs_f32();
        self.uniforms.resolution = self.input.size;
        self.uniforms.mouse = self.input.mouse(self.spec.mouse);

        if self.last_title_update.elapsed() >= TITLE_UPDATE_PERIOD {
            window.set_title(&format!("FPS: {}", self.clock.fps()));
            self.last_title_update = Instant::now();
        }
    }

    pub fn render(&self) -> Result<(), SurfaceError> {
        self.render.render(&self.uniforms)
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.input.resized(size);
        self.render.resize(size.width, size.height);
    }

    pub fn cursor_moved(&mut self, position: winit::dpi::PhysicalPosition<f64>) {
        self.input.cursor_moved(position);
    }

    pub fn toggle_pause(&mut self) {
        if self.timeline.toggle_pause() {
            println!("Paused at {:#.2?}", self.timeline.elapsed());
        } else {
            println!("Resumed");
        }
    }

    pub fn restart(&mut self) {
        self.timeline.restart();
        self.uniforms.time = 0.0;
    }

    pub fn print_params(&self) {
        println!("{}", self.uniforms);
    }

    pub fn screenshot(&self) -> Result<()> {
        let now = Instant::now();
        let frame = self
            .render
            .capture_frame(&self.uniforms)
            .wrap_err("Failed to capture frame")?;
        log::info!("Capture image: {:#.2?}", now.elapsed());

        let _ = utils::save_screenshot(frame);
        Ok(())
    }

    pub fn shut_down(&self) {
        self.render.wait_idle();
    }
}

/// Makes sure a user shader file exists, seeding it with the built-in source.
fn prepare_shader_file(path: &Path, default: &str) -> Result<PathBuf> {
    if create_default_shader(path, default)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?
    {
        println!("Created {}", path.display());
    }
    Ok(path.to_path_buf())
}

fn load_source(path: Option<&Path>, embedded: &'static str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display())),
        None => Ok(embedded.to_owned()),
    }
}

fn compile_pass(
    compiler: &ShaderCompiler,
    label: &'static str,
    sources: PassSources,
    frag: &str,
) -> Result<CompiledPass> {
    let vert = compiler.compile(sources.vert, &format!("{label}.vert"), ShaderKind::Vertex)?;
    let frag = compiler.compile(frag, &format!("{label}.frag"), ShaderKind::Fragment)?;
    Ok(CompiledPass {
        label,
        vert,
        frag,
        quad: sources.quad,
    })
}
