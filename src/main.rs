use clap::Parser;
use color_eyre::Result;
use shadetoy::{utils::Args, App};
use shadetoy_wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let args = Args::parse();
    let (width, height) = args.size;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(args.demo.spec().title)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)?;

    let mut app = App::new(&window, &args)?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::NewEvents(_) => app.setup_frame(),
            Event::MainEventsCleared => window.request_redraw(),
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Released,
                            virtual_keycode: Some(VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } => match keycode {
                    VirtualKeyCode::F1 => shadetoy::utils::print_help(),
                    VirtualKeyCode::F2 => app.toggle_pause(),
                    VirtualKeyCode::F5 => app.restart(),
                    VirtualKeyCode::F6 => app.print_params(),
                    VirtualKeyCode::F11 => {
                        if let Err(err) = app.screenshot() {
                            log::error!("{err:#}");
                        }
                    }
                    _ => {}
                },
                WindowEvent::CursorMoved { position, .. } => app.cursor_moved(*position),
                WindowEvent::Resized(size) => app.resize(*size),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    app.resize(**new_inner_size)
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                app.update(&window);
                match app.render() {
                    Ok(_) => {}
                    Err(SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        *control_flow = ControlFlow::Exit
                    }
                    Err(e) => log::warn!("{e:?}"),
                }
            }
            Event::LoopDestroyed => app.shut_down(),
            _ => {}
        }
    });
}
