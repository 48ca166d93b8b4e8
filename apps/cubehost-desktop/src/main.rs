use anyhow::{Context, Result, bail};
use clap::Parser;
use cubehost_common::{ContractKind, FaceLayout, HostConfig};
use cubehost_input::{Action, KeyMap};
use cubehost_render::RenderModule;
use cubehost_render_wgpu::BlitRenderer;
use cubehost_session::{Outcome, Session, SessionConfig, SweepStep};
use cubehost_wasm::{LoadOptions, WasmModule};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cubehost-desktop", about = "Run a render module in a desktop window")]
struct Cli {
    /// Precompiled module (overrides the config file; default out.wasm)
    module: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML host configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Call contract of the module's render export: canonical or legacy
    #[arg(long)]
    contract: Option<ContractKind>,

    /// Face layout: 7 or 8
    #[arg(long)]
    faces: Option<FaceLayout>,

    /// Forward left clicks to the module
    #[arg(long)]
    pointer: bool,
}

impl Cli {
    /// Config file values, then flags on top.
    fn host_config(&self) -> Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HostConfig::default(),
        };
        if let Some(module) = &self.module {
            config.module_path = module.clone();
        }
        if let Some(contract) = self.contract {
            config.contract = contract;
        }
        if let Some(faces) = self.faces {
            config.faces = faces;
        }
        if self.pointer {
            config.pointer_input = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Surface configuration size for a window: at least one pixel and at most
/// the device's texture limit per side.
fn surface_extent(size: PhysicalSize<u32>, max_side: u32) -> (u32, u32) {
    (size.width.clamp(1, max_side), size.height.clamp(1, max_side))
}

/// Window and GPU objects, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    blit: BlitRenderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, host: &HostConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(format!("cubehost - {}", host.module_path.display()))
            .with_inner_size(PhysicalSize::new(host.surface.width, host.surface.height));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter for this surface")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubehost_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let max_side = device.limits().max_texture_dimension_2d;
        if host.surface.width > max_side || host.surface.height > max_side {
            bail!(
                "surface {}x{} exceeds the GPU texture limit of {max_side}",
                host.surface.width,
                host.surface.height
            );
        }

        let (width, height) = surface_extent(window.inner_size(), max_side);
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let blit = BlitRenderer::new(&device, surface_format, host.surface, width, height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            max_side,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            blit,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let max_side = self.device.limits().max_texture_dimension_2d;
        let (width, height) = surface_extent(size, max_side);
        if (width, height) != (size.width, size.height) {
            tracing::debug!(width, height, max_side, "clamped surface size");
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.blit.resize(&self.queue, width, height);
    }

    /// Draw the last uploaded frame to the window.
    fn present(&mut self) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out, skipping present");
                return Ok(());
            }
            Err(e) => return Err(anyhow::anyhow!("surface error: {e}")),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.blit.draw(&self.device, &self.queue, &view);
        output.present();
        Ok(())
    }
}

struct DesktopApp {
    host: HostConfig,
    session: Session,
    keymap: KeyMap,
    module: Box<dyn RenderModule>,
    gpu: Option<Gpu>,
    cursor: Option<PhysicalPosition<f64>>,
    /// When the running sweep takes its next step.
    sweep_due: Option<Instant>,
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(host: HostConfig, module: Box<dyn RenderModule>) -> Self {
        Self {
            session: Session::new(SessionConfig::from(&host)),
            keymap: KeyMap::new(host.faces),
            host,
            module,
            gpu: None,
            cursor: None,
            sweep_due: None,
            error: None,
        }
    }

    /// Render step followed by a texture upload and a redraw request.
    /// Without a window the frame is rendered and dropped.
    fn render_frame(&mut self) -> Result<()> {
        match self.gpu.as_mut() {
            Some(Gpu {
                device,
                queue,
                blit,
                window,
                ..
            }) => {
                self.session
                    .render_with(self.module.as_mut(), |frame| blit.upload(device, queue, frame))?;
                window.request_redraw();
            }
            None => self.session.render_with(self.module.as_mut(), |_| ())?,
        }
        Ok(())
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        match self.session.apply(action) {
            Outcome::Rejected => Ok(()),
            Outcome::Render => self.render_frame(),
            Outcome::SweepStarted => {
                self.sweep_due = Some(Instant::now());
                Ok(())
            }
        }
    }

    /// Take one sweep step if it is due. Every step renders once and then
    /// yields back to the event loop.
    fn step_sweep(&mut self, now: Instant) -> Result<()> {
        match self.sweep_due {
            Some(due) if due <= now => {}
            _ => return Ok(()),
        }
        match self.session.advance_sweep() {
            SweepStep::Step(percent) => {
                tracing::trace!(percent, "sweep step");
                self.render_frame()?;
                self.sweep_due = Some(now + Duration::from_millis(self.host.sweep_interval_ms));
            }
            SweepStep::Finished => {
                self.render_frame()?;
                self.sweep_due = None;
            }
            SweepStep::Idle => self.sweep_due = None,
        }
        Ok(())
    }

    fn click(&self) -> Option<Action> {
        let gpu = self.gpu.as_ref()?;
        let cursor = self.cursor?;
        gpu.blit
            .viewport()
            .to_surface(cursor.x, cursor.y)
            .map(Action::Click)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.host) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => return self.fail(event_loop, e),
        }
        // Initial frame with every accumulator at its default.
        if let Err(e) = self.render_frame() {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    gpu.window.request_redraw();
                }
                Ok(())
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let action = match &logical_key {
                    Key::Character(text) => self.keymap.action_for_text(text.as_str()),
                    _ => Action::Noop,
                };
                self.handle_action(action)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                Ok(())
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                Ok(())
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => match self.click() {
                Some(action) => self.handle_action(action),
                None => Ok(()),
            },
            WindowEvent::RedrawRequested => match &mut self.gpu {
                Some(gpu) => gpu.present(),
                None => Ok(()),
            },
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.step_sweep(Instant::now()) {
            return self.fail(event_loop, e);
        }
        match self.sweep_due {
            Some(due) => event_loop.set_control_flow(ControlFlow::WaitUntil(due)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubehost-desktop starting");

    let host = cli.host_config()?;
    let module = WasmModule::load(&host.module_path, LoadOptions::from(&host))
        .with_context(|| format!("loading module {}", host.module_path.display()))?;
    tracing::info!(
        surface = ?module.surface(),
        contract = %module.contract(),
        sha256 = &module.digest()[..16],
        faces = host.faces.face_count(),
        pointer = host.pointer_input,
        "module ready"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(host, Box::new(module));
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubehost_common::{InputCode, SurfaceSize};
    use cubehost_render::SolidFillModule;

    fn headless(host: HostConfig) -> DesktopApp {
        DesktopApp::new(host, Box::new(SolidFillModule::new(SurfaceSize::new(8, 6))))
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cubehost-desktop").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse(&[]).host_config().unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.yaml");
        std::fs::write(&path, "module_path: a.wasm\ncontract: legacy\nsweep_jump: 5\n").unwrap();
        let path_arg = path.to_str().unwrap();

        let config = parse(&["--config", path_arg]).host_config().unwrap();
        assert_eq!(config.module_path, PathBuf::from("a.wasm"));
        assert_eq!(config.contract, ContractKind::Legacy);
        assert_eq!(config.sweep_jump, 5);

        let config = parse(&[
            "b.wasm",
            "--config",
            path_arg,
            "--contract",
            "canonical",
            "--faces",
            "8",
            "--pointer",
        ])
        .host_config()
        .unwrap();
        assert_eq!(config.module_path, PathBuf::from("b.wasm"));
        assert_eq!(config.contract, ContractKind::Canonical);
        assert_eq!(config.faces, FaceLayout::Eight);
        assert!(config.pointer_input);
        assert_eq!(config.sweep_jump, 5);
    }

    #[test]
    fn sweep_renders_one_step_per_turn() {
        let mut app = headless(HostConfig::default());
        app.handle_action(Action::Rotate).unwrap();
        assert!(app.sweep_due.is_some());
        assert_eq!(app.session.frame(), 0);

        // Input is dropped while the sweep runs.
        app.handle_action(Action::Orient(InputCode::PitchUp)).unwrap();
        assert_eq!(app.session.frame(), 0);

        let mut now = Instant::now();
        // Steps at 1, 16, 31, 46, 61, 76 and 91 percent.
        for turn in 1..=7 {
            app.step_sweep(now).unwrap();
            assert_eq!(app.session.frame(), turn);
            assert!(app.session.is_rotating());
            now = app.sweep_due.unwrap();
        }

        // Trigger frame, then the rotation flag is cleared again.
        app.step_sweep(now).unwrap();
        assert_eq!(app.session.frame(), 8);
        assert!(app.sweep_due.is_none());
        assert!(!app.session.is_rotating());
        assert!(!app.session.rotate_pending());

        app.step_sweep(now).unwrap();
        assert_eq!(app.session.frame(), 8);
    }

    #[test]
    fn sweep_waits_for_its_interval() {
        let host = HostConfig {
            sweep_interval_ms: 50,
            ..HostConfig::default()
        };
        let mut app = headless(host);
        app.handle_action(Action::Rotate).unwrap();

        let now = Instant::now();
        app.step_sweep(now).unwrap();
        assert_eq!(app.session.frame(), 1);
        assert_eq!(app.sweep_due, Some(now + Duration::from_millis(50)));

        app.step_sweep(now + Duration::from_millis(10)).unwrap();
        assert_eq!(app.session.frame(), 1);

        app.step_sweep(now + Duration::from_millis(50)).unwrap();
        assert_eq!(app.session.frame(), 2);
    }

    #[test]
    fn keys_render_without_a_window() {
        let mut app = headless(HostConfig::default());
        let action = app.keymap.action_for('.');
        app.handle_action(action).unwrap();
        assert_eq!(app.session.frame(), 1);
        assert_eq!(app.session.selection().composite(), 1);
    }

    #[test]
    fn surface_extent_stays_within_limits() {
        assert_eq!(surface_extent(PhysicalSize::new(3840, 2160), 2048), (2048, 2048));
        assert_eq!(surface_extent(PhysicalSize::new(2560, 1440), 8192), (2560, 1440));
        assert_eq!(surface_extent(PhysicalSize::new(0, 0), 8192), (1, 1));
    }

    #[test]
    fn oversized_config_surface_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.yaml");
        std::fs::write(&path, "surface: { width: 10000, height: 600 }\n").unwrap();
        let err = parse(&["--config", path.to_str().unwrap()]).host_config().unwrap_err();
        assert!(format!("{err:#}").contains("10000x600"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = parse(&["--config", "/nonexistent/host.yaml"])
            .host_config()
            .unwrap_err();
        assert!(format!("{err:#}").contains("loading config"));
    }
}
