use anyhow::{Context, Result};
use cubehost_input::Action;
use cubehost_render::{Frame, RenderModule};
use cubehost_session::Session;
use std::path::{Path, PathBuf};

/// Collects presented frames: keeps the latest and optionally writes each one
/// to a directory as `frame_NNNNN.png`.
pub struct FrameSink {
    dump_dir: Option<PathBuf>,
    latest: Option<(u32, u32, Vec<u8>)>,
    written: usize,
    presented: usize,
    error: Option<anyhow::Error>,
}

impl FrameSink {
    pub fn new(dump_dir: Option<PathBuf>) -> Self {
        Self {
            dump_dir,
            latest: None,
            written: 0,
            presented: 0,
            error: None,
        }
    }

    pub fn accept(&mut self, frame: &Frame<'_>) {
        let index = self.presented;
        self.presented += 1;
        self.latest = Some((frame.width(), frame.height(), frame.pixels().to_vec()));
        if self.error.is_some() {
            return;
        }
        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!("frame_{index:05}.png"));
            match write_png(&path, frame.width(), frame.height(), frame.pixels()) {
                Ok(()) => self.written += 1,
                Err(e) => self.error = Some(e),
            }
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Surface the first write failure, if any.
    pub fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Write the most recent frame.
    pub fn save_latest(&self, path: &Path) -> Result<()> {
        let (width, height, pixels) = self
            .latest
            .as_ref()
            .context("no frame was rendered")?;
        write_png(path, *width, *height, pixels)
    }
}

pub fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    image::save_buffer(path, rgba, width, height, image::ColorType::Rgba8)
        .with_context(|| format!("writing {}", path.display()))
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptReport {
    pub actions: usize,
    pub frames: usize,
}

/// Render the initial frame, then every frame each action causes.
///
/// With `final_mode`, one more frame is rendered carrying that aux mode.
pub fn run_script<M>(
    session: &mut Session,
    module: &mut M,
    actions: &[Action],
    final_mode: Option<i32>,
    sink: &mut FrameSink,
) -> Result<ScriptReport>
where
    M: RenderModule + ?Sized,
{
    session
        .render_with(module, |frame| sink.accept(frame))
        .context("initial render")?;
    let mut frames = 1;

    for (i, action) in actions.iter().enumerate() {
        frames += session
            .dispatch(*action, module, |frame| sink.accept(frame))
            .with_context(|| format!("action {i} ({action:?})"))?;
        sink.check()?;
    }

    if let Some(mode) = final_mode {
        session.set_mode(mode);
        frames += session
            .dispatch(Action::Noop, module, |frame| sink.accept(frame))
            .context("final render")?;
    }
    sink.check()?;

    tracing::debug!(actions = actions.len(), frames, "script finished");
    Ok(ScriptReport {
        actions: actions.len(),
        frames,
    })
}
