use std::cell::RefCell;
use std::rc::Rc;

use farmstead_engine::{
    Composite, ContinuationHandle, Display, Layer, LayerRef, Point, Rect, Rgba, ScheduleError,
    Scheduler, Size, TimerHandle,
};
use tracing::{debug, info};

use super::font::{self, ADVANCE, GLYPH_HEIGHT, LINE_HEIGHT};

pub(crate) const LAYER: &str = "message_box";

/// Characters revealed per second.
const MESSAGE_RATE: f64 = 25.0;
const TEXT_SCALE: u32 = 2;
const PADDING: u32 = 6;

const PANEL: Rgba = [24, 28, 48, 230];
const BORDER: Rgba = [230, 220, 180, 255];
const INK: Rgba = [250, 250, 240, 255];

#[derive(Debug, Default)]
struct MessageState {
    lines: Vec<String>,
    total: usize,
    shown: usize,
    dirty: bool,
}

impl MessageState {
    fn shown_text(&self) -> String {
        let mut remaining = self.shown;
        let mut visible = Vec::new();
        for line in &self.lines {
            if remaining == 0 {
                break;
            }
            let part: String = line.chars().take(remaining).collect();
            remaining -= part.chars().count();
            visible.push(part);
        }
        visible.join("\n")
    }
}

#[derive(Debug)]
struct MessageLayer {
    layer: Layer,
    state: Rc<RefCell<MessageState>>,
}

impl MessageLayer {
    fn redraw(&mut self, state: &MessageState) {
        let size = self.layer.size();
        let edge = TEXT_SCALE;
        let bottom = size.height.saturating_sub(edge) as i32;
        let right = size.width.saturating_sub(edge) as i32;
        let layer = &mut self.layer;
        layer.fill(PANEL);
        layer.fill_rect(Rect::new(0, 0, size.width, edge), BORDER);
        layer.fill_rect(Rect::new(0, bottom, size.width, edge), BORDER);
        layer.fill_rect(Rect::new(0, 0, edge, size.height), BORDER);
        layer.fill_rect(Rect::new(right, 0, edge, size.height), BORDER);

        let shown = state.shown_text();
        for (row, line) in shown.lines().enumerate() {
            let y = PADDING + row as u32 * LINE_HEIGHT * TEXT_SCALE;
            if y + GLYPH_HEIGHT * TEXT_SCALE > size.height.saturating_sub(PADDING) {
                debug!(row, "message_box_line_overflow");
                break;
            }
            font::draw_text(
                &mut self.layer,
                line,
                Point::new(PADDING as i32, y as i32),
                TEXT_SCALE,
                INK,
            );
        }
    }
}

impl Composite for MessageLayer {
    fn layer(&self) -> &Layer {
        &self.layer
    }

    fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    fn refresh(&mut self) {
        let state = Rc::clone(&self.state);
        let Ok(mut state) = state.try_borrow_mut() else {
            return;
        };
        if state.dirty {
            self.redraw(&state);
            state.dirty = false;
        }
    }

    fn invalidate(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.dirty = true;
        }
    }
}

/// Dialogue box along the bottom of the screen that types its text out.
///
/// [`play`](MessageBox::play) returns a handle invoked when the player
/// dismisses the box, so scripts can wait on it. Playing a new message
/// over an unfinished one drops the old handle without invoking it.
#[derive(Debug, Clone)]
pub(crate) struct MessageBox {
    scheduler: Scheduler,
    state: Rc<RefCell<MessageState>>,
    layer: Rc<RefCell<MessageLayer>>,
    typing: Rc<RefCell<Option<TimerHandle>>>,
    dismissed: Rc<RefCell<Option<ContinuationHandle>>>,
    columns: usize,
}

impl MessageBox {
    pub(crate) fn attach(display: &mut Display, scheduler: &Scheduler) -> Self {
        let screen = display.size();
        let size = Size::new(screen.width * 9 / 10, screen.height * 3 / 10);
        let columns = size.width.saturating_sub(PADDING * 2) / (ADVANCE * TEXT_SCALE);

        let state = Rc::new(RefCell::new(MessageState::default()));
        let mut layer = Layer::new(size);
        layer.set_offset(Point::new(
            (screen.width / 20) as i32,
            (screen.height * 65 / 100) as i32,
        ));
        layer.hide();
        let layer = Rc::new(RefCell::new(MessageLayer {
            layer,
            state: Rc::clone(&state),
        }));
        let shared: LayerRef = layer.clone();
        display.append_layer(LAYER, shared);

        Self {
            scheduler: scheduler.clone(),
            state,
            layer,
            typing: Rc::new(RefCell::new(None)),
            dismissed: Rc::new(RefCell::new(None)),
            columns: columns as usize,
        }
    }

    pub(crate) fn play(&self, text: &str) -> Result<ContinuationHandle, ScheduleError> {
        self.stop_typing();
        let lines = font::wrap(text, self.columns);
        let total: usize = lines.iter().map(|line| line.chars().count()).sum();

        let state = Rc::clone(&self.state);
        let timer = self.scheduler.register_once(
            MESSAGE_RATE,
            u32::try_from(total).unwrap_or(u32::MAX - 1) + 1,
            move |count| {
                let Ok(mut state) = state.try_borrow_mut() else {
                    return;
                };
                state.shown = if count == 0 {
                    state.total
                } else {
                    (count as usize).min(state.total)
                };
                state.dirty = true;
            },
        )?;

        info!(chars = total, lines = lines.len(), "message_box_play");
        {
            let mut state = self.state.borrow_mut();
            state.lines = lines;
            state.total = total;
            state.shown = 0;
            state.dirty = true;
        }
        *self.typing.borrow_mut() = Some(timer);
        self.layer.borrow_mut().layer_mut().show();

        let dismissed = ContinuationHandle::new();
        *self.dismissed.borrow_mut() = Some(dismissed.clone());
        Ok(dismissed)
    }

    /// Reveals the rest of the text at once.
    pub(crate) fn stop_playing(&self) {
        self.stop_typing();
        let mut state = self.state.borrow_mut();
        state.shown = state.total;
        state.dirty = true;
    }

    /// Hides the box and resumes whoever waits on the current message.
    pub(crate) fn hide(&self) {
        self.stop_typing();
        {
            let mut state = self.state.borrow_mut();
            state.lines.clear();
            state.total = 0;
            state.shown = 0;
            state.dirty = true;
        }
        self.layer.borrow_mut().layer_mut().hide();
        let dismissed = self.dismissed.borrow_mut().take();
        if let Some(dismissed) = dismissed {
            debug!("message_box_dismissed");
            dismissed.invoke();
        }
    }

    /// The confirm key: first finishes the typing, then dismisses.
    pub(crate) fn confirm(&self) {
        if self.is_playing() {
            self.stop_playing();
        } else if self.is_displayed() {
            self.hide();
        }
    }

    pub(crate) fn is_displayed(&self) -> bool {
        !self.layer.borrow().layer().is_hidden()
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.typing
            .borrow()
            .as_ref()
            .is_some_and(TimerHandle::is_active)
    }

    #[cfg(test)]
    pub(crate) fn shown_text(&self) -> String {
        self.state.borrow().shown_text()
    }

    fn stop_typing(&self) {
        let typing = self.typing.borrow_mut().take();
        if let Some(typing) = typing {
            self.scheduler.remove(&typing);
        }
    }
}
