//! Editing session: wires the editor to the solver channel and the UI.
//!
//! Data flows one way per event. Pointer input goes through the editor, and
//! what it produces is either sent to the solver or handed to the query-result
//! callback. Inbound solver frames are queued by the channel callback and
//! applied to the scene on the next [`Session::tick`].

use crate::editor::Editor;
use crate::measure::QueryResult;
use crate::protocol::SolverUpdate;
use crate::render::RenderAdapter;
use crate::sync::{ConnectionState, SyncChannel, SyncError, SyncResult, Transport};
use crate::tools::{ToolKind, ToolOutput};
use kurbo::Point;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

type QueryCallback = Box<dyn FnMut(QueryResult)>;

/// An editor connected to a solver.
pub struct Session<R: RenderAdapter, T: Transport> {
    editor: Editor<R>,
    channel: SyncChannel<T>,
    inbound: Rc<RefCell<VecDeque<serde_json::Value>>>,
    on_query_result: Option<QueryCallback>,
}

impl<R: RenderAdapter, T: Transport> Session<R, T> {
    /// Take ownership of both halves and register the inbound handler.
    pub fn new(editor: Editor<R>, mut channel: SyncChannel<T>) -> Self {
        let inbound = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&inbound);
        channel.on_inbound_update(move |value| queue.borrow_mut().push_back(value.clone()));
        Self {
            editor,
            channel,
            inbound,
            on_query_result: None,
        }
    }

    pub fn editor(&self) -> &Editor<R> {
        &self.editor
    }

    pub fn channel(&self) -> &SyncChannel<T> {
        &self.channel
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Receive angle/distance results of the measuring tools.
    pub fn on_query_result(&mut self, callback: impl FnMut(QueryResult) + 'static) {
        self.on_query_result = Some(Box::new(callback));
    }

    pub fn on_state_change(&mut self, callback: impl FnMut(ConnectionState) + 'static) {
        self.channel.on_state_change(callback);
    }

    pub fn connect(&mut self) {
        self.channel.connect();
    }

    pub fn connect_at(&mut self, now: Instant) {
        self.channel.connect_at(now);
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.editor.set_tool(kind);
    }

    pub fn set_input_value(&mut self, value: Option<f64>) {
        self.editor.set_input_value(value);
    }

    pub fn set_input_text(&mut self, raw: &str) {
        self.editor.set_input_text(raw);
    }

    pub fn pointer_down(&mut self, position: Point) {
        let output = self.editor.pointer_down(position);
        self.dispatch(output);
    }

    pub fn pointer_drag(&mut self, position: Point) {
        self.editor.pointer_drag(position);
    }

    pub fn pointer_up(&mut self, position: Point) {
        let output = self.editor.pointer_up(position);
        self.dispatch(output);
    }

    pub fn tick(&mut self) -> SyncResult<()> {
        self.tick_at(Instant::now())
    }

    /// Poll the channel and apply any solver updates it delivered.
    pub fn tick_at(&mut self, now: Instant) -> SyncResult<()> {
        let polled = self.channel.poll_at(now);
        // Frames queued before a malformed one are still applied.
        let applied = self.apply_inbound();
        match (polled, applied) {
            (Err(poll_err), Err(apply_err)) => {
                log::warn!("Solver update skipped: {apply_err}");
                Err(poll_err)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn apply_inbound(&mut self) -> SyncResult<()> {
        loop {
            let next = self.inbound.borrow_mut().pop_front();
            let Some(value) = next else {
                return Ok(());
            };
            let update: SolverUpdate =
                serde_json::from_value(value).map_err(SyncError::MalformedInbound)?;
            self.editor.apply_solver_update(&update);
        }
    }

    fn dispatch(&mut self, output: Option<ToolOutput>) {
        match output {
            Some(ToolOutput::Intent(intent)) => match self.channel.send(&intent) {
                Ok(()) => {}
                Err(SyncError::NotConnected) => {
                    log::debug!("Dropped {} while not connected", intent.operation());
                }
                Err(e) => log::warn!("Failed to send {}: {e}", intent.operation()),
            },
            Some(ToolOutput::Query(result)) => match self.on_query_result.as_mut() {
                Some(callback) => callback(result),
                None => log::info!("Query result: {result}"),
            },
            None => {}
        }
    }
}
