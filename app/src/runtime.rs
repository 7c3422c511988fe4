//! Event loop tying stdin, the controller and the HTTP workers together.
//!
//! # Design
//! Input lines and request completions arrive on one channel and are handled
//! in order on the loop thread, which is the only owner of the controller.
//! Each request runs on its own short-lived worker thread.
//!
//! Lines typed while the controller is loading (the initial load or an add)
//! are held back and replayed once it is not, so scripted input does not race
//! those requests. End of input waits for every dispatched request to come
//! back before the controller is unmounted. An explicit `quit` stops at
//! once; completions arriving after that fail to send and are lost.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use task_core::{
    ApiError, HttpResponse, Pending, Refused, TaskClient, TaskId, TaskListController, Ticket,
};
use tracing::{debug, info};

use crate::command::{Command, HELP};
use crate::config::AppConfig;
use crate::render::render;
use crate::transport::Transport;

#[derive(Debug)]
pub enum Event {
    Input(String),
    InputClosed,
    Completed(Ticket, Result<HttpResponse, ApiError>),
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Render,
    Help,
    Quit,
}

pub struct App {
    controller: TaskListController,
    transport: Transport,
    events: Sender<Event>,
    in_flight: usize,
}

impl App {
    pub fn new(config: &AppConfig, events: Sender<Event>) -> Self {
        Self {
            controller: TaskListController::new(TaskClient::new(&config.base_url)),
            transport: Transport::new(config.timeout),
            events,
            in_flight: 0,
        }
    }

    pub fn controller(&self) -> &TaskListController {
        &self.controller
    }

    /// Requests dispatched whose completion has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn mount(&mut self) {
        let pending = self.controller.mount();
        self.dispatch(pending);
    }

    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    pub fn handle(&mut self, command: Command) -> Result<Reply, Refused> {
        match command {
            Command::Add(title) => {
                if let Some(title) = title {
                    self.controller.set_new_title(title);
                }
                let pending = self.controller.add()?;
                self.dispatch(pending);
            }
            Command::Type(text) => self.controller.set_new_title(text),
            Command::Toggle(row) => {
                let id = self.row_id(row)?;
                let pending = self.controller.toggle(&id)?;
                self.dispatch(pending);
            }
            Command::Delete(row) => {
                let id = self.row_id(row)?;
                let pending = self.controller.delete(&id)?;
                self.dispatch(pending);
            }
            Command::Edit(row) => {
                let id = self.row_id(row)?;
                self.controller.start_edit(&id)?;
            }
            Command::Draft(text) => self.controller.set_editing_title(text)?,
            Command::Save => {
                if let Some(pending) = self.controller.save_edit()? {
                    self.dispatch(pending);
                }
            }
            Command::Cancel => self.controller.cancel_edit(),
            Command::Filter(filter) => self.controller.set_filter(filter),
            Command::Refresh => self.mount(),
            Command::Help => return Ok(Reply::Help),
            Command::Quit => return Ok(Reply::Quit),
        }
        Ok(Reply::Render)
    }

    pub fn on_completed(&mut self, ticket: Ticket, outcome: Result<HttpResponse, ApiError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let completion = self.controller.complete(ticket, outcome);
        debug!(?completion, in_flight = self.in_flight, "request settled");
    }

    /// 1-based row number in the visible list.
    fn row_id(&self, row: usize) -> Result<TaskId, Refused> {
        row.checked_sub(1)
            .and_then(|index| self.controller.visible().get(index).map(|t| t.id.clone()))
            .ok_or(Refused::UnknownTask)
    }

    fn dispatch(&mut self, pending: Pending) {
        self.in_flight += 1;
        let Pending { request, ticket } = pending;
        let transport = self.transport.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let outcome = transport
                .execute(request)
                .map_err(|err| ticket.transport_error(err.to_string()));
            // The loop may already be gone.
            let _ = events.send(Event::Completed(ticket, outcome));
        });
    }
}

/// Forwards lines from `input` onto the event channel.
pub fn spawn_input<R>(input: R, events: Sender<Event>)
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if events.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

/// Runs until `quit`, or until input has ended and every request is back.
pub fn run<W: Write>(app: &mut App, events: Receiver<Event>, out: &mut W) -> io::Result<()> {
    app.mount();
    write!(out, "{}", render(app.controller()))?;
    out.flush()?;

    let mut held: VecDeque<String> = VecDeque::new();
    let mut input_closed = false;
    for event in events {
        let quit = match event {
            Event::Input(line) if app.controller().is_loading() => {
                held.push_back(line);
                false
            }
            Event::Input(line) => respond(app, &line, out)?,
            Event::InputClosed => {
                input_closed = true;
                false
            }
            Event::Completed(ticket, outcome) => {
                app.on_completed(ticket, outcome);
                write!(out, "{}", render(app.controller()))?;
                replay(app, &mut held, out)?
            }
        };
        out.flush()?;
        if quit || (input_closed && held.is_empty() && app.in_flight() == 0) {
            break;
        }
    }

    app.unmount();
    info!("task list closed");
    Ok(())
}

/// Feeds held lines back in until one of them starts loading again or quits.
fn replay<W: Write>(app: &mut App, held: &mut VecDeque<String>, out: &mut W) -> io::Result<bool> {
    while !app.controller().is_loading() {
        let Some(line) = held.pop_front() else { break };
        if respond(app, &line, out)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Handles one input line. Returns true on `quit`.
fn respond<W: Write>(app: &mut App, line: &str, out: &mut W) -> io::Result<bool> {
    if line.trim().is_empty() {
        return Ok(false);
    }
    match line.parse::<Command>() {
        Ok(command) => match app.handle(command) {
            Ok(Reply::Render) => write!(out, "{}", render(app.controller()))?,
            Ok(Reply::Help) => writeln!(out, "{HELP}")?,
            Ok(Reply::Quit) => return Ok(true),
            Err(refused) => writeln!(out, "cannot do that: {refused}")?,
        },
        Err(err) => writeln!(out, "{err}")?,
    }
    Ok(false)
}

/// Wires stdin and stdout to a fresh app.
pub fn run_stdio(config: &AppConfig) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(config, tx.clone());
    spawn_input(io::BufReader::new(io::stdin()), tx);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&mut app, rx, &mut out)
}
