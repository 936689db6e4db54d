use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use crate::graph::{BuildError, TxGraph};
use crate::util::canonical_address;
use crate::wallet::{DetailLevel, JsonDirSource, TransactionRecord, TransactionSource};

mod graph;
mod physics;
mod render_utils;
mod ui;

use physics::Simulation;

type FetchOutcome = Result<Vec<TransactionRecord>, String>;

/// One in-flight background fetch: the address it is for and the explored
/// set to install alongside its result.
struct FetchTicket {
    address: String,
    explored: HashSet<String>,
    rx: Receiver<FetchOutcome>,
}

pub struct TxScopeApp {
    source: Arc<dyn TransactionSource>,
    detail: DetailLevel,
    state: AppState,
    expand: Option<FetchTicket>,
}

enum AppState {
    Loading(FetchTicket),
    Ready(Box<ViewModel>),
    Error { address: String, message: String },
}

struct ViewModel {
    focus_address: String,
    transactions: Vec<TransactionRecord>,
    detail: DetailLevel,
    explored: HashSet<String>,
    search: String,
    inspect_input: String,
    pan: Vec2,
    zoom: f32,
    view_anim: Option<ViewAnimation>,
    pending_view_reset: bool,
    live_physics: bool,
    graph_dirty: bool,
    revision: u64,
    graph_cache: Option<RenderGraph>,
    build_error: Option<BuildError>,
    drag: Option<usize>,
    pending_expand: Option<String>,
    pending_inspect: Option<String>,
    search_match_cache: Option<SearchMatchCache>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

/// The active graph scene: the built neighborhood, its layout simulation,
/// amount bounds for edge weighting, and per-frame screen-space scratch.
struct RenderGraph {
    graph: TxGraph,
    sim: Simulation,
    min_amount: f64,
    max_amount: f64,
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
}

#[derive(Clone, Copy)]
struct ViewAnimation {
    from_pan: Vec2,
    from_zoom: f32,
    to_pan: Vec2,
    to_zoom: f32,
    progress: f32,
}

struct SearchMatchCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl TxScopeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: JsonDirSource,
        address: String,
        detail: DetailLevel,
    ) -> Self {
        let source: Arc<dyn TransactionSource> = Arc::new(source);
        let explored = HashSet::from([canonical_address(&address)]);
        let state = AppState::Loading(Self::spawn_fetch(&source, address, explored));
        Self {
            source,
            detail,
            state,
            expand: None,
        }
    }

    fn spawn_fetch(
        source: &Arc<dyn TransactionSource>,
        address: String,
        explored: HashSet<String>,
    ) -> FetchTicket {
        let (tx, rx) = mpsc::channel();
        let worker_source = Arc::clone(source);
        let worker_address = address.clone();

        thread::spawn(move || {
            let result = worker_source
                .fetch(&worker_address)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        FetchTicket {
            address,
            explored,
            rx,
        }
    }
}

impl eframe::App for TxScopeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading(ticket) => {
                if let Ok(result) = ticket.rx.try_recv() {
                    transition = Some(match result {
                        Ok(records) => AppState::Ready(Box::new(ViewModel::new(
                            ticket.address.clone(),
                            records,
                            self.detail,
                            std::mem::take(&mut ticket.explored),
                        ))),
                        Err(message) => AppState::Error {
                            address: ticket.address.clone(),
                            message,
                        },
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading transaction neighborhood...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error { address, message } => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load transaction neighborhood");
                    ui.add_space(6.0);
                    ui.label(format!("address: {address}"));
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });

                if retry {
                    let address = address.clone();
                    let explored = HashSet::from([canonical_address(&address)]);
                    transition = Some(AppState::Loading(Self::spawn_fetch(
                        &self.source,
                        address,
                        explored,
                    )));
                }
            }
            AppState::Ready(model) => {
                self.detail = model.detail;
                let is_fetching = self.expand.is_some();
                model.show(ctx, is_fetching);

                if let Some(address) = model.pending_inspect.take() {
                    // A manual inspect starts a fresh session: the explored
                    // set resets and any in-flight expand is discarded.
                    self.expand = None;
                    let explored = HashSet::from([canonical_address(&address)]);
                    transition = Some(AppState::Loading(Self::spawn_fetch(
                        &self.source,
                        address,
                        explored,
                    )));
                } else if let Some(address) = model.pending_expand.take()
                    && self.expand.is_none()
                {
                    let mut explored = model.explored.clone();
                    explored.insert(canonical_address(&address));
                    self.expand = Some(Self::spawn_fetch(&self.source, address, explored));
                }

                if transition.is_none()
                    && let Some(ticket) = self.expand.take()
                {
                    match ticket.rx.try_recv() {
                        Ok(Ok(records)) => {
                            transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                ticket.address,
                                records,
                                model.detail,
                                ticket.explored,
                            ))));
                        }
                        Ok(Err(message)) => {
                            transition = Some(AppState::Error {
                                address: ticket.address,
                                message,
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.expand = Some(ticket);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error {
                                address: ticket.address,
                                message: "Background fetch worker disconnected".to_owned(),
                            });
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.expand = None;
            self.state = next_state;
        }
    }
}
