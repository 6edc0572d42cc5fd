use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use aop_layout::engine::{NetworkSummary, SearchMatch, analyze, find_nodes};
use aop_layout::{HighlightSet, Layout, LayoutConfig, RawGraph, load_graph_file};

mod interaction;
mod panels;
mod render_utils;
mod view;

const SEARCH_LIMIT: usize = 12;

pub struct AopViewerApp {
    path: PathBuf,
    config: LayoutConfig,
    state: AppState,
    reload_rx: Option<LoadReceiver>,
}

type LoadReceiver = Receiver<Result<RawGraph, String>>;

enum AppState {
    Loading(LoadReceiver),
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: RawGraph,
    config: LayoutConfig,
    layout: Option<Layout>,
    layout_error: Option<String>,
    layout_dirty: bool,
    summary: Option<NetworkSummary>,
    selected: Option<String>,
    highlight: Option<HighlightSet>,
    search: String,
    search_hits: Vec<SearchMatch>,
    pan: Vec2,
    zoom: f32,
}

impl AopViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, path: PathBuf, config: LayoutConfig) -> Self {
        let state = Self::start_load(path.clone());
        Self {
            path,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf) -> LoadReceiver {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("graph-loader".to_owned())
            .spawn(move || {
                let loaded = load_graph_file(&path).map_err(|error| format!("{error:#}"));
                if sender.send(loaded).is_err() {
                    warn!("viewer closed before the graph finished loading");
                }
            });
        if let Err(error) = spawned {
            warn!(%error, "could not start graph loader thread");
        }
        receiver
    }

    fn start_load(path: PathBuf) -> AppState {
        AppState::Loading(Self::spawn_load(path))
    }

    fn apply(&mut self, loaded: Result<RawGraph, String>) {
        self.reload_rx = None;
        self.state = match loaded {
            Ok(graph) => {
                info!(
                    nodes = graph.nodes.len(),
                    edges = graph.edges.len(),
                    "graph loaded"
                );
                AppState::Ready(Box::new(ViewModel::new(graph, self.config.clone())))
            }
            Err(error) => {
                warn!(%error, "graph load failed");
                AppState::Error(error)
            }
        };
    }
}

/// Non-blocking check on a loader; `None` while it is still running.
fn poll(receiver: &LoadReceiver) -> Option<Result<RawGraph, String>> {
    match receiver.try_recv() {
        Ok(loaded) => Some(loaded),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(Err("graph loader stopped unexpectedly".to_owned())),
    }
}

pub(in crate::viewer) fn loading_screen(ui: &mut egui::Ui, heading: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(120.0);
        ui.heading(heading);
        ui.add_space(8.0);
        ui.spinner();
    });
}

impl eframe::App for AopViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let finished = match &mut self.state {
            AppState::Loading(receiver) => {
                let finished = poll(receiver);
                egui::CentralPanel::default().show(ctx, |ui| loading_screen(ui, "Loading AOP graph..."));
                finished
            }
            AppState::Error(error) => {
                let retry = egui::CentralPanel::default()
                    .show(ctx, |ui| {
                        ui.heading("Failed to load AOP graph");
                        ui.add_space(6.0);
                        ui.label(error.as_str());
                        ui.add_space(10.0);
                        ui.button("Retry").clicked()
                    })
                    .inner;
                if retry {
                    self.state = Self::start_load(self.path.clone());
                }
                None
            }
            AppState::Ready(model) => {
                let reload_requested = model.show(ctx, &self.path, self.reload_rx.is_some());
                self.config = model.config.clone();
                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.path.clone()));
                }
                self.reload_rx.as_ref().and_then(poll)
            }
        };

        match finished {
            Some(loaded) => self.apply(loaded),
            None if matches!(self.state, AppState::Loading(_)) || self.reload_rx.is_some() => {
                ctx.request_repaint();
            }
            None => {}
        }
    }
}

impl ViewModel {
    fn new(graph: RawGraph, config: LayoutConfig) -> Self {
        Self {
            graph,
            config,
            layout: None,
            layout_error: None,
            layout_dirty: true,
            summary: None,
            selected: None,
            highlight: None,
            search: String::new(),
            search_hits: Vec::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    /// Runs the whole pipeline again from the raw records. Nothing from the
    /// previous layout is reused.
    fn rebuild_layout(&mut self) {
        match Layout::compute_seeded(&self.graph.nodes, &self.graph.edges, &self.config) {
            Ok(layout) => {
                self.summary = Some(analyze(&layout.model, &layout.centrality));
                self.layout = Some(layout);
                self.layout_error = None;
            }
            Err(error) => {
                warn!(%error, "layout failed");
                self.summary = None;
                self.layout = None;
                self.layout_error = Some(error.to_string());
            }
        }

        self.layout_dirty = false;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.has_node(id))
        {
            self.selected = None;
        }
        self.refresh_search();
        self.refresh_highlight();
    }

    fn has_node(&self, id: &str) -> bool {
        self.layout
            .as_ref()
            .is_some_and(|layout| layout.model.index_of(id).is_some())
    }

    fn refresh_highlight(&mut self) {
        self.highlight = match (&self.layout, &self.selected) {
            (Some(layout), Some(id)) => Some(layout.highlight(id)).filter(|set| !set.is_empty()),
            _ => None,
        };
    }

    fn refresh_search(&mut self) {
        self.search_hits = match &self.layout {
            Some(layout) => find_nodes(&layout.model, &self.search, SEARCH_LIMIT),
            None => Vec::new(),
        };
    }

    fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        self.selected = selected;
        self.refresh_highlight();
    }
}
