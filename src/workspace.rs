//! Workspace occupancy from i3/sway.
//!
//! `GET_TREE` gives the layout tree; a workspace is occupied when it
//! contains at least one leaf window. Window `new`/`close`/`move` events
//! raise a flag so the daemon re-queries without waiting for the next poll.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use swayipc_async::{Connection, Event, EventType, Node, NodeType, WindowChange};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SCRATCHPAD: &str = "__i3_scratch";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("i3/sway IPC error: {0}")]
    Ipc(#[from] swayipc_async::Error),

    #[error("Workspace source unavailable: {0}")]
    Unavailable(String),
}

/// Source of occupied workspace labels
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    async fn non_empty_workspaces(&self) -> Result<BTreeSet<String>, WorkspaceError>;
}

/// Fixed set, for previews and tests
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspaces(pub BTreeSet<String>);

#[async_trait]
impl WorkspaceSource for StaticWorkspaces {
    async fn non_empty_workspaces(&self) -> Result<BTreeSet<String>, WorkspaceError> {
        Ok(self.0.clone())
    }
}

// ── tree walking ─────────────────────────────────────────────────────

/// What a layout node is, as far as occupancy cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Workspace,
    /// `con` or `floating_con`; a window when it has no children
    Window,
    Other,
}

/// The slice of the layout tree needed for occupancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: Option<String>,
    pub kind: ContainerKind,
    /// Tiled and floating children together
    pub children: Vec<Container>,
}

impl Container {
    pub fn new(kind: ContainerKind, name: Option<&str>, children: Vec<Container>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind,
            children,
        }
    }
}

impl From<&Node> for Container {
    fn from(node: &Node) -> Self {
        let kind = match node.node_type {
            NodeType::Workspace => ContainerKind::Workspace,
            NodeType::Con | NodeType::FloatingCon => ContainerKind::Window,
            _ => ContainerKind::Other,
        };
        Self {
            name: node.name.clone(),
            kind,
            children: node
                .nodes
                .iter()
                .chain(&node.floating_nodes)
                .map(Container::from)
                .collect(),
        }
    }
}

/// Labels of workspaces that hold at least one window
pub fn non_empty_from_tree(tree: &Container) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_workspaces(tree, &mut out);
    out
}

fn collect_workspaces(node: &Container, out: &mut BTreeSet<String>) {
    if node.kind == ContainerKind::Workspace {
        let name = node.name.as_deref().unwrap_or_default();
        if name != SCRATCHPAD && has_leaf(node) {
            out.insert(name.to_string());
        }
        return;
    }
    for child in &node.children {
        collect_workspaces(child, out);
    }
}

fn has_leaf(node: &Container) -> bool {
    node.children.iter().any(|child| {
        (child.kind == ContainerKind::Window && child.children.is_empty()) || has_leaf(child)
    })
}

/// Window changes that can move a workspace between empty and occupied
pub fn changes_occupancy(change: &WindowChange) -> bool {
    matches!(
        change,
        WindowChange::New | WindowChange::Close | WindowChange::Move
    )
}

// ── client ───────────────────────────────────────────────────────────

/// i3/sway IPC client over one long-lived command connection
pub struct I3Client {
    conn: Mutex<Connection>,
}

impl I3Client {
    /// Connect via `I3SOCK`, `SWAYSOCK`, or the window manager's
    /// `--get-socketpath`.
    pub async fn connect() -> Result<Self, WorkspaceError> {
        let conn = Connection::new().await?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub async fn get_tree(&self) -> Result<Container, WorkspaceError> {
        let tree = self.conn.lock().await.get_tree().await?;
        Ok(Container::from(&tree))
    }
}

#[async_trait]
impl WorkspaceSource for I3Client {
    async fn non_empty_workspaces(&self) -> Result<BTreeSet<String>, WorkspaceError> {
        Ok(non_empty_from_tree(&self.get_tree().await?))
    }
}

/// Listen for window events in the background and raise `flag` on
/// occupancy changes. The task ends when the connection drops.
pub fn spawn_window_listener(flag: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = listen(&flag).await {
            warn!("i3 event listener stopped: {e}");
        }
    })
}

async fn listen(flag: &AtomicBool) -> Result<(), WorkspaceError> {
    let mut events = Box::pin(
        Connection::new()
            .await?
            .subscribe([EventType::Window])
            .await?,
    );
    debug!("Subscribed to window events");

    while let Some(event) = events.next().await {
        if let Event::Window(window) = event? {
            if changes_occupancy(&window.change) {
                debug!("Window event: {:?}", window.change);
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
    Err(WorkspaceError::Unavailable("event stream closed".into()))
}
